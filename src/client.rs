//! Core client and transport routing.

use std::sync::Arc;

use crate::cache::{CacheBackend, CacheTransport};
use crate::error::Result;
use crate::memcached::MemcachedBackend;
use crate::request::{merge, CallOptions, Verb, DEFAULT_TIMEOUT_MS};
use crate::rest::RestTransport;
use crate::settings::Settings;
use crate::types::Response;

/// A client for the Quarry document store.
///
/// Cheap to clone; all clones share one failover cursor and one HTTP
/// connection pool, so concurrent dispatches observe a consistent view of
/// the currently-active host.
///
/// # Example
///
/// ```no_run
/// use quarry_client::{CallOptions, Client, Settings};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(Settings::default())?;
///
/// let doc = client.get("/idx/person/brian", CallOptions::new()).await?;
/// println!("source: {}", doc.body["_source"]);
///
/// let hits = client
///     .post(
///         "/idx/person/_search",
///         CallOptions::with_body(json!({"query": {"match_all": {}}})),
///     )
///     .await?;
/// println!("hits: {}", hits.body["hits"]["total"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    rest: Arc<RestTransport>,
    cache: Option<CacheTransport>,
}

impl Client {
    /// Create a client from `settings`.
    ///
    /// When the `memcached` sub-document is present the cache transport
    /// serves every operation its routing table can express, with the REST
    /// transport as fallback; otherwise everything goes over REST.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Config`] for contradictory host
    /// configuration (empty lists, both singular and plural fields, or
    /// both `hosts` and `hostnames`).
    pub fn new(settings: Settings) -> Result<Self> {
        let backend = settings
            .memcached
            .as_ref()
            .map(|cache| Arc::new(MemcachedBackend::new(cache)) as Arc<dyn CacheBackend>);
        Self::build(settings, backend)
    }

    /// Create a client whose cache transport uses `backend` instead of the
    /// default memcached implementation.
    pub fn with_cache_backend(settings: Settings, backend: Arc<dyn CacheBackend>) -> Result<Self> {
        Self::build(settings, Some(backend))
    }

    fn build(settings: Settings, backend: Option<Arc<dyn CacheBackend>>) -> Result<Self> {
        settings.validate()?;
        let rest = Arc::new(RestTransport::new(&settings.rest)?);
        // Each transport resolves unset per-call timeouts against its own
        // settings; calls the cache delegates to REST get the REST default.
        let cache_timeout_ms = settings
            .memcached
            .as_ref()
            .and_then(|cache| cache.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let cache =
            backend.map(|backend| CacheTransport::new(backend, Arc::clone(&rest), cache_timeout_ms));
        Ok(Client { rest, cache })
    }

    /// Dispatch one operation: merge `options` over the client settings,
    /// select a transport from the verb and resource path, execute the
    /// exchange, and return the normalized result.
    pub async fn dispatch(
        &self,
        verb: Verb,
        resource_path: &str,
        options: CallOptions,
    ) -> Result<Response> {
        let desc = merge(verb, resource_path, options);
        tracing::debug!(verb = ?verb, path = %desc.request_path(), "dispatching");
        match &self.cache {
            Some(cache) => cache.execute(&desc).await,
            None => self.rest.execute(&desc).await,
        }
    }

    /// Issue a GET. Request data, when supplied through
    /// [`CallOptions::with_body`], is passed the way the document store
    /// expects it (body over REST, `source` query parameter on the cache
    /// key).
    pub async fn get(&self, resource_path: &str, options: CallOptions) -> Result<Response> {
        self.dispatch(Verb::Get, resource_path, options).await
    }

    /// Issue a POST.
    pub async fn post(&self, resource_path: &str, options: CallOptions) -> Result<Response> {
        self.dispatch(Verb::Post, resource_path, options).await
    }

    /// Issue a PUT.
    pub async fn put(&self, resource_path: &str, options: CallOptions) -> Result<Response> {
        self.dispatch(Verb::Put, resource_path, options).await
    }

    /// Issue a DELETE. The document store accepts data on DELETE for bulk
    /// query-deletes.
    pub async fn delete(&self, resource_path: &str, options: CallOptions) -> Result<Response> {
        self.dispatch(Verb::Delete, resource_path, options).await
    }

    /// Issue a HEAD. Always served by the REST transport; the result body
    /// is a synthesized `{"statusCode": <status>}` document.
    pub async fn head(&self, resource_path: &str, options: CallOptions) -> Result<Response> {
        self.dispatch(Verb::Head, resource_path, options).await
    }
}
