//! Cache transport and verb/path routing.
//!
//! Maps HTTP-style verbs onto the three cache primitives where the mapping
//! is clean, and falls back to the REST transport where it is not. The
//! routing rules live in one declarative table so new path patterns are
//! additive and testable in isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::request::{join_path_query, RequestDescriptor, Verb};
use crate::rest::RestTransport;
use crate::types::Response;

/// Key/value backend consumed by the cache transport.
///
/// The default implementation speaks the memcached text protocol (see
/// [`crate::memcached::MemcachedBackend`]); any other get/set/delete store
/// can be substituted through [`crate::Client::with_cache_backend`].
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Fetch the value stored under `key`; `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`. A TTL of 0 means no expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u32) -> Result<()>;

    /// Delete `key`, reporting whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Cache primitive selected for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Primitive {
    Get,
    Set,
    Delete,
}

/// Transport decision for one verb/path combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Cache(Primitive),
    /// The cache protocol cannot express this operation; the whole call is
    /// delegated to the REST transport.
    Rest,
}

/// POST routing, first matching pattern wins. Multi-get responses cannot be
/// represented as a single cache value, bulk query-deletes map onto the
/// delete primitive, and search-shaped calls are reads.
const POST_ROUTES: &[(&str, Route)] = &[
    ("_mget", Route::Rest),
    ("_query", Route::Cache(Primitive::Delete)),
    ("_search", Route::Cache(Primitive::Get)),
    ("_msearch", Route::Cache(Primitive::Get)),
    ("_explain", Route::Cache(Primitive::Get)),
];

/// Select the transport and primitive for `verb` against `pathname`.
pub(crate) fn route(verb: Verb, pathname: &str) -> Route {
    match verb {
        Verb::Get => Route::Cache(Primitive::Get),
        Verb::Delete => Route::Cache(Primitive::Delete),
        Verb::Put => Route::Cache(Primitive::Set),
        Verb::Head => Route::Rest,
        Verb::Post => POST_ROUTES
            .iter()
            .find(|(pattern, _)| pathname.contains(*pattern))
            .map(|(_, route)| *route)
            .unwrap_or(Route::Cache(Primitive::Set)),
    }
}

/// Derive the cache key for `desc`.
///
/// For non-`set` primitives any request data rides along as a `source`
/// query parameter, mirroring how the REST transport passes body data on
/// GET and DELETE. Path and encoded query join into one string.
pub(crate) fn cache_key(primitive: Primitive, desc: &RequestDescriptor) -> String {
    let mut query = desc.query.clone();
    if primitive != Primitive::Set {
        if let Some(body) = desc.body.as_ref().filter(|body| !body.is_empty()) {
            query.push(("source".to_string(), body.clone()));
        }
    }
    join_path_query(&desc.pathname, &query)
}

/// Executes get/set/delete exchanges against the cache backend, falling
/// back to REST for operations the cache protocol cannot express.
#[derive(Debug, Clone)]
pub(crate) struct CacheTransport {
    backend: Arc<dyn CacheBackend>,
    rest: Arc<RestTransport>,
    pub(crate) default_timeout_ms: u64,
}

impl CacheTransport {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        rest: Arc<RestTransport>,
        default_timeout_ms: u64,
    ) -> Self {
        CacheTransport {
            backend,
            rest,
            default_timeout_ms,
        }
    }

    pub async fn execute(&self, desc: &RequestDescriptor) -> Result<Response> {
        match route(desc.verb, &desc.pathname) {
            // Delegated calls resolve their timeout against the REST
            // transport's own default, not the cache default.
            Route::Rest => {
                tracing::debug!(path = %desc.pathname, "cache cannot serve call, delegating to REST");
                self.rest.execute(desc).await
            }
            Route::Cache(primitive) => {
                let timeout_ms = desc.timeout_ms.unwrap_or(self.default_timeout_ms);
                tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    self.exchange(primitive, desc),
                )
                .await
                .map_err(|_| ClientError::Timeout(timeout_ms))?
            }
        }
    }

    async fn exchange(&self, primitive: Primitive, desc: &RequestDescriptor) -> Result<Response> {
        let key = cache_key(primitive, desc);
        tracing::debug!(primitive = ?primitive, key = %key, "cache exchange");
        // Connection errors from the backend surface directly; the cache
        // cluster has no failover rotation.
        match primitive {
            Primitive::Get => match self.backend.get(&key).await? {
                Some(payload) => parse_get_payload(&payload),
                None => Err(ClientError::NotFound),
            },
            Primitive::Set => {
                let data = desc.body.clone().unwrap_or_default();
                self.backend.set(&key, data.into_bytes(), 0).await?;
                Ok(ack())
            }
            Primitive::Delete => {
                if self.backend.delete(&key).await? {
                    Ok(ack())
                } else {
                    Err(ClientError::NotFound)
                }
            }
        }
    }
}

/// Parse a backend payload and bridge the document store's explicit
/// `"exists": false` marker to the same 404 shape the REST transport
/// produces.
fn parse_get_payload(payload: &[u8]) -> Result<Response> {
    let body: Value = serde_json::from_slice(payload)
        .map_err(|err| ClientError::MalformedResponse(err.to_string()))?;
    if let Some(false) = body.get("exists").and_then(Value::as_bool) {
        return Err(ClientError::NotFound);
    }
    Ok(Response { status: 200, body })
}

/// Acknowledgement payload for set/delete, matching the parsed backend ack.
fn ack() -> Response {
    Response {
        status: 200,
        body: Value::Bool(true),
    }
}
