//! Request descriptors and option merging.
//!
//! Per-call options are merged with client-wide settings into one effective
//! [`RequestDescriptor`] before a transport sees the call. The merge is
//! shallow: a field supplied in [`CallOptions`] replaces the corresponding
//! base value wholesale. This includes collection-valued fields: a
//! supplied `headers` or `query` collection is applied as a whole, never
//! unioned with anything, which can widen scope compared to overriding a
//! single flat field. That caveat is deliberate and preserved from the
//! original behavior.

use serde_json::Value;
use url::form_urlencoded;

/// HTTP-style verb for a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl From<Verb> for reqwest::Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
            Verb::Head => reqwest::Method::HEAD,
        }
    }
}

/// Default request timeout applied when neither the settings nor the call
/// supply one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Per-call overrides, merged over the client-wide settings.
///
/// This replaces the original's dual-purpose `data`-or-`callback` argument
/// with explicit optional fields: an absent `body` plays the "no data"
/// role.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Query parameters appended to the resource path.
    pub query: Vec<(String, String)>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Pin this call to one host. A pinned call never participates in
    /// failover rotation, whatever the error.
    pub host: Option<String>,
    /// Override the request timeout for this call, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Request data. String values are sent as-is; anything else is
    /// serialized to JSON text.
    pub body: Option<Value>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying request data.
    pub fn with_body(body: Value) -> Self {
        CallOptions {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Append one query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append one request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Pin this call to `host` (optionally `host:port`).
    #[must_use]
    pub fn pin_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Override the timeout for this call.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Effective description of one request, built fresh per call and never
/// mutated after being handed to a transport.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub(crate) verb: Verb,
    pub(crate) pathname: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    /// Serialized request data, when any was supplied.
    pub(crate) body: Option<String>,
    /// Explicit per-call timeout. When absent, the serving transport
    /// applies its own configured default.
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) pinned_host: Option<String>,
}

impl RequestDescriptor {
    /// Path plus encoded query string, as sent on the wire.
    pub(crate) fn request_path(&self) -> String {
        join_path_query(&self.pathname, &self.query)
    }
}

/// Merge per-call options over the client-wide defaults into one effective
/// descriptor. Fields present in `options` win; a timeout left unset here
/// falls to the serving transport's configured default.
pub(crate) fn merge(verb: Verb, resource_path: &str, options: CallOptions) -> RequestDescriptor {
    let body = options.body.map(|value| match value {
        // Already textual; sent as-is rather than re-encoded.
        Value::String(text) => text,
        other => other.to_string(),
    });
    RequestDescriptor {
        verb,
        pathname: resource_path.to_string(),
        query: options.query,
        headers: options.headers,
        body,
        timeout_ms: options.timeout_ms,
        pinned_host: options.host,
    }
}

/// Join non-empty path segments into a resource path with a leading `/`.
/// Empty segments contribute nothing.
///
/// ```
/// use quarry_client::join_path;
///
/// assert_eq!(join_path(["idx", "doc", "1"]), "/idx/doc/1");
/// assert_eq!(join_path(["idx", "", "_search"]), "/idx/_search");
/// ```
pub fn join_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut path = String::new();
    for segment in segments {
        if !segment.is_empty() {
            path.push('/');
            path.push_str(segment);
        }
    }
    path
}

/// URL-encode `pairs` into a query string, without the leading `?`.
///
/// Pure function over caller-owned data: the input is read, never drained.
/// An empty input yields an empty string.
pub fn format_query(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Join a pathname and query pairs into one request path, appending the
/// encoded query only when it is non-empty.
pub(crate) fn join_path_query(pathname: &str, query: &[(String, String)]) -> String {
    let encoded = format_query(query);
    if encoded.is_empty() {
        pathname.to_string()
    } else if pathname.contains('?') {
        format!("{pathname}&{encoded}")
    } else {
        format!("{pathname}?{encoded}")
    }
}
