//! HTTP(S) REST transport.
//!
//! Executes one request/response cycle against the currently-active host
//! and owns the bounded failover loop: on a connection-level error the
//! cursor rotates to the next configured host and the same descriptor is
//! re-sent, for at most one full rotation per originating call. The
//! original implementation retried through self-recursion; this loop is
//! the iterative replacement.

use std::time::Duration;

use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::failover::FailoverCursor;
use crate::request::{RequestDescriptor, Verb, DEFAULT_TIMEOUT_MS};
use crate::settings::{ensure_port, RestSettings};
use crate::types::Response;

#[derive(Debug)]
pub(crate) struct RestTransport {
    http: reqwest::Client,
    cursor: FailoverCursor,
    secure: bool,
    default_port: u16,
    pub(crate) default_timeout_ms: u64,
}

impl RestTransport {
    pub fn new(settings: &RestSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(RestTransport {
            http,
            cursor: FailoverCursor::new(settings.authorities()),
            secure: settings.secure,
            default_port: settings.port,
            default_timeout_ms: settings.timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
        })
    }

    fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Execute `desc`, rotating hosts on connection errors.
    ///
    /// A call that pinned a host never rotates, and a timeout is surfaced
    /// without retry. Any successful exchange clears the cursor's failure
    /// count.
    pub async fn execute(&self, desc: &RequestDescriptor) -> Result<Response> {
        // Local bound so one originating call never exceeds a full
        // rotation even when concurrent calls are failing too.
        let mut rotations = 0usize;
        loop {
            let authority = match &desc.pinned_host {
                Some(pin) => ensure_port(pin, self.default_port),
                None => self.cursor.current(),
            };
            match self.send_once(desc, &authority).await {
                Ok(response) => {
                    self.cursor.reset();
                    return Ok(response);
                }
                Err(err @ ClientError::Connection(_))
                    if desc.pinned_host.is_none() && self.cursor.len() > 1 =>
                {
                    let rotation = self.cursor.advance();
                    rotations += 1;
                    tracing::warn!(
                        failed = %authority,
                        next = %rotation.host,
                        "connection error, rotating to next host"
                    );
                    if rotation.exhausted || rotations >= self.cursor.len() {
                        self.cursor.reset();
                        return Err(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, desc: &RequestDescriptor, authority: &str) -> Result<Response> {
        let url = format!("{}://{}{}", self.scheme(), authority, desc.request_path());
        let body = desc.body.clone().unwrap_or_default();
        let timeout_ms = desc.timeout_ms.unwrap_or(self.default_timeout_ms);

        let mut request = self
            .http
            .request(reqwest::Method::from(desc.verb), &url)
            .timeout(Duration::from_millis(timeout_ms))
            .header(reqwest::header::CONTENT_LENGTH, body.len());
        for (name, value) in &desc.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        tracing::debug!(url = %url, verb = ?desc.verb, "sending REST request");
        let response = request
            .send()
            .await
            .map_err(|err| classify_exchange_error(err, timeout_ms))?;

        let status = response.status().as_u16();
        // The request timeout spans body completion, so a server that
        // stalls after its headers surfaces the timeout here.
        let text = response
            .text()
            .await
            .map_err(|err| classify_exchange_error(err, timeout_ms))?;

        if status >= 400 {
            return Err(ClientError::HttpStatus { status, body: text });
        }

        // HEAD carries no body; synthesize a minimal payload so callers
        // still receive a JSON document.
        if desc.verb == Verb::Head && text.is_empty() {
            return Ok(Response {
                status,
                body: serde_json::json!({ "statusCode": status }),
            });
        }

        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|err| ClientError::MalformedResponse(err.to_string()))?
        };
        Ok(Response { status, body })
    }
}

/// Classify a reqwest failure from any stage of the exchange. Timeouts map
/// to [`ClientError::Timeout`] wherever they fire (connect, headers, or
/// body read) and are never failover-eligible; everything else (resolution
/// failures, refused and reset connections) is a connection error, the
/// only kind the failover loop acts on.
fn classify_exchange_error(err: reqwest::Error, timeout_ms: u64) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(timeout_ms)
    } else {
        ClientError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_timeout_becomes_the_transport_default() {
        let transport = RestTransport::new(&RestSettings {
            timeout: Some(5_000),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(transport.default_timeout_ms, 5_000);
    }

    #[test]
    fn default_timeout_applies_when_unset() {
        let transport = RestTransport::new(&RestSettings::default()).unwrap();
        assert_eq!(transport.default_timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
