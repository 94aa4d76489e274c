//! Shared response types.

use serde_json::Value;

/// Normalized result of a dispatched request.
///
/// Both transports produce this same shape, so calling code never branches
/// on which transport served the exchange. For HEAD requests the body is a
/// synthesized `{"statusCode": <status>}` document, since the protocol
/// returns no body for HEAD.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code (cache acknowledgements report 200).
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
}
