//! Error types for the Mapbox API client.
//!
//! # Design
//! One tagged enum covers the stages a call can fail at (build, execute,
//! classify) so callers never downcast. [`ClientError::Api`] is the only
//! variant the resource layer is expected to branch on: it carries the
//! status code, the endpoint that failed, and whatever the server said.

use serde::Deserialize;
use thiserror::Error;
use ureq::http::Method;

use crate::http::TransportError;

/// Errors returned by [`MapboxClient`](crate::MapboxClient) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The absolute URL could not be parsed.
    #[error("create request: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP request value could not be assembled.
    #[error("create request: {0}")]
    BuildRequest(#[from] ureq::http::Error),

    /// The transport failed to complete the round trip (DNS failure,
    /// connection refused, TLS, ...).
    #[error("execute request: {0}")]
    Transport(#[source] TransportError),

    /// The transport returned neither a response nor an error.
    #[error("no response returned from API for {method} {url}")]
    NoResponse { method: Method, url: String },

    /// The body of an error response could not be read.
    #[error("read error response: {0}")]
    ReadErrorBody(#[source] std::io::Error),

    /// The server answered with a status outside [200, 399].
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Structured failure produced when a response falls outside the success
/// range.
///
/// `message` and `error_type` are decoded best-effort from the response
/// body; `status_code` and `endpoint` are attached from the transaction
/// context. Only constructed for statuses outside [200, 399].
#[derive(Debug, Clone, Error)]
#[error("API Error: {status_code} {endpoint} {message}")]
pub struct ApiError {
    pub status_code: u16,
    pub endpoint: String,
    pub message: String,
    pub error_type: Option<String>,
}

/// Wire shape of the error envelope. Both fields are optional; not every
/// endpoint answers with this shape, or with JSON at all.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorDetail,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl ApiError {
    /// Classify an error response from its drained body. A body that decodes
    /// as the envelope contributes `error.message` and `type`; anything else
    /// is kept verbatim as the message.
    pub fn from_response(status_code: u16, endpoint: &str, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                status_code,
                endpoint: endpoint.to_string(),
                message: envelope.error.message.unwrap_or_default(),
                error_type: envelope.error_type,
            },
            Err(_) => Self {
                status_code,
                endpoint: endpoint.to_string(),
                message: String::from_utf8_lossy(body).into_owned(),
                error_type: None,
            },
        }
    }
}
