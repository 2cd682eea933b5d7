//! Request-scoped error taxonomy.
//!
//! Every variant is terminal for the request that produced it and is rendered
//! as the JSON error envelope `{"error": ..., "status": ...}` with the HTTP
//! status set to the same code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to gateway callers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required query parameter was absent or empty.
    #[error("{0} not specified")]
    MissingParameter(&'static str),

    /// The `request` parameter was not a JSON request description.
    #[error("error parsing json")]
    Decode(#[source] serde_json::Error),

    /// The request description named an illegal method, URL or header.
    #[error("{0}")]
    InvalidMethodOrUrl(String),

    /// A request description could not be re-encoded.
    #[error("error encoding json")]
    Encode(#[source] serde_json::Error),

    /// The upstream call failed (DNS, refused, proxy unreachable, timeout).
    #[error("{}", error_chain(.0))]
    Execution(#[source] reqwest::Error),

    /// The upstream body could not be read to the end.
    #[error("{}", error_chain(.0))]
    Read(#[source] reqwest::Error),

    /// Handling the inbound request outlived `server.request_timeout_secs`.
    #[error("request timed out")]
    Timeout,

    /// The caller is not on the allow-list.
    #[error("unauthorized")]
    Unauthorized,
}

impl GatewayError {
    /// HTTP status used for both the response and the envelope.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingParameter(_)
            | GatewayError::Decode(_)
            | GatewayError::InvalidMethodOrUrl(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Encode(_)
            | GatewayError::Execution(_)
            | GatewayError::Read(_)
            | GatewayError::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorEnvelope {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Renders an error followed by its sources, `outer: inner: root`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
