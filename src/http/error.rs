//! Proxy failures and the fixed bodies the relay itself produces.
//!
//! Apart from these, every status and body a client sees was produced by the
//! backend.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::routing::TargetError;

pub const PROXY_FAILURE_MESSAGE: &str = "Failed to proxy request to backend";

/// Everything that can stop a request from being relayed.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connect, DNS, timeout, or a broken backend body before the response
    /// was handed to the client.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("invalid target path: {0}")]
    Target(#[from] TargetError),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(axum::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Target(_) | ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ProxyError::Upstream(_) => PROXY_FAILURE_MESSAGE,
            ProxyError::Target(_) => "Invalid path",
            ProxyError::BodyTooLarge { .. } => "Request body too large",
            ProxyError::BodyRead(_) => "Failed to read request body",
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `502 {"error":"Failed to proxy request to backend"}`
pub fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": PROXY_FAILURE_MESSAGE })),
    )
        .into_response()
}

/// `401 {"error":"Unauthorized","detail":"Invalid or expired token"}`
///
/// Replaces whatever body the backend attached to its 401.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized", "detail": "Invalid or expired token" })),
    )
        .into_response()
}
