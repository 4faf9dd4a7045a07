//! Backend response handling.
//!
//! # Responsibilities
//! - Normalize backend 401s to the fixed unauthorized body
//! - Detect event streams and hand them to the streaming relay
//! - Buffer everything else and relay status, headers and body unmodified
//!
//! # Design Decisions
//! - 401 is checked before the content type, so an SSE 401 is still normalized
//! - Buffered bodies are relayed as bytes, so non-UTF-8 payloads survive

use axum::body::Body;
use axum::http::header::{HeaderMap, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;

use crate::http::error::{unauthorized, ProxyError};
use crate::http::stream;
use crate::security::headers::relay_response_headers;

/// Which path a backend response took through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    Buffered,
    Stream,
    Unauthorized,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Buffered => "buffered",
            RelayMode::Stream => "stream",
            RelayMode::Unauthorized => "unauthorized",
        }
    }
}

/// Whether the backend answered with Server-Sent Events.
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/event-stream"))
}

/// Turn a backend response into the client response.
pub async fn relay(
    upstream: reqwest::Response,
    request_id: &str,
) -> Result<(Response, RelayMode), ProxyError> {
    if upstream.status() == StatusCode::UNAUTHORIZED {
        tracing::debug!(request_id = %request_id, "Backend rejected credentials");
        return Ok((unauthorized(), RelayMode::Unauthorized));
    }

    if is_event_stream(upstream.headers()) {
        return Ok((stream::relay(upstream, request_id), RelayMode::Stream));
    }

    Ok((buffered(upstream).await?, RelayMode::Buffered))
}

/// Read the whole backend body and return it with the backend's status and
/// filtered headers.
pub async fn buffered(upstream: reqwest::Response) -> Result<Response, ProxyError> {
    let status = upstream.status();
    let headers = relay_response_headers(upstream.headers());
    let body = upstream.bytes().await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn detects_event_stream() {
        let mut h = HeaderMap::new();
        assert!(!is_event_stream(&h));

        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_event_stream(&h));

        h.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream; charset=utf-8"));
        assert!(is_event_stream(&h));
    }

    #[test]
    fn mode_labels() {
        assert_eq!(RelayMode::Buffered.as_str(), "buffered");
        assert_eq!(RelayMode::Stream.as_str(), "stream");
        assert_eq!(RelayMode::Unauthorized.as_str(), "unauthorized");
    }
}
