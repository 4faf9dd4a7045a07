//! Inbound request handling.
//!
//! # Responsibilities
//! - Give every request an `x-request-id` for log correlation
//! - Read the inbound body under the configured size limit
//! - Decide whether the body travels as text or as opaque bytes
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, never forwarded
//! - Declared `content-length` over the limit is refused before reading
//! - Text bodies are decoded lossily; binary bodies are never touched

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, Request};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use uuid::Uuid;

use crate::http::error::ProxyError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Layer that sets `x-request-id` unless the caller already supplied one.
pub type RequestIdLayer = SetRequestIdLayer<MakeRequestUuid>;

pub fn request_id_layer() -> RequestIdLayer {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Access to the request ID assigned by [`RequestIdLayer`].
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> &str {
        self.get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers().request_id()
    }
}

/// How an inbound body is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardBody {
    /// GET and HEAD carry no body.
    None,
    /// JSON and `text/*` payloads, as UTF-8.
    Text(String),
    /// Everything else, untouched.
    Binary(Bytes),
}

impl ForwardBody {
    /// Whether a body with this content type is forwarded as text.
    pub fn is_textual(content_type: Option<&str>) -> bool {
        content_type
            .map(|ct| ct.contains("application/json") || ct.contains("text/"))
            .unwrap_or(false)
    }

    /// Read `body` according to the request's method and content type.
    pub async fn read(
        method: &Method,
        headers: &HeaderMap,
        body: Body,
        limit: usize,
    ) -> Result<Self, ProxyError> {
        if method == Method::GET || method == Method::HEAD {
            return Ok(ForwardBody::None);
        }

        let declared = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(ProxyError::BodyTooLarge { limit });
        }

        let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                ProxyError::BodyTooLarge { limit }
            } else {
                ProxyError::BodyRead(axum::Error::new(inner))
            }
        })?;

        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        Ok(Self::classify(content_type, bytes))
    }

    /// Wrap already-read bytes.
    pub fn classify(content_type: Option<&str>, bytes: Bytes) -> Self {
        if Self::is_textual(content_type) {
            ForwardBody::Text(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            ForwardBody::Binary(bytes)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ForwardBody::None => 0,
            ForwardBody::Text(s) => s.len(),
            ForwardBody::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ForwardBody::None => "none",
            ForwardBody::Text(_) => "text",
            ForwardBody::Binary(_) => "binary",
        }
    }

    /// Body for the outbound request. An empty POST still sends an empty
    /// body (and a zero `content-length`).
    pub fn into_reqwest(self) -> Option<reqwest::Body> {
        match self {
            ForwardBody::None => None,
            ForwardBody::Text(s) => Some(reqwest::Body::from(s)),
            ForwardBody::Binary(b) => Some(reqwest::Body::from(b)),
        }
    }
}
