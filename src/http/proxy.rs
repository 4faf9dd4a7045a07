//! The `/api/{*path}` catch-all.
//!
//! One inbound request produces exactly one outbound request and one client
//! response. Nothing is retried, cached or coalesced.

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::http::error::ProxyError;
use crate::http::request::{ForwardBody, RequestIdExt};
use crate::http::response::{self, RelayMode};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{path_segments, target_url, API_PREFIX};
use crate::security::headers::forward_request_headers;

/// Forward any GET/POST/PUT/PATCH/DELETE under `/api/` to the backend.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_owned();
    let method = request.method().clone();

    match forward(&state, request, &request_id).await {
        Ok((response, mode)) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), mode.as_str(), start_time);
            response
        }
        Err(e) => {
            match &e {
                ProxyError::Upstream(err) => {
                    tracing::error!(request_id = %request_id, error = %err, "Proxy error");
                    metrics::record_upstream_error(upstream_error_kind(err));
                }
                other => {
                    tracing::warn!(request_id = %request_id, error = %other, "Rejected request");
                }
            }
            let response = e.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), "error", start_time);
            response
        }
    }
}

pub(crate) fn upstream_error_kind(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_body() || err.is_decode() {
        "body"
    } else {
        "other"
    }
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
) -> Result<(Response, RelayMode), ProxyError> {
    let (parts, body) = request.into_parts();

    let rest = parts.uri.path().strip_prefix(API_PREFIX).unwrap_or_default();
    let segments = path_segments(rest)?;
    let url = target_url(&state.origin.current(), &segments, parts.uri.query())?;

    let body = ForwardBody::read(&parts.method, &parts.headers, body, state.max_body_size).await?;
    let session = state.session.lookup(&parts.headers);
    let headers = forward_request_headers(&parts.headers, session.as_ref());

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        target = %url.path(),
        body_kind = body.kind(),
        body_len = body.len(),
        session = session.is_some(),
        "Forwarding request"
    );

    let mut outbound = state.client.request(parts.method, url).headers(headers);
    if let Some(body) = body.into_reqwest() {
        outbound = outbound.body(body);
    }
    let upstream = outbound.send().await?;

    tracing::debug!(
        request_id = %request_id,
        status = upstream.status().as_u16(),
        "Backend responded"
    );

    response::relay(upstream, request_id).await
}
