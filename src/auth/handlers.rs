use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::http::error::{bad_gateway, unauthorized};
use crate::http::proxy::upstream_error_kind;
use crate::http::request::RequestIdExt;
use crate::http::response::buffered;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::session::{Claims, SessionToken};

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
        }
    }
}

/// JSON content type plus the caller's cookies, nothing else.
fn json_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for cookie in inbound.get_all(COOKIE) {
        headers.append(COOKIE, cookie.clone());
    }
    headers
}

fn auth_url(state: &AppState, segments: &[&str]) -> Option<Url> {
    let mut url = state.origin.current();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .ok()?
        .clear()
        .extend(["api", "auth"])
        .extend(segments);
    Some(url)
}

async fn send_and_relay(
    request: reqwest::RequestBuilder,
    request_id: &str,
    route: &'static str,
) -> Response {
    match request.send().await {
        Ok(upstream) => match buffered(upstream).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(request_id = %request_id, route, error = %e, "Auth proxy error");
                bad_gateway()
            }
        },
        Err(e) => {
            tracing::error!(request_id = %request_id, route, error = %e, "Auth proxy error");
            metrics::record_upstream_error(upstream_error_kind(&e));
            bad_gateway()
        }
    }
}

/// `POST /api/auth/signup` → `{origin}/api/auth/signup`
pub async fn signup(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(url) = auth_url(&state, &["signup"]) else {
        return bad_gateway();
    };
    let request = state
        .client
        .post(url)
        .headers(json_headers(&headers))
        .body(String::from_utf8_lossy(&body).into_owned());
    send_and_relay(request, headers.request_id(), "signup").await
}

/// `GET /api/auth/user-exists/{email}` → `{origin}/api/auth/user-exists/{email}`
pub async fn user_exists(
    State(state): State<AppState>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(url) = auth_url(&state, &["user-exists", email.as_str()]) else {
        return bad_gateway();
    };
    let request = state.client.get(url).headers(json_headers(&headers));
    send_and_relay(request, headers.request_id(), "user_exists").await
}

/// `POST /api/auth/login`: exchange credentials for a token at
/// `{origin}/api/auth/token` and keep it in the session cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(credentials): Json<LoginRequest>,
) -> Response {
    let request_id = headers.request_id();
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email and password are required" })),
        )
            .into_response();
    }

    let Some(url) = auth_url(&state, &["token"]) else {
        return bad_gateway();
    };
    let upstream = match state.client.post(url).json(&credentials).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Login proxy error");
            metrics::record_upstream_error(upstream_error_kind(&e));
            return bad_gateway();
        }
    };

    if upstream.status() != StatusCode::OK {
        tracing::info!(request_id = %request_id, status = upstream.status().as_u16(), "Login rejected");
        return unauthorized();
    }

    let token = match upstream.json::<TokenResponse>().await {
        Ok(TokenResponse { access_token: Some(t) }) if !t.is_empty() => SessionToken::new(t),
        Ok(_) => {
            tracing::warn!(request_id = %request_id, "Login response carried no access token");
            return unauthorized();
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Login response unreadable");
            return bad_gateway();
        }
    };

    let claims = Claims::peek(&token).unwrap_or_else(|e| {
        tracing::debug!(request_id = %request_id, error = %e, "Token claims unreadable, treating as opaque");
        Claims::default()
    });
    let max_age = claims
        .remaining_secs()
        .unwrap_or_else(|| state.cookies.default_max_age());

    let cookie = match state.cookies.issue(&token, max_age) {
        Ok(c) => c,
        Err(_) => {
            tracing::error!(request_id = %request_id, "Token cannot be stored in a cookie");
            return bad_gateway();
        }
    };

    let mut user = SessionUser::from(claims);
    if user.email.is_none() {
        user.email = Some(credentials.email);
    }

    tracing::info!(request_id = %request_id, user = ?user.id, "Session established");
    let mut response = Json(user).into_response();
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}

/// `POST /api/auth/logout`: drop the session cookie.
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(cookie) = state.cookies.clear() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// `GET /api/auth/session`: who the session cookie belongs to.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = state.session.lookup(&headers) else {
        return unauthorized();
    };
    let claims = match Claims::peek(&token) {
        Ok(c) if !c.is_expired() => c,
        Ok(_) => return unauthorized(),
        Err(e) => {
            tracing::debug!(request_id = %headers.request_id(), error = %e, "Session token unreadable");
            return unauthorized();
        }
    };
    let expires = claims.exp;
    Json(json!({ "user": SessionUser::from(claims), "expires": expires })).into_response()
}
