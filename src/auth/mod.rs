//! Session endpoints the frontend calls directly.
//!
//! These sit beside the `/api/{*path}` catch-all and take precedence over it.
//! Signup and user-exists are plain forwards with a fixed JSON content type
//! and the caller's cookies; login, logout and session manage the cookie that
//! holds the bearer token.

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

use crate::http::server::AppState;
use self::handlers::*;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/user-exists/{email}", get(user_exists))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session))
}
