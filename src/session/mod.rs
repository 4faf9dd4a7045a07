//! Session collaborator.
//!
//! The relay never verifies credentials. It only needs to answer one
//! question per request: is there a bearer token for this caller? That
//! question is behind [`SessionLookup`] so the backing store can be swapped.
//!
//! # Data Flow
//! ```text
//! inbound headers
//!     → SessionLookup::lookup (cookie.rs by default)
//!     → Option<SessionToken>
//!     → security::headers injects `Authorization: Bearer …` if absent
//! ```

pub mod claims;
pub mod cookie;

use std::fmt;

use axum::http::{HeaderMap, HeaderValue};

pub use claims::{Claims, SessionError};
pub use cookie::CookieSession;

/// An opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Bearer {token}` as a header value, or `None` if the token holds
    /// bytes that cannot appear in a header.
    pub fn bearer_header(&self) -> Option<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0)).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

// Tokens end up in logs via `?` formatting far too easily.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"<redacted>").finish()
    }
}

/// Looks up the bearer token belonging to the caller of a request.
pub trait SessionLookup: Send + Sync + 'static {
    fn lookup(&self, headers: &HeaderMap) -> Option<SessionToken>;
}

/// A lookup that never finds a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionLookup for NoSession {
    fn lookup(&self, _headers: &HeaderMap) -> Option<SessionToken> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_sensitive() {
        let value = SessionToken::new("abc.def.ghi").bearer_header().unwrap();
        assert_eq!(value, "Bearer abc.def.ghi");
        assert!(value.is_sensitive());
    }

    #[test]
    fn token_with_newline_has_no_header() {
        assert!(SessionToken::new("abc\r\nx-evil: 1").bearer_header().is_none());
    }

    #[test]
    fn debug_does_not_leak() {
        let printed = format!("{:?}", SessionToken::new("secret"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn no_session_ignores_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("relay_session=tok"));
        assert!(NoSession.lookup(&headers).is_none());
    }
}
