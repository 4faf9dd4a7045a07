//! Unverified JWT claim extraction.
//!
//! The backend signs and verifies tokens. The relay only peeks at the payload
//! to show who is signed in and to size the session cookie's lifetime.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionToken;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token is not a JWT (expected 3 dot-separated parts)")]
    Malformed,

    #[error("token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not valid claims JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The subset of claims the frontend displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Decode the payload segment of `token` without checking its signature.
    pub fn peek(token: &SessionToken) -> Result<Self, SessionError> {
        let mut parts = token.as_str().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::Malformed);
        };
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Seconds until `exp`, zero once expired, `None` without an `exp` claim.
    pub fn remaining_secs(&self) -> Option<u64> {
        let exp = self.exp?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Some(exp.saturating_sub(now).max(0) as u64)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs() == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(payload: &str) -> SessionToken {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        SessionToken::new(format!("{header}.{body}.c2lnbmF0dXJl"))
    }

    #[test]
    fn reads_display_claims() {
        let claims = Claims::peek(&jwt(
            r#"{"sub":"42","name":"Ada","email":"ada@example.com","exp":4102444800,"iat":1}"#,
        ))
        .unwrap();
        assert_eq!(claims.sub.as_deref(), Some("42"));
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert!(!claims.is_expired());
        assert!(claims.remaining_secs().unwrap() > 0);
    }

    #[test]
    fn missing_claims_are_none() {
        let claims = Claims::peek(&jwt(r#"{"sub":"7"}"#)).unwrap();
        assert_eq!(claims.name, None);
        assert_eq!(claims.remaining_secs(), None);
        assert!(!claims.is_expired());
    }

    #[test]
    fn past_exp_is_expired() {
        let claims = Claims::peek(&jwt(r#"{"exp":1}"#)).unwrap();
        assert_eq!(claims.remaining_secs(), Some(0));
        assert!(claims.is_expired());
    }

    #[test]
    fn rejects_non_jwt() {
        assert!(matches!(
            Claims::peek(&SessionToken::new("opaque-token")),
            Err(SessionError::Malformed)
        ));
        assert!(matches!(
            Claims::peek(&SessionToken::new("a.b.c.d")),
            Err(SessionError::Malformed)
        ));
        assert!(matches!(
            Claims::peek(&SessionToken::new("a.!!!.c")),
            Err(SessionError::Encoding(_))
        ));
        assert!(matches!(
            Claims::peek(&SessionToken::new(format!("a.{}.c", URL_SAFE_NO_PAD.encode("42")))),
            Err(SessionError::Payload(_))
        ));
    }
}
