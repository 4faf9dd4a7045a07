//! Cookie-backed sessions: the token itself lives in an HttpOnly cookie.

use axum::http::header::{HeaderMap, HeaderValue, InvalidHeaderValue, COOKIE};

use crate::config::SessionConfig;
use crate::session::{SessionLookup, SessionToken};

/// Reads the bearer token from a named cookie.
#[derive(Debug, Clone)]
pub struct CookieSession {
    config: SessionConfig,
}

impl CookieSession {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// `Set-Cookie` value storing `token` for `max_age_secs`.
    pub fn issue(&self, token: &SessionToken, max_age_secs: u64) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.config.cookie_name,
            token.as_str(),
            max_age_secs
        );
        if self.config.secure_cookie {
            cookie.push_str("; Secure");
        }
        let mut value = HeaderValue::from_str(&cookie)?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// `Set-Cookie` value that expires the session cookie.
    pub fn clear(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.config.cookie_name
        );
        if self.config.secure_cookie {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Default lifetime for tokens without an `exp` claim.
    pub fn default_max_age(&self) -> u64 {
        self.config.default_max_age_secs
    }
}

impl SessionLookup for CookieSession {
    fn lookup(&self, headers: &HeaderMap) -> Option<SessionToken> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.config.cookie_name)
            .map(|(_, value)| value.trim_matches('"'))
            .filter(|value| !value.is_empty())
            .map(SessionToken::new)
    }
}
