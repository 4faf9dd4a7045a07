//! Backend origin resolution.
//!
//! Precedence is explicit config value, then the environment variable, then
//! the hardcoded default. The environment is read once at construction unless
//! per-request reload is enabled.

use std::env;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendConfig, DEFAULT_BACKEND_ORIGIN};
use crate::config::validation::check_origin;

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("invalid backend origin from {source_name}: {message}")]
    Invalid {
        source_name: String,
        message: String,
    },
}

#[derive(Debug, Clone)]
enum OriginSource {
    Fixed(Url),
    Env(String),
}

/// The backend every request is forwarded to.
#[derive(Debug, Clone)]
pub struct BackendOrigin {
    source: OriginSource,
}

impl BackendOrigin {
    /// Always resolve to `url`.
    pub fn fixed(url: Url) -> Self {
        Self {
            source: OriginSource::Fixed(url),
        }
    }

    /// Build from configuration, reading the environment now unless
    /// `reload_env_per_request` is set.
    pub fn from_config(config: &BackendConfig) -> Result<Self, OriginError> {
        if let Some(origin) = &config.origin {
            let url = check_origin(origin).map_err(|message| OriginError::Invalid {
                source_name: "backend.origin".to_string(),
                message,
            })?;
            return Ok(Self::fixed(url));
        }

        if config.reload_env_per_request {
            return Ok(Self {
                source: OriginSource::Env(config.origin_env.clone()),
            });
        }

        let url = resolve_env_value(env::var(&config.origin_env).ok().as_deref()).map_err(
            |message| OriginError::Invalid {
                source_name: config.origin_env.clone(),
                message,
            },
        )?;
        Ok(Self::fixed(url))
    }

    /// The origin to use for the current request.
    pub fn current(&self) -> Url {
        match &self.source {
            OriginSource::Fixed(url) => url.clone(),
            OriginSource::Env(var) => {
                match resolve_env_value(env::var(var).ok().as_deref()) {
                    Ok(url) => url,
                    Err(message) => {
                        tracing::warn!(env = %var, error = %message, "Ignoring invalid backend origin");
                        default_origin()
                    }
                }
            }
        }
    }

    /// Whether the environment is consulted on every call to [`current`](Self::current).
    pub fn is_dynamic(&self) -> bool {
        matches!(self.source, OriginSource::Env(_))
    }
}

fn default_origin() -> Url {
    Url::parse(DEFAULT_BACKEND_ORIGIN).expect("default backend origin is a valid URL")
}

/// Resolve an environment value: unset or blank falls back to the default.
fn resolve_env_value(value: Option<&str>) -> Result<Url, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => check_origin(v),
        None => Ok(default_origin()),
    }
}
