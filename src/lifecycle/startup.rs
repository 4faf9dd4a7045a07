//! Startup orchestration.
//!
//! Config is validated before anything binds; logging comes up next so every
//! later step is visible; the listener binds last so traffic only arrives
//! once the server is ready. Any startup error is fatal.

use std::io;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{self, ConfigError, RelayConfig};
use crate::http::server::{HttpServer, ServerError};
use crate::lifecycle::shutdown::{Shutdown, DRAIN_TIMEOUT};
use crate::lifecycle::signals::wait_for_signal;
use crate::net::tls::load_tls_config;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("server setup failed: {0}")]
    Server(#[from] ServerError),

    #[error("metrics exporter failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Overrides from the command line, applied on top of the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind_address: Option<String>,
    pub backend_origin: Option<String>,
}

/// Load the config file (or defaults) and apply `overrides`.
pub fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(p) => config::load_config(p)?,
        None => RelayConfig::default(),
    };

    if let Some(bind) = overrides.bind_address {
        config.listener.bind_address = bind;
    }
    if let Some(origin) = overrides.backend_origin {
        config.backend.origin = Some(origin);
    }

    config::validation::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Run the relay until a termination signal arrives.
pub async fn run(config: RelayConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability);
    tracing::info!("backend-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        metrics::init_metrics(addr)?;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        connect_timeout_secs = config.timeouts.connect_secs,
        "Configuration loaded"
    );

    let tls = match &config.listener.tls {
        Some(tls) => Some(load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?),
        None => None,
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config.clone())?;
    let server_shutdown = shutdown.subscribe();

    let mut serving = match tls {
        Some(tls) => tokio::spawn(server.run_tls(tls, server_shutdown)),
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            tokio::spawn(server.run(listener, server_shutdown))
        }
    };

    tokio::select! {
        signal = wait_for_signal() => {
            let name = signal?;
            tracing::info!(signal = name, "Termination signal received");
        }
        result = &mut serving => {
            // Server ended on its own: surface why.
            return match result {
                Ok(r) => r.map_err(StartupError::from),
                Err(join) => Err(io::Error::other(join).into()),
            };
        }
    }

    shutdown.trigger();
    match tokio::time::timeout(DRAIN_TIMEOUT, serving).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join)) => return Err(io::Error::other(join).into()),
        Err(_) => tracing::warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Drain timed out, dropping remaining connections"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
