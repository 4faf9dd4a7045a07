//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the auth routes and the `/api` catch-all
//! - Wire up middleware (request ID, tracing)
//! - Build the shared outbound client
//! - Serve over plain TCP or TLS until shutdown

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::RelayConfig;
use crate::http::proxy::proxy_handler;
use crate::http::request::{request_id_layer, RequestIdExt};
use crate::lifecycle::shutdown::DRAIN_TIMEOUT;
use crate::routing::{BackendOrigin, OriginError};
use crate::session::{CookieSession, SessionLookup};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Origin(#[from] OriginError),

    #[error("failed to build backend client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub origin: Arc<BackendOrigin>,
    pub client: reqwest::Client,
    pub session: Arc<dyn SessionLookup>,
    pub cookies: Arc<CookieSession>,
    pub max_body_size: usize,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server whose sessions live in the configured cookie.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let cookies = Arc::new(CookieSession::new(config.session.clone()));
        Self::with_session(config, cookies)
    }

    /// Create a server with a custom session lookup. Login and logout still
    /// issue and clear the configured cookie.
    pub fn with_session(
        config: RelayConfig,
        session: Arc<dyn SessionLookup>,
    ) -> Result<Self, ServerError> {
        let origin = Arc::new(BackendOrigin::from_config(&config.backend)?);

        // No proxy env handling and no transparent decompression: the
        // backend is addressed directly and its bytes are relayed as sent.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .no_proxy()
            .build()?;

        tracing::info!(
            origin = %origin.current(),
            dynamic = origin.is_dynamic(),
            "Backend origin resolved"
        );

        let state = AppState {
            origin,
            client,
            session,
            cookies: Arc::new(CookieSession::new(config.session.clone())),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No request deadline is layered on: a slow backend is waited for, and
    /// only connection establishment is bounded by the client.
    fn build_router(state: AppState) -> Router {
        let api = get(proxy_handler)
            .post(proxy_handler)
            .put(proxy_handler)
            .patch(proxy_handler)
            .delete(proxy_handler);

        Router::new()
            .merge(auth::router())
            .route("/api/{*path}", api)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            request_id = %request.request_id(),
                            method = %request.method(),
                            path = %request.uri().path(),
                        )
                    })),
            )
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on the configured bind address until `shutdown` fires.
    pub async fn run_tls(
        self,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received, draining connections");
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
