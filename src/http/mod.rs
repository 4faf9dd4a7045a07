//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, body read + text/binary decision)
//!     → proxy.rs (target URL, header allow-list, session token, send)
//!     → response.rs (401 normalization, buffered relay)
//!         └→ stream.rs (event streams, chunk by chunk)
//!     → Send to client
//! ```

pub mod error;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod stream;

pub use error::ProxyError;
pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
