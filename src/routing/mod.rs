//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (/api/{*path}?{query})
//!     → origin.rs (which backend: config > env > default)
//!     → target.rs (segments + verbatim query → outbound URL)
//!     → Outbound URL
//! ```
//!
//! # Design Decisions
//! - Single backend origin; no route table, no load balancing
//! - Path segments are forwarded still percent-encoded
//! - Dot segments are refused so nothing escapes the `/api/` namespace

pub mod origin;
pub mod target;

pub use origin::{BackendOrigin, OriginError};
pub use target::{path_segments, target_url, TargetError, API_PREFIX};
