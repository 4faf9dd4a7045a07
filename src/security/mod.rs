//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (allow-list, bearer injection)
//!     → forwarded to backend
//! Backend response:
//!     → headers.rs (strip transfer artifacts, keep each set-cookie)
//!     → returned to client
//! ```
//!
//! # Design Decisions
//! - Allow-list, not deny-list, for anything sent to the backend
//! - A caller-supplied Authorization header is never replaced

pub mod headers;
