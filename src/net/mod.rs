//! Network layer.
//!
//! Plain TCP is bound directly by the lifecycle code; this module only
//! carries what TLS termination needs.

pub mod tls;
