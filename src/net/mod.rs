//! Network layer subsystem.
//!
//! Plain TCP is served directly by `axum::serve`; this module only covers the
//! optional TLS termination in front of it.

pub mod tls;
