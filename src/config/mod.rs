//! Per-session configuration.

pub mod session;
