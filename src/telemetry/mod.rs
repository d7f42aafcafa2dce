//! Telemetry
//!
//! Structured logging setup. Request logging for the HTTP front is done by
//! tower-http's `TraceLayer` in [`crate::server`].

pub mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
