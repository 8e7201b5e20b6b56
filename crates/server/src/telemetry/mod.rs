//! Structured logging and optional OpenTelemetry trace export.
//!
//! # Telemetry invariants
//!
//! - **No session tokens, passwords, or secret payloads** may appear in any
//!   span attribute or log field. Secrets are referred to by id only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
