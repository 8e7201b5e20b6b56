//! Password keeper server.
//!
//! The server stores client-encrypted secrets and never sees plaintext. It
//! owns two pieces of security-relevant state:
//!
//! - [`session::SessionStore`]: opaque, time-bounded session tokens with a
//!   cancellable background reaper.
//! - [`secrets::SecretAccess`]: the owner-scoped gate in front of the
//!   [`secrets::SecretRepository`] collaborator.
//!
//! Everything else (HTTP routing, TLS, telemetry, configuration) is thin
//! plumbing around those two.

pub mod accounts;
pub mod config;
pub mod error;
pub mod secrets;
pub mod server;
pub mod session;
pub mod telemetry;

/// Numeric user identifier assigned by the repository.
pub type UserId = i64;
