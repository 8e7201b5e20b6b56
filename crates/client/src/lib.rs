//! Password keeper client.
//!
//! - [`crypto`]: chunked RSA-OAEP envelope; all encryption happens here.
//! - [`keys`]: per-login private key files.
//! - [`payload`]: the plaintext JSON shape of each secret kind.
//! - [`client`]: [`KeeperClient`], the HTTP driver tying the three together.

pub mod client;
pub mod config;
pub mod crypto;
pub mod keys;
pub mod payload;
pub mod telemetry;

pub use client::{ClientError, KeeperClient, NewSecret, Secret, SecretSummary};
pub use keys::KeyStore;
pub use payload::SecretPayload;
