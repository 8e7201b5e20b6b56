//! Client-side envelope encryption.
//!
//! The server only ever receives ciphertext produced here. This module is
//! free of HTTP and filesystem dependencies.
//!
//! # Blob format
//!
//! ```text
//! chunk_0 || chunk_1 || ... || chunk_n      each chunk = modulus size bytes
//! ```
//!
//! Chunk `i` is `RSA-OAEP-SHA256(plaintext[128 * i .. 128 * (i + 1)])`.

pub mod envelope;

pub use envelope::{EnvelopeError, EnvelopeKey, PrivateKeyPem};
