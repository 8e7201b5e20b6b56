//! Owner-scoped storage of client-encrypted secrets.
//!
//! [`SecretAccess`] resolves the caller's identity from a session token and
//! only ever touches that user's secrets. [`SecretRepository`] is the
//! persistence collaborator behind it; [`MemoryRepository`] is the in-process
//! implementation the server runs with.
//!
//! Secret `payload` and `meta` are ciphertext produced by the client. Nothing
//! in this module parses, logs, or re-encrypts them.

pub mod access;
pub mod memory;
pub mod model;
pub mod repository;

pub use access::SecretAccess;
pub use memory::MemoryRepository;
pub use model::{NewSecret, Secret, SecretId, SecretUpdate, User};
pub use repository::{RepositoryError, SecretRepository};
