//! Common types, protocol definitions, and errors shared by the keeper server
//! and client crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
pub use protocol::SecretKind;
