//! Errors raised by the account and secret access layers.

use common::ServiceError;
use thiserror::Error;

use crate::secrets::{RepositoryError, SecretId};
use crate::session::SessionError;

/// Failure of an account or secret operation.
///
/// Category variants wrap the repository error that caused them so the
/// original cause stays reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum AccessError {
    /// The session token is missing, unknown, or expired.
    #[error("session token is missing, invalid, or expired")]
    Unauthorized,

    /// Unknown login or wrong password. The two are not distinguished.
    #[error("invalid login or password")]
    BadCredentials,

    /// The secret exists but belongs to another user.
    #[error("secret {0} belongs to another user")]
    Forbidden(SecretId),

    /// Rejected input, e.g. an empty login or secret name.
    #[error("{0}")]
    Invalid(String),

    /// Duplicate login or secret name.
    #[error(transparent)]
    Conflict(RepositoryError),

    /// No such secret.
    #[error(transparent)]
    NotFound(RepositoryError),

    /// The repository failed for a reason the caller cannot fix.
    #[error("repository failure")]
    Repository(#[source] RepositoryError),

    /// Password hashing or verification failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// A session could not be issued.
    #[error("failed to open session")]
    Session(#[from] SessionError),
}

impl From<RepositoryError> for AccessError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UserExists(_) | RepositoryError::SecretExists(_) => {
                AccessError::Conflict(err)
            }
            RepositoryError::UserNotFound(_) | RepositoryError::SecretNotFound(_) => {
                AccessError::NotFound(err)
            }
            RepositoryError::Backend(_) => AccessError::Repository(err),
        }
    }
}

impl AccessError {
    /// Whether this failure is the server's fault rather than the caller's.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AccessError::Repository(_) | AccessError::PasswordHash(_) | AccessError::Session(_)
        )
    }
}

impl From<AccessError> for ServiceError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized | AccessError::BadCredentials => {
                ServiceError::Unauthorized(err.to_string())
            }
            AccessError::Forbidden(_) => ServiceError::Forbidden(err.to_string()),
            AccessError::Invalid(msg) => ServiceError::BadRequest(msg),
            AccessError::Conflict(e) => ServiceError::Conflict(e.to_string()),
            AccessError::NotFound(e) => ServiceError::NotFound(e.to_string()),
            // Internal details stay in the server log.
            AccessError::Repository(_) | AccessError::PasswordHash(_) | AccessError::Session(_) => {
                ServiceError::Internal("internal error".into())
            }
        }
    }
}
