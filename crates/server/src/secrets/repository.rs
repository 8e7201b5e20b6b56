//! Persistence contract consumed by the access controller and accounts.

use async_trait::async_trait;
use common::SecretKind;
use thiserror::Error;

use super::model::{NewSecret, Secret, SecretId, SecretUpdate, User};
use crate::UserId;

/// Errors signalled by a [`SecretRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("user {0:?} already exists")]
    UserExists(String),

    #[error("user {0:?} not found")]
    UserNotFound(String),

    #[error("secret name {0:?} already exists")]
    SecretExists(String),

    #[error("secret {0} not found")]
    SecretNotFound(SecretId),

    /// The storage backend itself failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Storage for users and secrets.
///
/// Implementations own uniqueness: `login` is unique among users and a
/// secret `name` is unique across all users. Ids are never reused and a
/// secret's owner never changes. Secret bytes are stored and returned
/// byte-for-byte.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// Create a user; fails with [`RepositoryError::UserExists`] on a taken login.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserId, RepositoryError>;

    /// Look a user up by login.
    async fn get_user_by_login(&self, login: &str) -> Result<User, RepositoryError>;

    /// Store a secret for `owner`; fails with [`RepositoryError::SecretExists`]
    /// on a taken name.
    async fn create_secret(&self, owner: UserId, secret: NewSecret) -> Result<SecretId, RepositoryError>;

    /// Secrets owned by `owner`, optionally restricted to one kind, in id order.
    async fn list_secrets(
        &self,
        owner: UserId,
        kind: Option<SecretKind>,
    ) -> Result<Vec<Secret>, RepositoryError>;

    /// Fetch a secret regardless of owner.
    async fn get_secret(&self, id: SecretId) -> Result<Secret, RepositoryError>;

    /// Replace kind, payload, and meta of an existing secret.
    async fn update_secret(&self, id: SecretId, data: SecretUpdate) -> Result<SecretId, RepositoryError>;

    /// Delete a secret.
    async fn delete_secret(&self, id: SecretId) -> Result<(), RepositoryError>;
}
