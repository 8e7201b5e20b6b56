//! Registration, login, and logout.
//!
//! Successful registration or login ends in a fresh session token from the
//! [`SessionStore`]. Passwords are hashed with Argon2id on the blocking pool
//! and never stored or logged in clear.

pub mod password;

use std::sync::Arc;

use common::protocol::Credentials;
use tracing::{info, warn};

use crate::error::AccessError;
use crate::secrets::{RepositoryError, SecretRepository};
use crate::session::SessionStore;

/// User account operations.
#[derive(Clone)]
pub struct Accounts {
    sessions: SessionStore,
    repo: Arc<dyn SecretRepository>,
}

impl Accounts {
    /// Create an account service over `sessions` and `repo`.
    pub fn new(sessions: SessionStore, repo: Arc<dyn SecretRepository>) -> Self {
        Self { sessions, repo }
    }

    /// Create a user and open a session for it.
    ///
    /// # Errors
    ///
    /// [`AccessError::Invalid`] for an empty login or password,
    /// [`AccessError::Conflict`] if the login is taken.
    pub async fn register(&self, credentials: Credentials) -> Result<String, AccessError> {
        validate(&credentials)?;
        let Credentials { login, password } = credentials;

        let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| AccessError::PasswordHash(e.to_string()))?
            .map_err(|e| AccessError::PasswordHash(e.to_string()))?;

        let user_id = self.repo.create_user(&login, &hash).await?;
        info!(user_id, "user registered");
        Ok(self.sessions.issue(user_id).await?)
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    ///
    /// [`AccessError::BadCredentials`] for an unknown login or a wrong
    /// password; the two cases are indistinguishable to the caller.
    pub async fn login(&self, credentials: Credentials) -> Result<String, AccessError> {
        validate(&credentials)?;
        let Credentials { login, password } = credentials;

        let user = match self.repo.get_user_by_login(&login).await {
            Ok(user) => user,
            Err(RepositoryError::UserNotFound(_)) => {
                tokio::task::spawn_blocking(move || password::verify_unknown_user(&password))
                    .await
                    .map_err(|e| AccessError::PasswordHash(e.to_string()))?;
                return Err(AccessError::BadCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored))
            .await
            .map_err(|e| AccessError::PasswordHash(e.to_string()))?
            .map_err(|e| AccessError::PasswordHash(e.to_string()))?;
        if !matches {
            warn!(user_id = user.id, "login rejected: wrong password");
            return Err(AccessError::BadCredentials);
        }

        info!(user_id = user.id, "user logged in");
        Ok(self.sessions.issue(user.id).await?)
    }

    /// Revoke the session behind `token`.
    pub async fn logout(&self, token: &str) -> Result<(), AccessError> {
        if self.sessions.revoke(token).await {
            Ok(())
        } else {
            Err(AccessError::Unauthorized)
        }
    }
}

fn validate(credentials: &Credentials) -> Result<(), AccessError> {
    if credentials.login.trim().is_empty() {
        return Err(AccessError::Invalid("login must not be empty".into()));
    }
    if credentials.password.is_empty() {
        return Err(AccessError::Invalid("password must not be empty".into()));
    }
    Ok(())
}
