//! Process-local [`SecretRepository`] backed by ordered maps.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use common::SecretKind;
use tokio::sync::RwLock;

use super::model::{NewSecret, Secret, SecretId, SecretUpdate, User};
use super::repository::{RepositoryError, SecretRepository};
use crate::UserId;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    secrets: BTreeMap<SecretId, Secret>,
    last_user_id: UserId,
    last_secret_id: SecretId,
}

/// In-memory repository. Contents are lost on restart.
///
/// Ids start at 1 and are never reused, so an id observed once always refers
/// to the same secret (or to nothing after deletion).
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    /// Create a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretRepository for MemoryRepository {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserId, RepositoryError> {
        let mut tables = self.inner.write().await;
        if tables.users.values().any(|u| u.login == login) {
            return Err(RepositoryError::UserExists(login.to_owned()));
        }
        tables.last_user_id += 1;
        let id = tables.last_user_id;
        tables.users.insert(
            id,
            User {
                id,
                login: login.to_owned(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(id)
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User, RepositoryError> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.login == login)
            .cloned()
            .ok_or_else(|| RepositoryError::UserNotFound(login.to_owned()))
    }

    async fn create_secret(&self, owner: UserId, secret: NewSecret) -> Result<SecretId, RepositoryError> {
        let mut tables = self.inner.write().await;
        if tables.secrets.values().any(|s| s.name == secret.name) {
            return Err(RepositoryError::SecretExists(secret.name));
        }
        tables.last_secret_id += 1;
        let id = tables.last_secret_id;
        tables.secrets.insert(
            id,
            Secret {
                id,
                owner,
                name: secret.name,
                kind: secret.kind,
                payload: secret.payload,
                meta: secret.meta,
            },
        );
        Ok(id)
    }

    async fn list_secrets(
        &self,
        owner: UserId,
        kind: Option<SecretKind>,
    ) -> Result<Vec<Secret>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .secrets
            .values()
            .filter(|s| s.owner == owner && kind.map_or(true, |k| s.kind == k))
            .cloned()
            .collect())
    }

    async fn get_secret(&self, id: SecretId) -> Result<Secret, RepositoryError> {
        self.inner
            .read()
            .await
            .secrets
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::SecretNotFound(id))
    }

    async fn update_secret(&self, id: SecretId, data: SecretUpdate) -> Result<SecretId, RepositoryError> {
        let mut tables = self.inner.write().await;
        let secret = tables
            .secrets
            .get_mut(&id)
            .ok_or(RepositoryError::SecretNotFound(id))?;
        secret.kind = data.kind;
        secret.payload = data.payload;
        secret.meta = data.meta;
        Ok(id)
    }

    async fn delete_secret(&self, id: SecretId) -> Result<(), RepositoryError> {
        self.inner
            .write()
            .await
            .secrets
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::SecretNotFound(id))
    }
}
