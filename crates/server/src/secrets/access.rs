//! [`SecretAccess`]: session-scoped gate in front of the repository.

use std::sync::Arc;

use common::SecretKind;
use tracing::{info, warn};

use super::model::{NewSecret, Secret, SecretId, SecretUpdate};
use super::repository::SecretRepository;
use crate::error::AccessError;
use crate::session::SessionStore;
use crate::UserId;

/// Mediates every secret operation through the identity behind a session token.
///
/// A caller never supplies a user id: the owner is always the user the token
/// resolves to. Reads, updates, and deletes of a secret owned by someone
/// else fail with [`AccessError::Forbidden`]. Payload and meta bytes pass
/// through untouched.
#[derive(Clone)]
pub struct SecretAccess {
    sessions: SessionStore,
    repo: Arc<dyn SecretRepository>,
}

impl SecretAccess {
    /// Create a controller over `sessions` and `repo`.
    pub fn new(sessions: SessionStore, repo: Arc<dyn SecretRepository>) -> Self {
        Self { sessions, repo }
    }

    /// Store a new secret owned by the token's user.
    ///
    /// # Errors
    ///
    /// [`AccessError::Unauthorized`] for a bad token, [`AccessError::Invalid`]
    /// for an empty name, [`AccessError::Conflict`] if the name is taken by
    /// any user.
    pub async fn create(&self, token: &str, secret: NewSecret) -> Result<SecretId, AccessError> {
        let user_id = self.resolve(token).await?;
        if secret.name.trim().is_empty() {
            return Err(AccessError::Invalid("secret name must not be empty".into()));
        }
        let kind = secret.kind;
        let id = self.repo.create_secret(user_id, secret).await?;
        info!(user_id, secret_id = id, ?kind, "secret created");
        Ok(id)
    }

    /// Secrets owned by the token's user; `kind: None` means every kind.
    pub async fn list(&self, token: &str, kind: Option<SecretKind>) -> Result<Vec<Secret>, AccessError> {
        let user_id = self.resolve(token).await?;
        Ok(self.repo.list_secrets(user_id, kind).await?)
    }

    /// Fetch one secret owned by the token's user.
    ///
    /// # Errors
    ///
    /// [`AccessError::NotFound`] if no such id, [`AccessError::Forbidden`] if
    /// another user owns it.
    pub async fn get(&self, token: &str, id: SecretId) -> Result<Secret, AccessError> {
        let user_id = self.resolve(token).await?;
        self.owned(user_id, id).await
    }

    /// Replace kind, payload, and meta of a secret owned by the token's user.
    pub async fn update(&self, token: &str, id: SecretId, update: SecretUpdate) -> Result<SecretId, AccessError> {
        let user_id = self.resolve(token).await?;
        // Owners never change and ids are never reused, so the check cannot
        // go stale before the write.
        self.owned(user_id, id).await?;
        let id = self.repo.update_secret(id, update).await?;
        info!(user_id, secret_id = id, "secret updated");
        Ok(id)
    }

    /// Delete a secret owned by the token's user.
    pub async fn delete(&self, token: &str, id: SecretId) -> Result<(), AccessError> {
        let user_id = self.resolve(token).await?;
        self.owned(user_id, id).await?;
        self.repo.delete_secret(id).await?;
        info!(user_id, secret_id = id, "secret deleted");
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<UserId, AccessError> {
        self.sessions
            .validate(token)
            .await
            .ok_or(AccessError::Unauthorized)
    }

    async fn owned(&self, user_id: UserId, id: SecretId) -> Result<Secret, AccessError> {
        let secret = self.repo.get_secret(id).await?;
        if secret.owner != user_id {
            warn!(user_id, secret_id = id, "cross-user secret access denied");
            return Err(AccessError::Forbidden(id));
        }
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::secrets::memory::MemoryRepository;
    use crate::secrets::repository::{MockSecretRepository, RepositoryError};

    fn card(name: &str) -> NewSecret {
        NewSecret {
            name: name.into(),
            kind: SecretKind::BankCard,
            payload: vec![0xAA; 1024],
            meta: vec![0xBB; 512],
        }
    }

    fn with_memory() -> (SessionStore, SecretAccess) {
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let access = SecretAccess::new(sessions.clone(), Arc::new(MemoryRepository::new()));
        (sessions, access)
    }

    fn with_mock(repo: MockSecretRepository) -> (SessionStore, SecretAccess) {
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let access = SecretAccess::new(sessions.clone(), Arc::new(repo));
        (sessions, access)
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized_everywhere() {
        let (_, access) = with_memory();
        assert!(matches!(access.create("bogus", card("c")).await, Err(AccessError::Unauthorized)));
        assert!(matches!(access.list("bogus", None).await, Err(AccessError::Unauthorized)));
        assert!(matches!(access.get("bogus", 1).await, Err(AccessError::Unauthorized)));
        assert!(matches!(access.delete("bogus", 1).await, Err(AccessError::Unauthorized)));
    }

    #[tokio::test]
    async fn owner_round_trip_preserves_bytes() {
        let (sessions, access) = with_memory();
        let token = sessions.issue(1).await.unwrap();

        let submitted = card("bank1");
        let id = access.create(&token, submitted.clone()).await.unwrap();
        let stored = access.get(&token, id).await.unwrap();
        assert_eq!(stored.owner, 1);
        assert_eq!(stored.payload, submitted.payload);
        assert_eq!(stored.meta, submitted.meta);
    }

    #[tokio::test]
    async fn list_is_scoped_to_caller() {
        let (sessions, access) = with_memory();
        let alice = sessions.issue(1).await.unwrap();
        let bob = sessions.issue(2).await.unwrap();

        access.create(&alice, card("a1")).await.unwrap();
        access
            .create(
                &alice,
                NewSecret {
                    kind: SecretKind::Text,
                    ..card("a2")
                },
            )
            .await
            .unwrap();
        access.create(&bob, card("b1")).await.unwrap();

        let names: Vec<_> = access
            .list(&alice, None)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["a1", "a2"]);

        let cards = access.list(&alice, Some(SecretKind::BankCard)).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(access.list(&bob, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_users_secret_is_forbidden() {
        let (sessions, access) = with_memory();
        let alice = sessions.issue(1).await.unwrap();
        let bob = sessions.issue(2).await.unwrap();
        let id = access.create(&alice, card("s")).await.unwrap();

        assert!(matches!(access.get(&bob, id).await, Err(AccessError::Forbidden(x)) if x == id));
        let update = SecretUpdate {
            kind: SecretKind::Text,
            payload: vec![1],
            meta: vec![2],
        };
        assert!(matches!(access.update(&bob, id, update).await, Err(AccessError::Forbidden(_))));
        assert!(matches!(access.delete(&bob, id).await, Err(AccessError::Forbidden(_))));

        // Untouched by the rejected calls.
        let stored = access.get(&alice, id).await.unwrap();
        assert_eq!(stored.kind, SecretKind::BankCard);
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict_even_across_users() {
        let (sessions, access) = with_memory();
        let alice = sessions.issue(1).await.unwrap();
        let bob = sessions.issue(2).await.unwrap();
        access.create(&alice, card("shared")).await.unwrap();
        assert!(matches!(access.create(&bob, card("shared")).await, Err(AccessError::Conflict(_))));
    }

    #[tokio::test]
    async fn empty_name_is_invalid() {
        let (sessions, access) = with_memory();
        let token = sessions.issue(1).await.unwrap();
        assert!(matches!(access.create(&token, card("  ")).await, Err(AccessError::Invalid(_))));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (sessions, access) = with_memory();
        let token = sessions.issue(1).await.unwrap();
        let id = access.create(&token, card("gone")).await.unwrap();
        access.delete(&token, id).await.unwrap();
        assert!(matches!(access.get(&token, id).await, Err(AccessError::NotFound(_))));
    }

    #[tokio::test]
    async fn create_stamps_owner_from_session() {
        let mut repo = MockSecretRepository::new();
        repo.expect_create_secret()
            .withf(|owner, secret| *owner == 77 && secret.name == "mine")
            .times(1)
            .returning(|_, _| Ok(10));
        let (sessions, access) = with_mock(repo);
        let token = sessions.issue(77).await.unwrap();

        assert_eq!(access.create(&token, card("mine")).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn forbidden_update_never_reaches_repository() {
        let mut repo = MockSecretRepository::new();
        repo.expect_get_secret().returning(|id| {
            Ok(Secret {
                id,
                owner: 1,
                name: "theirs".into(),
                kind: SecretKind::Text,
                payload: Vec::new(),
                meta: Vec::new(),
            })
        });
        repo.expect_update_secret().never();
        repo.expect_delete_secret().never();
        let (sessions, access) = with_mock(repo);
        let token = sessions.issue(2).await.unwrap();

        let update = SecretUpdate {
            kind: SecretKind::Text,
            payload: Vec::new(),
            meta: Vec::new(),
        };
        assert!(matches!(access.update(&token, 5, update).await, Err(AccessError::Forbidden(5))));
        assert!(matches!(access.delete(&token, 5).await, Err(AccessError::Forbidden(5))));
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_repository_error() {
        let mut repo = MockSecretRepository::new();
        repo.expect_list_secrets()
            .returning(|_, _| Err(RepositoryError::Backend("timeout".into())));
        let (sessions, access) = with_mock(repo);
        let token = sessions.issue(1).await.unwrap();

        let err = access.list(&token, None).await.unwrap_err();
        assert!(err.is_internal());
        assert!(matches!(err, AccessError::Repository(RepositoryError::Backend(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_cannot_read() {
        let sessions = SessionStore::new(Duration::from_secs(10));
        let access = SecretAccess::new(sessions.clone(), Arc::new(MemoryRepository::new()));
        let token = sessions.issue(1).await.unwrap();
        let id = access.create(&token, card("x")).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(matches!(access.get(&token, id).await, Err(AccessError::Unauthorized)));
    }
}
