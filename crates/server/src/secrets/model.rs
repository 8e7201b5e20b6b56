//! Stored entities: users and their encrypted secrets.

use common::protocol::SecretBody;
use common::SecretKind;

use crate::UserId;

/// Numeric secret identifier assigned by the repository.
pub type SecretId = i64;

/// A registered user.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub login: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// A secret as submitted for creation; the owner comes from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSecret {
    pub name: String,
    pub kind: SecretKind,
    pub payload: Vec<u8>,
    pub meta: Vec<u8>,
}

/// Replacement content for an existing secret. Name and owner never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretUpdate {
    pub kind: SecretKind,
    pub payload: Vec<u8>,
    pub meta: Vec<u8>,
}

/// A stored secret. `payload` and `meta` are client ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: SecretId,
    pub owner: UserId,
    pub name: String,
    pub kind: SecretKind,
    pub payload: Vec<u8>,
    pub meta: Vec<u8>,
}

impl From<Secret> for SecretBody {
    fn from(s: Secret) -> Self {
        SecretBody {
            id: s.id,
            name: s.name,
            user_id: s.owner,
            kind: s.kind,
            payload: s.payload,
            meta: s.meta,
        }
    }
}
