//! [`SessionStore`]: thread-safe map from opaque session tokens to user ids.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tokio::{sync::RwLock, time::Instant};

use crate::UserId;

/// Number of random bytes behind every session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Errors produced by the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The OS CSPRNG refused to produce token bytes.
    #[error("failed to generate session token: {0}")]
    TokenGeneration(#[from] rand::Error),

    /// The configured TTL pushes the expiry past what the clock can represent.
    #[error("session ttl of {0:?} overflows the clock")]
    TtlOverflow(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: UserId,
    expires_at: Instant,
}

/// Thread-safe store for active sessions.
///
/// Wraps an `Arc<RwLock<HashMap<..>>>` so that:
/// - Many concurrent read-lock holders (request handlers validating a token)
///   proceed without contention.
/// - Writers (`issue`, `revoke`, and the reaper) take the exclusive lock, so
///   an insert is never lost to a concurrent reap and a reader never sees an
///   entry half-removed.
///
/// Cloning is cheap and every clone shares the same map. Each store created
/// with [`SessionStore::new`] is independent.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a new, empty [`SessionStore`] whose sessions live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Lifetime given to every newly issued session.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session for `user_id` and return its token.
    ///
    /// Tokens are [`TOKEN_BYTES`] bytes from the OS CSPRNG, base64url-encoded
    /// without padding. Collisions are not retried; at 256 bits they are
    /// negligible.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TokenGeneration`] if the OS RNG fails and
    /// [`SessionError::TtlOverflow`] if `now + ttl` is not representable.
    pub async fn issue(&self, user_id: UserId) -> Result<String, SessionError> {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .ok_or(SessionError::TtlOverflow(self.ttl))?;

        let mut raw = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut raw)?;
        let token = URL_SAFE_NO_PAD.encode(raw);

        let session = Session { user_id, expires_at };
        self.inner.write().await.insert(token.clone(), session);
        Ok(token)
    }

    /// Resolve `token` to the user it was issued for.
    ///
    /// Returns `None` for unknown tokens and for tokens past their expiry,
    /// even if the reaper has not removed them yet.
    pub async fn validate(&self, token: &str) -> Option<UserId> {
        let sessions = self.inner.read().await;
        let session = sessions.get(token)?;
        (Instant::now() < session.expires_at).then_some(session.user_id)
    }

    /// Remove `token` immediately. Returns `false` if it was not present.
    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }

    /// Remove every session whose expiry has passed; returns how many were removed.
    pub async fn reap_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    /// Number of sessions held, including expired ones not yet reaped.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns `true` if no sessions are held.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are bearer credentials; never print them.
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
