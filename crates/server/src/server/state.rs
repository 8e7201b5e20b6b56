//! Shared application state injected into every Axum handler.

use std::{sync::Arc, time::Duration};

use crate::accounts::Accounts;
use crate::secrets::{MemoryRepository, SecretAccess, SecretRepository};
use crate::session::SessionStore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-backed) so that Axum can clone the
/// state for each request.
#[derive(Clone)]
pub struct AppState {
    /// Session map; also held by `accounts` and `secrets`.
    pub sessions: SessionStore,
    /// Register / login / logout.
    pub accounts: Accounts,
    /// Owner-scoped secret operations.
    pub secrets: SecretAccess,
}

impl AppState {
    /// Wire the account and secret services over one session store and repository.
    pub fn new(sessions: SessionStore, repo: Arc<dyn SecretRepository>) -> Self {
        Self {
            accounts: Accounts::new(sessions.clone(), repo.clone()),
            secrets: SecretAccess::new(sessions.clone(), repo),
            sessions,
        }
    }
}

impl Default for AppState {
    /// In-memory repository and a one-hour session TTL, suitable for tests.
    fn default() -> Self {
        Self::new(
            SessionStore::new(Duration::from_secs(3600)),
            Arc::new(MemoryRepository::new()),
        )
    }
}
