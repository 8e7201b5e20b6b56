//! Session issue, validation, expiry, and background reaping.
//!
//! # Lifecycle
//!
//! 1. A successful register or login calls [`SessionStore::issue`], which
//!    records `{user_id, now + ttl}` under a fresh random token.
//! 2. Every authenticated request resolves its token with
//!    [`SessionStore::validate`] (shared lock).
//! 3. [`reaper_task`] wakes on a fixed interval and drops every expired
//!    entry (exclusive lock). It stops when its [`CancellationToken`] fires.
//! 4. [`SessionStore::revoke`] drops a session on logout.
//!
//! Sessions live only in process memory; a restart invalidates all of them.
//!
//! # Security invariants
//!
//! - Tokens are never logged, traced, or printed via `Debug`.
//! - An expired token is rejected on validation even before the reaper has
//!   removed it.

pub mod store;

pub use store::{SessionError, SessionStore};

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawn the background task that periodically removes expired sessions.
///
/// The first pass runs one full `interval` after spawning. Cancellation is
/// only observed between passes, so a pass in progress always finishes and
/// releases the write lock before the task exits.
pub fn reaper_task(
    store: SessionStore,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; nothing can have expired yet.
        ticker.tick().await;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("session reaper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let removed = store.reap_expired().await;
                    if removed > 0 {
                        debug!(removed, "expired sessions reaped");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reaper_removes_expired_sessions() {
        let store = SessionStore::new(Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let handle = reaper_task(store.clone(), Duration::from_secs(10), cancel.clone());

        let token = store.issue(1).await.unwrap();
        assert_eq!(store.len().await, 1);

        // TTL plus one reap interval of slack.
        time::sleep(Duration::from_secs(41)).await;
        assert_eq!(store.validate(&token).await, None);
        assert!(store.is_empty().await);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_keeps_live_sessions() {
        let store = SessionStore::new(Duration::from_secs(300));
        let cancel = CancellationToken::new();
        let handle = reaper_task(store.clone(), Duration::from_secs(10), cancel.clone());

        let token = store.issue(9).await.unwrap();
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.validate(&token).await, Some(9));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn reaper_stops_promptly_on_cancel() {
        let store = SessionStore::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        // An interval far longer than the test timeout below.
        let handle = reaper_task(store, Duration::from_secs(3600), cancel.clone());

        cancel.cancel();
        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("reaper did not stop after cancellation")
            .unwrap();
    }
}
