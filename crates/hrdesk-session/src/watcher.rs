//! Revocation entry guard and cross-tab overwrite detection.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use hrdesk_store::{ChangeKind, StoreChange, TabId};

/// Ensures teardown runs once no matter how many signals report the same
/// revocation. The first caller to claim the guard performs teardown;
/// everyone after that backs off.
#[derive(Debug, Default)]
pub struct RevocationGuard {
    in_progress: AtomicBool,
}

impl RevocationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard. Returns true exactly once per armed period.
    pub fn try_claim(&self) -> bool {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Re-arm after a successful login so a later revocation can claim again.
    pub fn rearm(&self) {
        self.in_progress.store(false, Ordering::Release);
    }

    pub fn is_claimed(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// Watches the shared credential store for writes to this session's
/// username made by another tab. Such a write means a peer logged the same
/// account in (or out) elsewhere and this tab's session is dead.
#[derive(Debug, Clone)]
pub struct PeerOverwriteWatcher {
    username: String,
    tab_id: TabId,
}

impl PeerOverwriteWatcher {
    pub fn new(username: impl Into<String>, tab_id: TabId) -> Self {
        Self {
            username: username.into(),
            tab_id,
        }
    }

    /// Block until a foreign tab touches this username's record, the
    /// change feed closes, or `cancel` flips. Returns the kind of foreign
    /// change observed, or None when shutting down.
    pub async fn wait(
        &self,
        mut changes: broadcast::Receiver<StoreChange>,
        mut cancel: watch::Receiver<bool>,
    ) -> Option<ChangeKind> {
        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        debug!(username = %self.username, "Peer watcher cancelled");
                        return None;
                    }
                }
                change = changes.recv() => match change {
                    Ok(change) => {
                        if change.username != self.username || change.origin == self.tab_id {
                            continue;
                        }
                        debug!(
                            username = %self.username,
                            kind = ?change.kind,
                            "Foreign tab changed this session's credential"
                        );
                        return Some(change.kind);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Peer watcher lagged behind store changes");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
            }
        }
    }
}
