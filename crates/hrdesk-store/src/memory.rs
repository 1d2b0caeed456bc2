//! Shared in-memory credential store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use hrdesk_core::AppResult;

use crate::{
    CHANGE_CHANNEL_CAPACITY, ChangeKind, CredentialStore, StoreChange, StoredCredential, TabId,
};

/// In-memory store backend. Clones share the same map and change channel,
/// so handing one clone per tab simulates a shared browser profile.
#[derive(Debug, Clone)]
pub struct MemoryCredentialStore {
    entries: Arc<DashMap<String, StoredCredential>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(DashMap::new()),
            changes,
        }
    }

    fn notify(&self, username: &str, origin: TabId, kind: ChangeKind) {
        let change = StoreChange {
            username: username.to_string(),
            origin,
            kind,
        };
        if self.changes.send(change).is_err() {
            debug!(username, "store change dropped: no watchers");
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn put(
        &self,
        username: &str,
        record: &StoredCredential,
        origin: TabId,
    ) -> AppResult<()> {
        self.entries.insert(username.to_string(), record.clone());
        self.notify(username, origin, ChangeKind::Updated);
        Ok(())
    }

    async fn get(&self, username: &str) -> AppResult<Option<StoredCredential>> {
        Ok(self.entries.get(username).map(|e| e.value().clone()))
    }

    async fn remove(&self, username: &str, origin: TabId) -> AppResult<()> {
        if self.entries.remove(username).is_some() {
            self.notify(username, origin, ChangeKind::Removed);
        }
        Ok(())
    }

    async fn list_usernames(&self) -> AppResult<Vec<String>> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }

    fn watch(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
