//! # hrdesk-store
//!
//! Durable, per-identity credential persistence shared by all tabs of one
//! profile. Entries are namespaced by username so multiple identities can
//! coexist; every mutation broadcasts a [`StoreChange`] tagged with the
//! writing tab, which is how a tab tells its own writes apart from a peer
//! tab overwriting its identity (browser storage events never fire in the
//! writer tab; the origin tag reproduces that rule explicitly).

pub mod entry;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use hrdesk_core::AppResult;

pub use entry::StoredCredential;
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Capacity of the change notification channel per store.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Identifies one tab (one execution context holding one auth state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    /// Allocate a fresh tab id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The entry was created or overwritten.
    Updated,
    /// The entry was removed.
    Removed,
}

/// Notification broadcast on every store mutation.
#[derive(Debug, Clone)]
pub struct StoreChange {
    /// The username whose entry changed.
    pub username: String,
    /// The tab that performed the write.
    pub origin: TabId,
    /// Whether the entry was written or removed.
    pub kind: ChangeKind,
}

/// Credential persistence shared across tabs.
///
/// No implicit TTL: expiry is application-level and checked by readers.
/// Writes are single-key replace-or-delete with no partial states.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Create or overwrite the entry for `username`.
    async fn put(&self, username: &str, record: &StoredCredential, origin: TabId)
    -> AppResult<()>;

    /// Fetch the entry for `username`, if present.
    async fn get(&self, username: &str) -> AppResult<Option<StoredCredential>>;

    /// Remove the entry for `username`. Removing an absent entry is a no-op
    /// and emits no notification.
    async fn remove(&self, username: &str, origin: TabId) -> AppResult<()>;

    /// All usernames currently holding an entry.
    async fn list_usernames(&self) -> AppResult<Vec<String>>;

    /// Subscribe to mutation notifications.
    fn watch(&self) -> broadcast::Receiver<StoreChange>;
}
