//! File-backed credential store.
//!
//! Persists all entries as a single JSON document so credentials survive a
//! process restart. Access is serialized through a mutex; the whole document
//! is rewritten on every mutation, which is fine at the scale of a handful
//! of signed-in identities per machine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use hrdesk_core::{AppError, AppResult, ErrorKind};

use crate::{
    CHANGE_CHANNEL_CAPACITY, ChangeKind, CredentialStore, StoreChange, StoredCredential, TabId,
};

/// Credential store persisted to a JSON file on disk.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, StoredCredential>>,
    changes: broadcast::Sender<StoreChange>,
}

impl FileCredentialStore {
    /// Open a store at the given path, creating parent directories as
    /// needed. A missing file starts empty; an unreadable one is logged
    /// and treated as empty rather than blocking sign-in.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create store directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let entries = Self::load_entries(&path).await;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            changes,
        })
    }

    async fn load_entries(path: &Path) -> HashMap<String, StoredCredential> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read credential file, starting empty");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt credential file, starting empty");
                HashMap::new()
            }
        }
    }

    /// Rewrite the document. Tokens go to disk, so the file is owner-only.
    async fn persist(&self, entries: &HashMap<String, StoredCredential>) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write credential file: {}", self.path.display()),
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!(
                            "Failed to restrict credential file permissions: {}",
                            self.path.display()
                        ),
                        e,
                    )
                })?;
        }

        Ok(())
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

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn put(
        &self,
        username: &str,
        record: &StoredCredential,
        origin: TabId,
    ) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(username.to_string(), record.clone());
        self.persist(&entries).await?;
        drop(entries);
        self.notify(username, origin, ChangeKind::Updated);
        Ok(())
    }

    async fn get(&self, username: &str) -> AppResult<Option<StoredCredential>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(username).cloned())
    }

    async fn remove(&self, username: &str, origin: TabId) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(username).is_some() {
            self.persist(&entries).await?;
            drop(entries);
            self.notify(username, origin, ChangeKind::Removed);
        }
        Ok(())
    }

    async fn list_usernames(&self) -> AppResult<Vec<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.keys().cloned().collect())
    }

    fn watch(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
