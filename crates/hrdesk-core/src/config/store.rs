//! Credential store configuration.

use serde::{Deserialize, Serialize};

/// Credential store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which store backend to use.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Path of the credential file for the `file` backend.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
        }
    }
}

/// Available credential store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local shared map. Credentials are lost on exit.
    Memory,
    /// JSON file with owner-only permissions. Credentials survive restarts.
    File,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::File
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::File => write!(f, "file"),
        }
    }
}

fn default_path() -> String {
    "data/credentials.json".to_string()
}
