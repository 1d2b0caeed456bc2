//! Per-tab session context.
//!
//! Replaces the ambient "current username" global of conventional web
//! clients with an explicit value owned by the controller: one context per
//! tab, holding the tab id and the tab's [`AuthState`]. The context is never
//! shared between tabs, so two tabs can hold different identities over the
//! same credential store without bleeding into each other.

use tokio::sync::RwLock;

use hrdesk_entity::{AuthState, Credential, Identity};
use hrdesk_store::TabId;

/// One tab's identity marker and auth state.
#[derive(Debug)]
pub struct SessionContext {
    tab_id: TabId,
    state: RwLock<AuthState>,
}

impl SessionContext {
    /// Create a signed-out context with a fresh tab id.
    pub fn new() -> Self {
        Self {
            tab_id: TabId::new(),
            state: RwLock::new(AuthState::SignedOut),
        }
    }

    /// This tab's id.
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// Replace the current state.
    pub async fn set_state(&self, state: AuthState) {
        *self.state.write().await = state;
    }

    /// The current identity, if a session is established.
    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity().cloned()
    }

    /// The current credential, if a session is established.
    pub async fn credential(&self) -> Option<Credential> {
        self.state.read().await.credential().cloned()
    }

    /// Transition into `Refreshing` and return the session being refreshed.
    ///
    /// Returns `None` when no session is established (signed out, revoked,
    /// or expired in the meantime), in which case the caller must not issue
    /// a refresh call.
    pub async fn begin_refreshing(&self) -> Option<(Identity, Credential)> {
        let mut state = self.state.write().await;
        match &*state {
            AuthState::Active {
                identity,
                credential,
            }
            | AuthState::Refreshing {
                identity,
                credential,
            } => {
                let snapshot = (identity.clone(), credential.clone());
                *state = AuthState::Refreshing {
                    identity: snapshot.0.clone(),
                    credential: snapshot.1.clone(),
                };
                Some(snapshot)
            }
            _ => None,
        }
    }

    /// Install a renewed credential, but only if the session is still in
    /// `Refreshing`. A logout or revocation that landed mid-refresh wins:
    /// the stale result is discarded and `false` is returned.
    pub async fn install_refreshed(&self, credential: Credential) -> bool {
        let mut state = self.state.write().await;
        match &*state {
            AuthState::Refreshing { identity, .. } => {
                *state = AuthState::Active {
                    identity: identity.clone(),
                    credential,
                };
                true
            }
            _ => false,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
