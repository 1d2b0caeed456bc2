//! Credential resolution for outgoing calls.

use std::sync::Arc;

use tracing::warn;

use hrdesk_entity::{Credential, Identity};
use hrdesk_store::CredentialStore;

use crate::context::SessionContext;

/// The credential chosen for one outgoing call.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    /// The identity the credential belongs to.
    pub identity: Identity,
    /// The token pair to present.
    pub credential: Credential,
    /// True when the credential came from a store scan rather than live
    /// session state. Cold credentials are used as-is; the refresh
    /// machinery only operates on the live session.
    pub cold: bool,
}

/// Resolves the credential to attach to every outgoing call except login
/// and refresh, which must never be self-authenticated with a stale token.
///
/// Pure read: resolution never mutates session state or the store. When
/// nothing is found anywhere the call proceeds unauthenticated and the
/// server rejects it.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    context: Arc<SessionContext>,
    store: Arc<dyn CredentialStore>,
}

impl RequestAuthenticator {
    /// Create an authenticator over the given tab context and shared store.
    pub fn new(context: Arc<SessionContext>, store: Arc<dyn CredentialStore>) -> Self {
        Self { context, store }
    }

    /// Resolve the active credential: live session state first, falling
    /// back to scanning the store when memory is cold. A revoked tab never
    /// presents a credential.
    pub async fn resolve(&self) -> Option<ResolvedCredential> {
        let state = self.context.state().await;
        if state.is_revoked() {
            return None;
        }
        if let (Some(identity), Some(credential)) = (state.identity(), state.credential()) {
            return Some(ResolvedCredential {
                identity: identity.clone(),
                credential: credential.clone(),
                cold: false,
            });
        }
        self.scan_store().await
    }

    /// Adopt the freshest resident record for this call. Multiple identities
    /// may coexist in the store; the one expiring last is the most likely
    /// to still be alive.
    async fn scan_store(&self) -> Option<ResolvedCredential> {
        let usernames = match self.store.list_usernames().await {
            Ok(usernames) => usernames,
            Err(e) => {
                warn!(error = %e, "Credential store scan failed");
                return None;
            }
        };

        let mut freshest: Option<ResolvedCredential> = None;
        for username in usernames {
            let record = match self.store.get(&username).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(username, error = %e, "Failed to read stored credential");
                    continue;
                }
            };
            let replace = freshest
                .as_ref()
                .map(|current| record.token_expiry > current.credential.expires_at)
                .unwrap_or(true);
            if replace {
                freshest = Some(ResolvedCredential {
                    identity: record.user.clone(),
                    credential: record.credential(),
                    cold: true,
                });
            }
        }
        freshest
    }
}
