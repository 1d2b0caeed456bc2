//! The persisted per-username record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrdesk_entity::{Credential, Identity};

/// One identity's stored session: credential fields plus the cached
/// identity, laid out with the client's historical storage field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Access token.
    pub token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// The identity this record belongs to.
    pub user: Identity,
    /// Access token expiry.
    pub token_expiry: DateTime<Utc>,
    /// Server-side session id.
    pub session_id: Uuid,
}

impl StoredCredential {
    /// Build a record from an identity and its credential.
    pub fn new(identity: Identity, credential: Credential) -> Self {
        Self {
            token: credential.access_token,
            refresh_token: credential.refresh_token,
            user: identity,
            token_expiry: credential.expires_at,
            session_id: credential.session_id,
        }
    }

    /// The stored identity.
    pub fn identity(&self) -> &Identity {
        &self.user
    }

    /// Reassemble the credential value.
    pub fn credential(&self) -> Credential {
        Credential {
            access_token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.token_expiry,
            session_id: self.session_id,
        }
    }
}
