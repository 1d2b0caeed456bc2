//! Session-related event payloads.
//!
//! Events carry plain strings and ids rather than entity types so this
//! crate stays free of internal dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to the local session lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A login completed and a session was established.
    LoggedIn {
        /// The authenticated username.
        username: String,
        /// The role string of the authenticated identity.
        role: String,
        /// The server-issued session ID.
        session_id: Uuid,
    },
    /// The user signed out locally.
    LoggedOut {
        /// The username whose session ended.
        username: String,
    },
    /// The access token was renewed by the refresh coordinator.
    TokenRefreshed {
        /// The username whose token was renewed.
        username: String,
        /// The new expiry timestamp.
        expires_at: DateTime<Utc>,
    },
    /// The session was revoked. Consumed by the UI to lock the screen
    /// immediately, independent of the scheduled redirect.
    SessionRevoked {
        /// The username whose session was revoked.
        username: String,
        /// Which signal triggered the revocation.
        reason: RevocationReason,
    },
    /// The session ended because credentials could not be renewed.
    SessionExpired {
        /// The username whose session expired.
        username: String,
    },
    /// A redirect to the given route should be performed.
    RedirectScheduled {
        /// Target route, typically the sign-in surface.
        route: String,
    },
}

/// Which of the two independent revocation triggers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// A failed response carried the explicit revoked flag.
    ServerSignal,
    /// Another tab overwrote this identity's stored credential.
    PeerTabOverwrite,
}

impl std::fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevocationReason::ServerSignal => write!(f, "server_signal"),
            RevocationReason::PeerTabOverwrite => write!(f, "peer_tab_overwrite"),
        }
    }
}
