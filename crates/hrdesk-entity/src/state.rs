//! Per-tab authentication state.

use crate::credential::Credential;
use crate::identity::Identity;

/// The authentication state held by one tab.
///
/// Exactly one tab holds one `AuthState` value at a time; multiple tabs may
/// each hold an independent state for different identities. The queue of
/// requests waiting out a refresh is owned by the refresh coordinator, not
/// by this snapshot, so the state stays cheaply cloneable.
#[derive(Debug, Clone)]
pub enum AuthState {
    /// No session. The initial state, and the result of a normal logout.
    SignedOut,
    /// A login call is in flight.
    Authenticating,
    /// A session is established and the credential is usable.
    Active {
        /// The authenticated identity.
        identity: Identity,
        /// The current token pair.
        credential: Credential,
    },
    /// The access token is being renewed; the old credential is still the
    /// last known one.
    Refreshing {
        /// The authenticated identity.
        identity: Identity,
        /// The credential being replaced.
        credential: Credential,
    },
    /// The session was revoked. Terminal: no network call is attempted
    /// until a brand-new login.
    Revoked,
    /// Credentials could not be renewed. Terminal until a new login.
    Expired,
}

impl AuthState {
    /// The identity carried by this state, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Active { identity, .. } | Self::Refreshing { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// The credential carried by this state, if any.
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Active { credential, .. } | Self::Refreshing { credential, .. } => {
                Some(credential)
            }
            _ => None,
        }
    }

    /// Whether a session is established (active or mid-refresh).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Active { .. } | Self::Refreshing { .. })
    }

    /// Whether this is the terminal revoked state.
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Short name for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SignedOut => "signed_out",
            Self::Authenticating => "authenticating",
            Self::Active { .. } => "active",
            Self::Refreshing { .. } => "refreshing",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::SignedOut
    }
}
