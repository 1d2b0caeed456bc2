//! Authenticated identity model.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The identity established by a successful login.
///
/// Immutable once a session exists; replacing it requires a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login username, also the credential store namespace.
    pub username: String,
    /// Role the server assigned at login.
    pub role: Role,
    /// Employee record identifier (string on the wire; ids may be coded).
    pub employee_id: String,
    /// Human-readable name. The server sends this as `name`.
    #[serde(alias = "name")]
    pub display_name: String,
    /// Contact email, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
