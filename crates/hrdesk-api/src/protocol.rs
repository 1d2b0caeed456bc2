//! Wire protocol types exchanged with the HRDesk backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrdesk_entity::Identity;

/// Request body for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// When true, asks the server to invalidate any other active session
    /// for this identity before issuing a new one.
    #[serde(default)]
    pub force_login: bool,
}

/// Successful response body for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub session_id: Uuid,
    pub identity: Identity,
}

/// Successful response body for `POST /token/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Error body returned by the backend on any non-success status.
///
/// All fields are optional so a body of any shape (or none at all)
/// degrades to classification on the status code alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    /// Set on a 409 when another session is already active for the identity.
    #[serde(default)]
    pub already_logged_in: bool,
    /// Set on a 401 when the session was forcibly invalidated, as opposed
    /// to an ordinary expiry.
    #[serde(default)]
    pub revoked: bool,
}

impl ApiErrorBody {
    /// The most specific human-readable detail the body carries.
    pub fn detail(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Request failed".to_string())
    }
}
