//! Bearer credential model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The token pair and session binding issued at login.
///
/// Refreshes replace `access_token` and `expires_at` in place; the refresh
/// token and session id are stable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Short-lived bearer token attached to authenticated requests.
    pub access_token: String,
    /// Long-lived token presented only to the refresh endpoint.
    pub refresh_token: String,
    /// When the access token stops being usable.
    pub expires_at: DateTime<Utc>,
    /// Server-side session this credential belongs to.
    pub session_id: Uuid,
}

impl Credential {
    /// Whether the access token is expired, treating it as dead
    /// `margin_seconds` before the actual deadline.
    pub fn is_expired(&self, margin_seconds: u64) -> bool {
        let margin = Duration::seconds(margin_seconds as i64);
        Utc::now() + margin >= self.expires_at
    }
}
