//! Session lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Heartbeat poll interval in milliseconds (privileged roles only).
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// Seconds before `expires_at` at which a token is already treated as
    /// expired, so a request refreshes up front instead of round-tripping a
    /// guaranteed rejection.
    #[serde(default = "default_expiry_margin")]
    pub expiry_margin_seconds: u64,
    /// Route the application is redirected to after sign-out or revocation.
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval(),
            expiry_margin_seconds: default_expiry_margin(),
            login_route: default_login_route(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    15_000
}

fn default_expiry_margin() -> u64 {
    30
}

fn default_login_route() -> String {
    "/login".to_string()
}
