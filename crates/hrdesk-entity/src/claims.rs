//! Access token claims and the client-side (unverified) decode.
//!
//! The client never holds the server's signing secret, so claims are read
//! without signature verification, exactly like the browser client peeking
//! at a JWT payload. They are used for two things only: deriving the token
//! expiry, and cross-checking that the token actually belongs to the
//! identity and session the server announced. Authorization decisions stay
//! server-side.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrdesk_core::{AppError, AppResult};

use crate::identity::Identity;
use crate::role::Role;

/// Claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — the username.
    pub sub: String,
    /// Role at the time of token issuance.
    pub role: Role,
    /// Session this token belongs to.
    pub session_id: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    /// Decode a token's claims without verifying its signature.
    ///
    /// Expiry is not enforced here either: callers need to read the claims
    /// of already-expired tokens (e.g. to detect whose token it was).
    pub fn decode_unverified(token: &str) -> AppResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| {
                AppError::with_source(
                    hrdesk_core::ErrorKind::Session,
                    format!("Malformed access token: {e}"),
                    e,
                )
            })?;

        Ok(data.claims)
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Cross-check the claims against the identity and session id the
    /// server announced alongside the token. A mismatch means the cached
    /// session state and the credential disagree, which is fatal.
    pub fn verify_matches(&self, identity: &Identity, session_id: Uuid) -> AppResult<()> {
        if self.sub != identity.username {
            return Err(AppError::session(format!(
                "Access token subject '{}' does not match username '{}'",
                self.sub, identity.username
            )));
        }
        if self.role != identity.role {
            return Err(AppError::session(format!(
                "Access token role '{}' does not match identity role '{}'",
                self.role, identity.role
            )));
        }
        if self.session_id != session_id {
            return Err(AppError::session(
                "Access token session id does not match the issued session",
            ));
        }
        Ok(())
    }
}
