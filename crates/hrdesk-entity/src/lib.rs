//! # hrdesk-entity
//!
//! Domain entity models for HRDesk: roles, identities, credentials, access
//! token claims, and the per-tab authentication state.

pub mod claims;
pub mod credential;
pub mod identity;
pub mod role;
pub mod state;

pub use claims::TokenClaims;
pub use credential::Credential;
pub use identity::Identity;
pub use role::Role;
pub use state::AuthState;
