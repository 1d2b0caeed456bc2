//! Session lifecycle management for HRDesk clients.
//!
//! The moving parts, leaves first:
//!
//! - [`context::SessionContext`] — one tab's identity and auth state.
//! - [`authenticator::RequestAuthenticator`] — resolves the credential to
//!   attach to an outgoing call (live state first, store scan when cold).
//! - [`refresh::RefreshCoordinator`] — collapses concurrent refresh triggers
//!   into one network call and replays queued requests afterward.
//! - [`watcher`] — revocation detection: the one-shot guard plus the
//!   cross-tab overwrite watcher.
//! - [`heartbeat::HeartbeatMonitor`] — periodic session validation for
//!   single-session roles.
//! - [`controller::SessionController`] — the orchestrating state machine and
//!   the only writer of the credential store.
//! - [`rbac`] — pure role/permission gating and per-role landing routes.

pub mod authenticator;
pub mod context;
pub mod controller;
pub mod heartbeat;
pub mod rbac;
pub mod refresh;
pub mod watcher;

pub use controller::{LoginOutcome, SessionController};
pub use rbac::{AccessRequest, Permission, PermissionTable, RbacGate};
