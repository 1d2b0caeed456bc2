//! Role-based access control for client-side route and feature gating.

pub mod gate;
pub mod policies;

pub use gate::{AccessRequest, LOGIN_ROUTE, RbacGate, default_route_for};
pub use policies::{Permission, PermissionTable};
