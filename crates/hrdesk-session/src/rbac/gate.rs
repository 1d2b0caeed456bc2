//! Route guarding: decides whether the current identity may enter a view.

use hrdesk_entity::Role;

use super::policies::{Permission, PermissionTable};

/// Route unauthenticated and rejected users are sent to.
pub const LOGIN_ROUTE: &str = "/login";

/// The requirements a protected view declares.
///
/// Both constraints are optional; when both are present they must each
/// pass. An empty request only requires being signed in.
#[derive(Debug, Clone, Default)]
pub struct AccessRequest {
    /// Roles allowed through, or None for any role.
    pub allowed_roles: Option<Vec<Role>>,
    /// Permission the role must hold, or None for no permission check.
    pub required_permission: Option<Permission>,
}

impl AccessRequest {
    /// A request with no constraints beyond being signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// A request restricting entry to the given roles.
    pub fn roles(allowed: impl Into<Vec<Role>>) -> Self {
        Self {
            allowed_roles: Some(allowed.into()),
            required_permission: None,
        }
    }

    /// A request requiring a single permission.
    pub fn permission(required: Permission) -> Self {
        Self {
            allowed_roles: None,
            required_permission: Some(required),
        }
    }

    /// Adds a permission requirement to an existing request.
    pub fn with_permission(mut self, required: Permission) -> Self {
        self.required_permission = Some(required);
        self
    }
}

/// Evaluates access requests against the permission table.
///
/// Deny by default: no identity means no access, and every declared
/// constraint must pass.
#[derive(Debug, Clone)]
pub struct RbacGate {
    table: PermissionTable,
}

impl RbacGate {
    /// Creates a gate over the default permission table.
    pub fn new() -> Self {
        Self {
            table: PermissionTable::new(),
        }
    }

    /// Creates a gate over a custom permission table.
    pub fn with_table(table: PermissionTable) -> Self {
        Self { table }
    }

    /// Decides whether a user with the given role may enter.
    pub fn can_access(&self, role: Option<Role>, request: &AccessRequest) -> bool {
        let Some(role) = role else {
            return false;
        };
        if let Some(allowed) = &request.allowed_roles {
            if !allowed.contains(&role) {
                return false;
            }
        }
        if let Some(required) = request.required_permission {
            if !self.table.has_permission(role, required) {
                return false;
            }
        }
        true
    }

    /// Returns the underlying permission table.
    pub fn table(&self) -> &PermissionTable {
        &self.table
    }
}

impl Default for RbacGate {
    fn default() -> Self {
        Self::new()
    }
}

/// The landing dashboard for each role after login.
pub fn default_route_for(role: Role) -> &'static str {
    match role {
        Role::Employee => "/dash/employee",
        Role::Hr => "/dash/hr",
        Role::Admin => "/dash/admin",
        Role::Md => "/dash/md",
    }
}
