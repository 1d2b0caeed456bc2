//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use hrdesk_entity::Role;

/// A feature-level permission gating what a signed-in user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Employee self-service
    /// View one's own attendance records.
    ViewOwnAttendance,
    /// Submit a leave request.
    SubmitLeaveRequest,
    /// Upload personal documents.
    UploadDocuments,
    /// View one's own payroll.
    ViewOwnPayroll,
    /// Submit a free-form request to HR.
    SubmitCustomRequest,

    // HR operations
    /// View attendance across the company.
    ViewAllAttendance,
    /// Approve or reject leave requests.
    ApproveLeaveRequests,
    /// Browse all employee profiles.
    ViewAllEmployees,
    /// Maintain the holiday calendar.
    ManageHolidays,
    /// View HR reports.
    ViewReports,
    /// Approve uploaded documents.
    ApproveDocuments,

    // Administration
    /// Create and deactivate accounts.
    ManageUsers,
    /// Search the audit log.
    ViewAuditLogs,
    /// Change system settings.
    SystemSettings,
    /// Run and adjust payroll.
    ManagePayroll,
    /// Export company data.
    DataExport,
    /// Manage role assignments.
    UserManagement,
}

/// Defines the mapping from each role to its set of allowed permissions.
///
/// The director role holds the union of every other role's set, so it
/// passes any check a lesser role would. No other role inherits: HR staff
/// do not get employee self-service permissions and vice versa.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    /// Role → set of permissions.
    policies: HashMap<Role, HashSet<Permission>>,
}

impl PermissionTable {
    /// Creates the default permission table.
    pub fn new() -> Self {
        let mut policies = HashMap::new();

        let employee: HashSet<Permission> = [
            Permission::ViewOwnAttendance,
            Permission::SubmitLeaveRequest,
            Permission::UploadDocuments,
            Permission::ViewOwnPayroll,
            Permission::SubmitCustomRequest,
        ]
        .into_iter()
        .collect();

        let hr: HashSet<Permission> = [
            Permission::ViewAllAttendance,
            Permission::ApproveLeaveRequests,
            Permission::ViewAllEmployees,
            Permission::ManageHolidays,
            Permission::ViewReports,
            Permission::ApproveDocuments,
        ]
        .into_iter()
        .collect();

        let admin: HashSet<Permission> = [
            Permission::ManageUsers,
            Permission::ViewAuditLogs,
            Permission::SystemSettings,
            Permission::ManagePayroll,
            Permission::DataExport,
            Permission::UserManagement,
        ]
        .into_iter()
        .collect();

        let director: HashSet<Permission> = employee
            .iter()
            .chain(hr.iter())
            .chain(admin.iter())
            .copied()
            .collect();

        policies.insert(Role::Employee, employee);
        policies.insert(Role::Hr, hr);
        policies.insert(Role::Admin, admin);
        policies.insert(Role::Md, director);

        Self { policies }
    }

    /// Returns the set of permissions for the given role.
    pub fn permissions_for_role(&self, role: Role) -> HashSet<Permission> {
        self.policies.get(&role).cloned().unwrap_or_default()
    }

    /// Checks whether the given role has the specified permission.
    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.policies
            .get(&role)
            .map(|perms| perms.contains(&permission))
            .unwrap_or(false)
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::new()
    }
}
