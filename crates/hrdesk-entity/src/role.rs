//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the HR system.
///
/// Roles are ordered by privilege level: MD > Admin > HR > Employee.
/// HR, Admin, and MD are limited to a single active session at a time;
/// Employee identities may hold concurrent sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Regular employee: self-service access only.
    Employee,
    /// Human-resources staff: company-wide HR operations.
    #[serde(rename = "HR")]
    Hr,
    /// System administrator: user and system management.
    Admin,
    /// Managing director: superset of every permission.
    #[serde(rename = "MD")]
    Md,
}

impl Role {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Md => 4,
            Self::Admin => 3,
            Self::Hr => 2,
            Self::Employee => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &Role) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Whether the server enforces a single active session for this role.
    pub fn requires_single_session(&self) -> bool {
        !matches!(self, Self::Employee)
    }

    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "Employee",
            Self::Hr => "HR",
            Self::Admin => "Admin",
            Self::Md => "MD",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = hrdesk_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "hr" => Ok(Self::Hr),
            "admin" => Ok(Self::Admin),
            "md" => Ok(Self::Md),
            _ => Err(hrdesk_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: Employee, HR, Admin, MD"
            ))),
        }
    }
}
