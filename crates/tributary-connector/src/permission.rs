//! Access-control entries reported by external systems.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of principal a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// A single user account.
    User,
    /// A group of users.
    Group,
    /// Anyone holding a share link.
    AnyoneWithLink,
    /// Everyone in the organization.
    Organization,
}

impl PrincipalKind {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Group => "group",
            PrincipalKind::AnyoneWithLink => "anyone_with_link",
            PrincipalKind::Organization => "organization",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PrincipalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(PrincipalKind::User),
            "group" => Ok(PrincipalKind::Group),
            "anyone_with_link" => Ok(PrincipalKind::AnyoneWithLink),
            "organization" => Ok(PrincipalKind::Organization),
            _ => Err(format!("Unknown principal kind: {s}")),
        }
    }
}

/// Access level granted to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Full control, including sharing.
    Owner,
    /// Can modify content.
    Write,
    /// Read-only access.
    Read,
}

impl PermissionLevel {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Owner => "owner",
            PermissionLevel::Write => "write",
            PermissionLevel::Read => "read",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(PermissionLevel::Owner),
            "write" => Ok(PermissionLevel::Write),
            "read" => Ok(PermissionLevel::Read),
            _ => Err(format!("Unknown permission level: {s}")),
        }
    }
}

/// One access-control entry on an item.
///
/// A record's permission set is unordered; two sets are equal when they
/// contain the same `(principal_id, principal_kind, level)` tuples,
/// regardless of listing order or duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Identifier of the principal in the external system.
    pub principal_id: String,
    /// Kind of principal.
    pub principal_kind: PrincipalKind,
    /// Granted access level.
    pub level: PermissionLevel,
}

impl Permission {
    /// Create a new permission entry.
    pub fn new(
        principal_id: impl Into<String>,
        principal_kind: PrincipalKind,
        level: PermissionLevel,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            principal_kind,
            level,
        }
    }

    /// Owner-level permission for a user; the fail-open fallback entry.
    pub fn owner(principal_id: impl Into<String>) -> Self {
        Self::new(principal_id, PrincipalKind::User, PermissionLevel::Owner)
    }
}
