//! Authorization entities and the decision function.
//!
//! Roles are loaded from small reference tables per check; the decision
//! itself is a read-only scan with no side effects. Any ambiguity
//! (missing role, inactive role, inactive permission) denies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthzError, Result};

/// The module gating all file operations.
pub const FILE_MANAGEMENT: &str = "file_management";

/// A named functional area.
///
/// Identity (the name) is immutable once permissions reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Unique machine name, e.g. `file_management`.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Soft-delete flag.
    pub active: bool,
}

impl Module {
    /// Create an active module.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            active: true,
        }
    }
}

/// The four gated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// Stable string form, used in storage and audit records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (module, action) pair. Unique per pair within a role.
///
/// Deactivation is a soft delete: permissions are never hard-deleted
/// while a role references them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Module name the permission applies to.
    pub module: String,
    /// Gated action.
    pub action: Action,
    /// Soft-delete flag. Inactive permissions never grant access.
    pub active: bool,
}

impl Permission {
    /// Create an active permission.
    pub fn new(module: impl Into<String>, action: Action) -> Self {
        Self {
            module: module.into(),
            action,
            active: true,
        }
    }

    /// True when this permission grants (module, action).
    fn grants(&self, module: &str, action: Action) -> bool {
        self.active && self.module == module && self.action == action
    }
}

/// What a role is allowed to do.
///
/// The administrative bypass is a typed variant, not a string comparison
/// on the role name, so it cannot be spoofed by naming a role "admin".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Unconditional allow. Reserved for the system administrator role.
    All,
    /// Ordinary roles: allow iff an active permission matches.
    Grants(Vec<Permission>),
}

/// A role identifier.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub String);

impl RoleId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleId({})", self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named bundle of permissions.
///
/// Roles own permission *references*; deleting a role never cascades to
/// the permissions themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Unique machine name.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Soft-delete flag. Inactive roles deny everything.
    pub active: bool,
    /// System roles cannot be deactivated or deleted.
    pub is_system: bool,
    /// What the role can do.
    pub capability: Capability,
}

impl Role {
    /// Create an ordinary active role with the given grants.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: display_name.into(),
            active: true,
            is_system: false,
            capability: Capability::Grants(permissions),
        }
    }

    /// The built-in system administrator role: `Capability::All`,
    /// cannot be deactivated or deleted.
    pub fn system_admin(id: RoleId) -> Self {
        Self {
            id,
            name: "admin".into(),
            display_name: "Administrator".into(),
            active: true,
            is_system: true,
            capability: Capability::All,
        }
    }

    /// The decision function: may this role perform `action` on `module`?
    ///
    /// Fail closed: an inactive role denies everything. `Capability::All`
    /// allows unconditionally. Otherwise the role's permission set is
    /// scanned for an active entry matching (module, action).
    pub fn allows(&self, module: &str, action: Action) -> bool {
        if !self.active {
            return false;
        }

        match &self.capability {
            Capability::All => true,
            Capability::Grants(permissions) => {
                permissions.iter().any(|p| p.grants(module, action))
            }
        }
    }

    /// Deactivate the role (soft delete).
    ///
    /// System roles refuse deactivation.
    pub fn deactivate(&mut self) -> Result<()> {
        if self.is_system {
            return Err(AuthzError::SystemRole(self.name.clone()));
        }
        self.active = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_role() -> Role {
        Role::new(
            RoleId::new("r-reader"),
            "reader",
            "Reader",
            vec![Permission::new(FILE_MANAGEMENT, Action::Read)],
        )
    }

    #[test]
    fn test_grant_allows_matching_pair_only() {
        let role = reader_role();
        assert!(role.allows(FILE_MANAGEMENT, Action::Read));
        assert!(!role.allows(FILE_MANAGEMENT, Action::Create));
        assert!(!role.allows(FILE_MANAGEMENT, Action::Delete));
        assert!(!role.allows("user_management", Action::Read));
    }

    #[test]
    fn test_inactive_role_denies_everything() {
        let mut role = reader_role();
        role.deactivate().unwrap();
        assert!(!role.allows(FILE_MANAGEMENT, Action::Read));
    }

    #[test]
    fn test_inactive_permission_denies() {
        let mut role = reader_role();
        if let Capability::Grants(perms) = &mut role.capability {
            perms[0].active = false;
        }
        assert!(!role.allows(FILE_MANAGEMENT, Action::Read));
    }

    #[test]
    fn test_capability_all_allows_unconditionally() {
        let admin = Role::system_admin(RoleId::new("r-admin"));
        assert!(admin.allows(FILE_MANAGEMENT, Action::Create));
        assert!(admin.allows(FILE_MANAGEMENT, Action::Delete));
        assert!(admin.allows("anything_else", Action::Update));
    }

    #[test]
    fn test_admin_name_alone_grants_nothing() {
        // The bypass is the Capability::All variant, not the name.
        let impostor = Role::new(RoleId::new("r-x"), "admin", "Admin?", vec![]);
        assert!(!impostor.allows(FILE_MANAGEMENT, Action::Read));
    }

    #[test]
    fn test_system_role_refuses_deactivation() {
        let mut admin = Role::system_admin(RoleId::new("r-admin"));
        assert!(matches!(
            admin.deactivate(),
            Err(AuthzError::SystemRole(_))
        ));
        assert!(admin.active);
    }

    #[test]
    fn test_capability_serde_roundtrip() {
        let role = reader_role();
        let json = serde_json::to_string(&role.capability).unwrap();
        let back: Capability = serde_json::from_str(&json).unwrap();
        assert_eq!(role.capability, back);

        let all = serde_json::to_string(&Capability::All).unwrap();
        let back: Capability = serde_json::from_str(&all).unwrap();
        assert_eq!(back, Capability::All);
    }
}
