//! Role-derived permissions.
//!
//! Permissions are a fixed table keyed by role name. The registry is rebuilt
//! from the token's role claim every time the authentication state changes;
//! nothing here is persisted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::role::Role;

/// A UI capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    CanAdd,
    CanDelete,
    CanEdit,
    CanRead,
}

impl Permission {
    pub const ALL: [Self; 4] = [Self::CanAdd, Self::CanDelete, Self::CanEdit, Self::CanRead];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CanAdd => "canAdd",
            Self::CanDelete => "canDelete",
            Self::CanEdit => "canEdit",
            Self::CanRead => "canRead",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

/// An ordered set of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Every permission.
    #[must_use]
    pub fn all() -> Self {
        Self(Permission::ALL.into_iter().collect())
    }

    /// Only [`Permission::CanRead`].
    #[must_use]
    pub fn read_only() -> Self {
        Self(BTreeSet::from([Permission::CanRead]))
    }

    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn extend(&mut self, other: &Self) {
        self.0.extend(other.0.iter().copied());
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fixed permission table.
#[must_use]
pub fn permissions_for(role: Role) -> PermissionSet {
    match role {
        Role::HrAdmin | Role::Manager => PermissionSet::all(),
        Role::Employee => PermissionSet::read_only(),
    }
}

/// Roles registered for the current session and the permissions each grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    roles: BTreeMap<String, PermissionSet>,
}

impl RoleRegistry {
    /// Label registered when no recognized role applies.
    pub const GUEST: &'static str = "Guest";

    /// The registry for an unauthenticated session.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            roles: BTreeMap::from([(Self::GUEST.to_string(), PermissionSet::read_only())]),
        }
    }

    /// Build the registry from role claim values.
    ///
    /// Unauthenticated sessions, and authenticated ones whose claim names no
    /// recognized role, get the read-only guest entry.
    #[must_use]
    pub fn from_claims<S: AsRef<str>>(authenticated: bool, role_names: &[S]) -> Self {
        if !authenticated {
            return Self::guest();
        }

        let roles: BTreeMap<String, PermissionSet> = role_names
            .iter()
            .filter_map(|name| Role::from_claim(name.as_ref()))
            .map(|role| (role.as_str().to_string(), permissions_for(role)))
            .collect();

        if roles.is_empty() {
            Self::guest()
        } else {
            Self { roles }
        }
    }

    /// Registered role labels in sorted order.
    pub fn role_labels(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_role(&self, label: &str) -> bool {
        self.roles.contains_key(label)
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.roles.len() == 1 && self.has_role(Self::GUEST)
    }

    /// Union of the permissions of every registered role.
    #[must_use]
    pub fn effective(&self) -> PermissionSet {
        let mut all = PermissionSet::default();
        for set in self.roles.values() {
            all.extend(set);
        }
        all
    }

    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.roles.values().any(|set| set.contains(permission))
    }

    #[must_use]
    pub fn can_add(&self) -> bool {
        self.has_permission(Permission::CanAdd)
    }

    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.has_permission(Permission::CanEdit)
    }

    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.has_permission(Permission::CanDelete)
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        self.has_permission(Permission::CanRead)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::guest()
    }
}
