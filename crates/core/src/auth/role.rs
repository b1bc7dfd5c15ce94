//! Application roles as carried in the identity provider's `role` claim.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A role the application recognizes.
///
/// Role names are matched exactly as the identity provider issues them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Full access, including positions and salary ranges.
    #[serde(rename = "HRAdmin")]
    HrAdmin,
    /// Manages employees and departments.
    Manager,
    /// Read-only access.
    Employee,
}

impl Role {
    /// Claim value for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HrAdmin => "HRAdmin",
            Self::Manager => "Manager",
            Self::Employee => "Employee",
        }
    }

    /// Look up a role by its claim value. Unknown names yield `None`.
    #[must_use]
    pub fn from_claim(value: &str) -> Option<Self> {
        match value {
            "HRAdmin" => Some(Self::HrAdmin),
            "Manager" => Some(Self::Manager),
            "Employee" => Some(Self::Employee),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw `role` claim: identity providers emit a bare string for a single
/// role and an array for several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(String),
    Many(Vec<String>),
}

impl RoleClaim {
    /// The claim normalized to a list of role names, in issue order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}
