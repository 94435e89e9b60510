//! Roles carried by resolved identities.
//!
//! Roles arrive as free-form strings inside identity-provider claims. The
//! four roles the hotel platform knows about get their own variants; any
//! other value is preserved verbatim so it can still be logged and matched
//! against configured role sets.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A platform role.
///
/// Matching is case-sensitive: `"Admin"` is not `"admin"`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Hotel management.
    Manager,
    /// Front-desk staff.
    Receptionist,
    /// The lowest-privilege role; the default when a token carries none.
    Guest,
    /// Any role name the platform does not define.
    Other(String),
}

impl Role {
    /// The role assigned when a verified credential carries no role claim.
    pub const DEFAULT: Self = Self::Guest;

    /// Return the role's claim value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Receptionist => "receptionist",
            Self::Guest => "guest",
            Self::Other(name) => name,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Self::Admin,
            "manager" => Self::Manager,
            "receptionist" => Self::Receptionist,
            "guest" => Self::Guest,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({})", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
