//! User roles.
//!
//! Roles travel as integer codes. A lower code is a higher privilege, which
//! is what the admin gating comparisons rely on.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A role code that does not map to any known [`Role`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown role code: {0}")]
pub struct UnknownRoleError(pub i64);

/// Permission level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    /// The single highest role. May delete users and run bulk updates.
    Owner,
    /// May approve and revoke accounts of lower roles.
    Admin,
    /// Regular account.
    User,
}

impl Role {
    /// All roles, highest privilege first.
    pub const ALL: [Self; 3] = [Self::Owner, Self::Admin, Self::User];

    /// Wire code of this role.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Owner => 1,
            Self::Admin => 2,
            Self::User => 3,
        }
    }

    /// Display name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    /// Whether this role ranks strictly above `other`.
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        self.code() < other.code()
    }
}

impl TryFrom<i64> for Role {
    type Error = UnknownRoleError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|role| role.code() == code)
            .ok_or(UnknownRoleError(code))
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid role: {s}"))
    }
}

/// Reverse lookup of a raw role code to its display name.
///
/// # Errors
///
/// Returns [`UnknownRoleError`] when no role has this code.
pub fn role_to_string(code: i64) -> Result<&'static str, UnknownRoleError> {
    Role::try_from(code).map(Role::as_str)
}
