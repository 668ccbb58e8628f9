//! User records from the user directory.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::role::Role;

/// A user account as stored by the backend.
///
/// `approved` is owned by the backend and only changes through the admin
/// approve/revoke calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identity.
    pub email: Email,
    /// Permission level.
    pub role: Role,
    /// Whether an admin has approved the account.
    #[serde(default)]
    pub approved: bool,
}

impl User {
    #[must_use]
    pub const fn new(email: Email, role: Role, approved: bool) -> Self {
        Self {
            email,
            role,
            approved,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{"email":"Mo@Farm.org","role":3,"approved":false,"points":12}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.email.as_str(), "mo@farm.org");
        assert_eq!(user.role, Role::User);
        assert!(!user.approved);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let json = r#"{"email":"mo@farm.org","role":9,"approved":true}"#;
        assert!(serde_json::from_str::<User>(json).is_err());
    }
}
