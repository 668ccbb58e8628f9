//! Role-based gating for admin actions and navigation.
//!
//! Gated actions are listed but rendered inert when a predicate here is
//! false; nothing in this module hides a user row.

use crate::types::{Email, Role, User};

/// True for owners and admins.
#[must_use]
pub fn is_admin(user: &User) -> bool {
    matches!(user.role, Role::Owner | Role::Admin)
}

#[must_use]
pub fn is_owner(user: &User) -> bool {
    user.role == Role::Owner
}

/// Whether `actor` may approve or revoke `target`.
///
/// Requires an approved admin acting on a strictly lower role; admins
/// cannot touch peers or anyone above them.
#[must_use]
pub fn can_act_on(actor: &User, target: &User) -> bool {
    may_act(actor) && is_admin(actor) && actor.role.outranks(target.role)
}

/// Deleting accounts is reserved to the owner, whatever the target.
#[must_use]
pub fn can_delete(actor: &User) -> bool {
    may_act(actor) && is_owner(actor)
}

/// Recomputing every user's points is reserved to the owner.
#[must_use]
pub fn can_update_points(actor: &User) -> bool {
    may_act(actor) && is_owner(actor)
}

/// Bulk database updates need the owner and the deployment switch.
#[must_use]
pub fn can_update_database(actor: &User, enabled: bool) -> bool {
    enabled && may_act(actor) && is_owner(actor)
}

/// Restricted menus are only shown to approved admins.
#[must_use]
pub fn can_open_restricted_menu(user: Option<&User>) -> bool {
    user.is_some_and(|u| may_act(u) && is_admin(u))
}

/// Unapproved accounts may sign in but not change anything.
#[must_use]
pub const fn may_act(user: &User) -> bool {
    user.approved
}

/// What the navigation bar reports about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStatus {
    /// No user and nothing in flight.
    Anonymous,
    /// The user record is still being fetched.
    Loading,
    /// Signed in but not yet approved by an admin.
    AwaitingApproval,
    /// Signed in and approved.
    Approved(Email),
}

impl AccessStatus {
    /// Menus are disabled until a user record is known.
    #[must_use]
    pub const fn menus_enabled(&self) -> bool {
        matches!(self, Self::AwaitingApproval | Self::Approved(_))
    }

    /// Banner text for the navigation bar, if any.
    #[must_use]
    pub fn banner(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Loading => Some("Loading user data...".to_owned()),
            Self::AwaitingApproval => Some("Waiting for an Admin Approval".to_owned()),
            Self::Approved(email) => Some(email.to_string()),
        }
    }
}

/// Derive the navigation status from the known user, if any.
#[must_use]
pub fn access_status(user: Option<&User>, loading: bool) -> AccessStatus {
    match user {
        Some(user) if user.approved => AccessStatus::Approved(user.email.clone()),
        Some(_) => AccessStatus::AwaitingApproval,
        None if loading => AccessStatus::Loading,
        None => AccessStatus::Anonymous,
    }
}
