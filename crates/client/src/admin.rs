//! User administration.
//!
//! [`AdminPanel`] lists directory users for one query and applies the
//! approval, deletion and maintenance actions an actor is allowed to take.
//! Every mutation re-runs the active query so the listing reflects the
//! backend's state.

use std::fmt;

use nutribase_core::policy;
use nutribase_core::{Email, User};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, StatusPayload};
use crate::error::ApiError;

/// Errors raised by administration actions.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The actor's role does not permit the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The target user does not exist.
    #[error("Unknown user: {0}")]
    UnknownUser(Email),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Which users the panel lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserQuery {
    All,
    Approved,
    #[default]
    NotApproved,
}

impl UserQuery {
    pub const ALL: [Self; 3] = [Self::All, Self::Approved, Self::NotApproved];

    /// Heading shown above the listing.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::All => "Users",
            Self::Approved => "Approved Users",
            Self::NotApproved => "Users Waiting Approval",
        }
    }
}

impl fmt::Display for UserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Approved => "approved",
            Self::NotApproved => "pending",
        })
    }
}

impl std::str::FromStr for UserQuery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "approved" => Ok(Self::Approved),
            "pending" | "not-approved" => Ok(Self::NotApproved),
            other => Err(format!("unknown user query: {other}")),
        }
    }
}

/// Approval toggle offered for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Revoke,
}

impl ApprovalAction {
    /// The toggle that applies to a user in this approval state.
    #[must_use]
    pub const fn for_user(user: &User) -> Self {
        if user.approved {
            Self::Revoke
        } else {
            Self::Approve
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Revoke => "Revoke",
        }
    }
}

/// One listed user with the actions the actor may take on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user: User,
    pub role: &'static str,
    pub action: ApprovalAction,
    pub action_enabled: bool,
    pub deletable: bool,
}

impl UserRow {
    fn new(actor: &User, user: User) -> Self {
        Self {
            role: user.role.as_str(),
            action: ApprovalAction::for_user(&user),
            action_enabled: policy::can_act_on(actor, &user),
            deletable: policy::can_delete(actor) && actor.email != user.email,
            user,
        }
    }
}

/// User listing and administration for one actor.
#[derive(Debug)]
pub struct AdminPanel {
    api: ApiClient,
    actor: User,
    query: UserQuery,
    rows: Option<Vec<UserRow>>,
    update_db_enabled: bool,
}

impl AdminPanel {
    /// Create a panel without fetching anything.
    #[must_use]
    pub const fn new(api: ApiClient, actor: User, update_db_enabled: bool) -> Self {
        Self {
            api,
            actor,
            query: UserQuery::NotApproved,
            rows: None,
            update_db_enabled,
        }
    }

    /// Create a panel for an administrator and run `query`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` if the actor is not an approved
    /// administrator, or `AdminError::Api` if the listing fails.
    pub async fn open(
        api: ApiClient,
        actor: User,
        query: UserQuery,
        update_db_enabled: bool,
    ) -> Result<Self, AdminError> {
        if !policy::can_open_restricted_menu(Some(&actor)) {
            return Err(AdminError::Forbidden(format!(
                "{} cannot administer users",
                actor.email
            )));
        }
        let mut panel = Self::new(api, actor, update_db_enabled);
        panel.select_query(query).await?;
        Ok(panel)
    }

    #[must_use]
    pub const fn actor(&self) -> &User {
        &self.actor
    }

    #[must_use]
    pub const fn query(&self) -> UserQuery {
        self.query
    }

    /// Rows of the last completed listing; `None` while nothing was fetched.
    #[must_use]
    pub fn rows(&self) -> Option<&[UserRow]> {
        self.rows.as_deref()
    }

    /// Heading with the row count, e.g. "3 Users Waiting Approval".
    #[must_use]
    pub fn title(&self) -> String {
        let count = self.rows.as_ref().map_or(0, Vec::len);
        format!("{count} {}", self.query.title())
    }

    /// Switch to `query` and fetch its users.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the listing fails.
    pub async fn select_query(&mut self, query: UserQuery) -> Result<(), AdminError> {
        self.query = query;
        self.refresh().await
    }

    /// Re-run the active query.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the listing fails. Previous rows are
    /// kept in that case.
    #[instrument(skip(self), fields(query = %self.query))]
    pub async fn refresh(&mut self) -> Result<(), AdminError> {
        let users = match self.query {
            UserQuery::All => self.api.get_all_users().await?,
            UserQuery::Approved => self.api.get_approved_users().await?,
            UserQuery::NotApproved => self.api.get_not_approved_users().await?,
        };
        let rows: Vec<UserRow> = users
            .into_iter()
            .map(|user| UserRow::new(&self.actor, user))
            .collect();
        info!(count = rows.len(), "Users listed");
        self.rows = Some(rows);
        Ok(())
    }

    /// Approve or revoke `email`, then refresh the listing.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` unless the actor outranks the target,
    /// `AdminError::UnknownUser` if the target does not exist, or
    /// `AdminError::Api` if a backend call fails.
    #[instrument(skip(self), fields(actor = %self.actor.email, target = %email))]
    pub async fn set_approval(
        &mut self,
        email: &Email,
        action: ApprovalAction,
    ) -> Result<StatusPayload, AdminError> {
        let target = self.lookup(email).await?;
        if !policy::can_act_on(&self.actor, &target) {
            warn!(action = action.label(), "Approval change refused");
            return Err(AdminError::Forbidden(format!(
                "{} cannot {} {}",
                self.actor.email,
                action.label().to_lowercase(),
                target.email
            )));
        }

        let payload = match action {
            ApprovalAction::Approve => self.api.approve_user(&target.email).await?,
            ApprovalAction::Revoke => self.api.revoke_user(&target.email).await?,
        };
        info!(action = action.label(), "Approval changed");
        self.refresh().await?;
        Ok(payload)
    }

    /// Apply whichever approval toggle fits the target's current state.
    ///
    /// # Errors
    ///
    /// Same as [`AdminPanel::set_approval`].
    pub async fn toggle_approval(&mut self, email: &Email) -> Result<StatusPayload, AdminError> {
        let target = self.lookup(email).await?;
        self.set_approval(&target.email, ApprovalAction::for_user(&target))
            .await
    }

    /// Delete `email` from the directory, then refresh the listing.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` unless the actor is the owner, or
    /// `AdminError::Api` if a backend call fails.
    #[instrument(skip(self), fields(actor = %self.actor.email, target = %email))]
    pub async fn delete_user(&mut self, email: &Email) -> Result<(), AdminError> {
        if !policy::can_delete(&self.actor) {
            warn!("Deletion refused");
            return Err(AdminError::Forbidden(format!(
                "{} cannot delete users",
                self.actor.email
            )));
        }
        if &self.actor.email == email {
            return Err(AdminError::Forbidden("cannot delete yourself".to_owned()));
        }

        match self.api.delete_user(email).await {
            Ok(()) => {}
            Err(ApiError::NotFound(_)) => return Err(AdminError::UnknownUser(email.clone())),
            Err(e) => return Err(e.into()),
        }
        info!("User deleted");
        self.refresh().await
    }

    #[must_use]
    pub fn can_update_points(&self) -> bool {
        policy::can_update_points(&self.actor)
    }

    #[must_use]
    pub fn can_update_database(&self) -> bool {
        policy::can_update_database(&self.actor, self.update_db_enabled)
    }

    /// Recompute every user's points.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` unless the actor is the owner, or
    /// `AdminError::Api` if the call fails.
    #[instrument(skip(self), fields(actor = %self.actor.email))]
    pub async fn update_points(&self) -> Result<StatusPayload, AdminError> {
        if !self.can_update_points() {
            return Err(AdminError::Forbidden(format!(
                "{} cannot update points",
                self.actor.email
            )));
        }
        let payload = self.api.update_all_users_points().await?;
        info!("Points updated");
        Ok(payload)
    }

    /// Run the backend database update.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` unless the actor is the owner and the
    /// operation is enabled, or `AdminError::Api` if the call fails.
    #[instrument(skip(self), fields(actor = %self.actor.email))]
    pub async fn update_database(&self) -> Result<StatusPayload, AdminError> {
        if !self.can_update_database() {
            return Err(AdminError::Forbidden(if self.update_db_enabled {
                format!("{} cannot update the database", self.actor.email)
            } else {
                "database update is disabled".to_owned()
            }));
        }
        let payload = self.api.update_db().await?;
        info!("Database updated");
        Ok(payload)
    }

    /// Fetch the target fresh; listed rows may be out of date.
    async fn lookup(&self, email: &Email) -> Result<User, AdminError> {
        match self.api.get_user(email).await {
            Ok(user) => Ok(user),
            Err(ApiError::NotFound(_)) => Err(AdminError::UnknownUser(email.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
