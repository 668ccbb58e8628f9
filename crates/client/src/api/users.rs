//! User directory endpoints.

use nutribase_core::{Email, User};
use tracing::{debug, instrument};

use super::{ApiClient, StatusPayload};
use crate::error::ApiError;

impl ApiClient {
    /// Look up one user by email.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the backend has no such user.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_user(&self, email: &Email) -> Result<User, ApiError> {
        let url = self.url(&["users", email.as_str()])?;
        self.get(url).await.map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::NotFound(format!("user {email}")),
            other => other,
        })
    }

    /// Every registered user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_all_users(&self) -> Result<Vec<User>, ApiError> {
        self.list_users(None).await
    }

    /// Users an admin has approved.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_approved_users(&self) -> Result<Vec<User>, ApiError> {
        self.list_users(Some(true)).await
    }

    /// Users waiting for approval.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_not_approved_users(&self) -> Result<Vec<User>, ApiError> {
        self.list_users(Some(false)).await
    }

    async fn list_users(&self, approved: Option<bool>) -> Result<Vec<User>, ApiError> {
        let mut url = self.url(&["users"])?;
        if let Some(approved) = approved {
            url.query_pairs_mut()
                .append_pair("approved", if approved { "true" } else { "false" });
        }
        let users: Vec<User> = self.get(url).await?;
        debug!(count = users.len(), "Fetched users");
        Ok(users)
    }

    /// Approve a user's account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn approve_user(&self, email: &Email) -> Result<StatusPayload, ApiError> {
        let url = self.url(&["users", email.as_str(), "approve"])?;
        self.post(url).await
    }

    /// Revoke a user's approval.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn revoke_user(&self, email: &Email) -> Result<StatusPayload, ApiError> {
        let url = self.url(&["users", email.as_str(), "revoke"])?;
        self.post(url).await
    }

    /// Delete a user's account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn delete_user(&self, email: &Email) -> Result<(), ApiError> {
        let url = self.url(&["users", email.as_str()])?;
        self.delete(url).await
    }

    /// Recompute the contribution points of every user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_all_users_points(&self) -> Result<StatusPayload, ApiError> {
        let url = self.url(&["users", "points"])?;
        self.post(url).await
    }
}
