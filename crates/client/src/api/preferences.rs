//! Preference endpoints.

use nutribase_core::{Email, Preferences};
use tracing::instrument;

use super::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    /// Fetch a user's stored preferences, `None` if none were ever saved.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the document is malformed.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_preferences(&self, email: &Email) -> Result<Option<Preferences>, ApiError> {
        let url = self.url(&["users", email.as_str(), "preferences"])?;
        match self.get::<Option<Preferences>>(url).await {
            Ok(preferences) => Ok(preferences),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store a user's preferences, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, preferences), fields(email = %email))]
    pub async fn save_preferences(
        &self,
        email: &Email,
        preferences: &Preferences,
    ) -> Result<(), ApiError> {
        let url = self.url(&["users", email.as_str(), "preferences"])?;
        self.put(url, preferences).await
    }
}
