//! Database maintenance endpoint.

use tracing::instrument;

use super::{ApiClient, StatusPayload};
use crate::error::ApiError;

impl ApiClient {
    /// Re-import the food database on the backend.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_db(&self) -> Result<StatusPayload, ApiError> {
        let url = self.url(&["db", "update"])?;
        self.post(url).await
    }
}
