//! REST client for the Nutribase backend.
//!
//! # Endpoints
//!
//! | Call | Request |
//! |---|---|
//! | preferences | `GET`/`PUT /users/{email}/preferences` |
//! | user lookup | `GET /users/{email}` |
//! | user lists | `GET /users[?approved=true\|false]` |
//! | approval | `POST /users/{email}/approve`, `POST /users/{email}/revoke` |
//! | deletion | `DELETE /users/{email}` |
//! | points | `POST /users/points` |
//! | database | `POST /db/update` |
//!
//! Mutating calls that report progress return the backend's status payload
//! as raw JSON.

mod db;
mod preferences;
mod users;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ApiConfig, bearer};
use crate::error::ApiError;

/// Arbitrary JSON returned by bulk and approval endpoints.
pub type StatusPayload = serde_json::Value;

/// Nutribase API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&bearer(token))
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a URL by appending percent-encoded path segments to the base.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request without a body.
    pub(crate) async fn post<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.post(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a PUT request with a JSON body, ignoring any response body.
    pub(crate) async fn put<B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<(), ApiError> {
        let response = self.inner.client.put(url).json(body).send().await?;
        Self::expect_success(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), ApiError> {
        let response = self.inner.client.delete(url).send().await?;
        Self::expect_success(response).await
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Handle API response and parse JSON. An empty body parses as `null`.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        let body = response.bytes().await?;
        let body: &[u8] = if body.is_empty() { b"null" } else { &body };
        serde_json::from_slice(body)
            .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")))
    }

    /// Map an error response to an [`ApiError`].
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ApiError::RateLimited(retry_after);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ApiError::Unauthorized;
        }

        if status == StatusCode::NOT_FOUND {
            return ApiError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        ApiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
