//! FurnishFindr backend API client
//!
//! Thin reqwest wrapper around `POST /api/recommend` and `GET /api/analytics`.
//! Failures are returned to the caller as [`ClientError`] and never retried
//! here; an empty result set is `Ok` with no items.

use furnish_common::api::{AnalyticsResponse, RecommendRequest, RecommendResponse};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("FurnishFindr/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error-body bytes kept for diagnostics
const ERROR_BODY_LIMIT: usize = 512;

/// Backend client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{endpoint} failed (HTTP {status}) {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Backend answered 2xx but reported an error in the body
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ClientError {
    /// Short message for the user; all variants are worth retrying by hand
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "Could not reach the server. Try again.",
            ClientError::Status { .. } | ClientError::Backend(_) => "Server error. Try again.",
            ClientError::Parse(_) => "Unexpected response from the server. Try again.",
        }
    }
}

/// Backend API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl BackendClient {
    /// Create a client for `api_base` (e.g. `http://localhost:8000`)
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch ranked items for a query
    pub async fn recommend(
        &self,
        request: &RecommendRequest,
    ) -> Result<RecommendResponse, ClientError> {
        let url = format!("{}/api/recommend", self.api_base);

        tracing::debug!(query = %request.query, k = ?request.k, "Requesting recommendations");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status("Recommend", response).await?;

        let body: RecommendResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        tracing::info!(
            query = %request.query,
            items = body.items.len(),
            "Recommendations received"
        );

        Ok(body)
    }

    /// Fetch dataset analytics
    pub async fn analytics(&self) -> Result<AnalyticsResponse, ClientError> {
        let url = format!("{}/api/analytics", self.api_base);

        tracing::debug!("Requesting analytics");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status("Analytics", response).await?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        // The backend reports aggregation failures as `{"error": "..."}` with 200
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return Err(ClientError::Backend(message.to_string()));
        }

        let analytics: AnalyticsResponse =
            serde_json::from_value(value).map_err(|e| ClientError::Parse(e.to_string()))?;

        tracing::info!(
            total_products = analytics.total_products,
            brands = analytics.brand_counts.len(),
            "Analytics received"
        );

        Ok(analytics)
    }
}

async fn check_status(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }

    tracing::warn!(endpoint, status = status.as_u16(), "Backend request failed");

    Err(ClientError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}
