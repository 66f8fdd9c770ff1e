//! External scoring service client
//!
//! POSTs the normalized `RecommendationRequest` to a configured endpoint and
//! decodes a homework result. Every call is bounded by the client timeout.
//!
//! Errors from this client never reach callers of the recommendation
//! service; the delegation policy turns them into a local fallback.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::assembler::HomeworkResult;
use super::request::RecommendationRequest;

const USER_AGENT: &str = concat!("ihw-rec/", env!("CARGO_PKG_VERSION"));

/// Scoring client errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Client could not be constructed
    #[error("Client setup error: {0}")]
    Setup(String),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// No response within the configured timeout
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Service returned a non-success status
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Response body was not a homework result
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Body accepted from the scoring service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRecommendation {
    pub homework: HomeworkResult,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub model_version: Option<String>,
}

/// HTTP client for the external scoring service
#[derive(Debug, Clone)]
pub struct ScoringClient {
    http_client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl ScoringClient {
    /// Create a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ScoringError::Setup(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the scoring service for a recommendation
    pub async fn score(
        &self,
        request: &RecommendationRequest,
    ) -> Result<ExternalRecommendation, ScoringError> {
        tracing::debug!(
            request_id = %request.request_id,
            endpoint = %self.endpoint,
            "Delegating recommendation to external engine"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoringError::ApiError(status.as_u16(), error_text));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let external: ExternalRecommendation =
            serde_json::from_slice(&body).map_err(|e| ScoringError::ParseError(e.to_string()))?;

        tracing::info!(
            request_id = %request.request_id,
            tasks = external.homework.tasks.len(),
            "External engine responded"
        );

        Ok(external)
    }

    fn transport_error(&self, e: reqwest::Error) -> ScoringError {
        if e.is_timeout() {
            ScoringError::Timeout(self.timeout_ms)
        } else {
            ScoringError::NetworkError(e.to_string())
        }
    }
}
