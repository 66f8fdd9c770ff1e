//! Delegation policy
//!
//! Each request takes exactly one path:
//!
//! - `Delegated`: an external scoring service is configured and returned a
//!   non-empty, consistent homework; it is adopted as-is and the local
//!   engine is skipped.
//! - `LocalFallback`: no service configured, the call failed (transport,
//!   timeout, non-success status, malformed body), or it returned no tasks.
//!   The local selection engine produces the result.
//!
//! External failures are logged and recorded as an explanation note. They
//! are never returned to the caller.

use ihw_common::config::TomlConfig;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::assembler::{assemble, Explanation, HomeworkResult};
use super::request::RecommendationRequest;
use super::scoring_client::{ScoringClient, ScoringError};
use super::selection::{select, weak_outcome_ids, StopPolicy};

/// Model version reported when the external engine does not name one
const EXTERNAL_MODEL_VERSION: &str = "external";

/// Why the local engine produced the result
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NotConfigured,
    Unavailable(String),
    EmptyResult,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NotConfigured => f.write_str("external engine not configured"),
            FallbackReason::Unavailable(detail) => {
                write!(f, "external engine unavailable ({})", detail)
            }
            FallbackReason::EmptyResult => f.write_str("external engine returned no tasks"),
        }
    }
}

/// Which path produced the result
#[derive(Debug, Clone, PartialEq)]
pub enum DelegationPath {
    Delegated,
    LocalFallback(FallbackReason),
}

impl DelegationPath {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            DelegationPath::Delegated => "delegated",
            DelegationPath::LocalFallback(_) => "local",
        }
    }

    /// Explanation note naming the path and, for fallback, the reason
    pub fn note(&self) -> String {
        match self {
            DelegationPath::Delegated => {
                "Result provided by the external engine; local fallback not used.".to_string()
            }
            DelegationPath::LocalFallback(reason) => {
                format!("Local rules engine used: {}.", reason)
            }
        }
    }
}

/// Recommendation errors visible to callers
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Caller went away before a result was produced
    #[error("Recommendation cancelled")]
    Cancelled,
}

/// Homework plus explanation and the path that produced it
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub homework: HomeworkResult,
    pub explanation: Explanation,
    pub path: DelegationPath,
    pub model_version: String,
}

/// Delegates to the external engine when possible, otherwise selects locally
#[derive(Debug, Clone)]
pub struct Recommender {
    client: Option<ScoringClient>,
    weak_threshold: f64,
    model_version: String,
}

impl Recommender {
    pub fn new(client: Option<ScoringClient>, weak_threshold: f64, model_version: String) -> Self {
        Self {
            client,
            weak_threshold,
            model_version,
        }
    }

    /// Build from bootstrap configuration
    pub fn from_config(config: &TomlConfig) -> Result<Self, ScoringError> {
        let client = match config.external_engine.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                info!(url, "External scoring engine configured");
                Some(ScoringClient::new(url, config.external_engine.timeout_ms)?)
            }
            _ => {
                info!("No external scoring engine configured; local rules only");
                None
            }
        };

        Ok(Self::new(
            client,
            config.recommendation.weak_threshold,
            config.recommendation.model_version.clone(),
        ))
    }

    pub fn is_delegating(&self) -> bool {
        self.client.is_some()
    }

    /// Produce a recommendation for `request`
    ///
    /// Only cancellation is returned as an error. A cancelled caller
    /// abandons any in-flight external call and skips local selection.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        policy: StopPolicy,
        cancel: &CancellationToken,
    ) -> Result<Recommendation, RecommendError> {
        let reason = match &self.client {
            None => FallbackReason::NotConfigured,
            Some(client) => {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RecommendError::Cancelled),
                    result = client.score(request) => result,
                };

                match outcome {
                    Ok(external)
                        if !external.homework.tasks.is_empty()
                            && external.homework.check_invariants().is_ok() =>
                    {
                        let mut notes = request.notes.clone();
                        notes.extend(external.notes);
                        let path = DelegationPath::Delegated;
                        notes.push(path.note());

                        let explanation = Explanation {
                            summary: format!(
                                "{} tasks for {} from the external engine.",
                                external.homework.tasks.len(),
                                external.homework.topic
                            ),
                            notes,
                        };
                        info!(
                            request_id = %request.request_id,
                            learner_id = %request.learner.learner_id,
                            path = path.label(),
                            tasks = external.homework.tasks.len(),
                            "Recommendation ready"
                        );
                        return Ok(Recommendation {
                            homework: external.homework,
                            explanation,
                            path,
                            model_version: external
                                .model_version
                                .unwrap_or_else(|| EXTERNAL_MODEL_VERSION.to_string()),
                        });
                    }
                    Ok(external) if external.homework.tasks.is_empty() => {
                        warn!(
                            request_id = %request.request_id,
                            "External engine returned an empty homework; falling back"
                        );
                        FallbackReason::EmptyResult
                    }
                    Ok(external) => {
                        let detail = external
                            .homework
                            .check_invariants()
                            .err()
                            .unwrap_or_default();
                        warn!(
                            request_id = %request.request_id,
                            error = %detail,
                            "External engine returned an inconsistent homework; falling back"
                        );
                        FallbackReason::Unavailable(format!("malformed result: {}", detail))
                    }
                    Err(e) => {
                        warn!(
                            request_id = %request.request_id,
                            error = %e,
                            "External engine call failed; falling back"
                        );
                        FallbackReason::Unavailable(e.to_string())
                    }
                }
            }
        };

        if cancel.is_cancelled() {
            return Err(RecommendError::Cancelled);
        }

        Ok(self.recommend_locally(request, policy, reason))
    }

    fn recommend_locally(
        &self,
        request: &RecommendationRequest,
        policy: StopPolicy,
        reason: FallbackReason,
    ) -> Recommendation {
        let weak = weak_outcome_ids(&request.mastery, self.weak_threshold);
        let selection = select(request, &weak, policy);

        let mut notes = request.notes.clone();
        if selection.used_full_catalogue {
            notes.push(format!(
                "No matching resources for requested topic \"{}\"; drew from the full catalogue.",
                request.topic_label()
            ));
        }
        if weak.is_empty() {
            notes.push("No weak outcomes on record; catalogue order used.".to_string());
        } else {
            let ids: Vec<&str> = weak.iter().map(String::as_str).collect();
            notes.push(format!(
                "Prioritised content aligned to weak outcomes: {} ({} selected).",
                ids.join(", "),
                selection.weak_aligned_selected
            ));
        }
        notes.push(format!(
            "Selected {} task(s) totalling {} of {} budgeted minutes.",
            selection.tasks.len(),
            selection.total_minutes,
            request.budget_minutes
        ));

        let path = DelegationPath::LocalFallback(reason);
        notes.push(path.note());

        info!(
            request_id = %request.request_id,
            learner_id = %request.learner.learner_id,
            path = path.label(),
            tasks = selection.tasks.len(),
            total_minutes = selection.total_minutes,
            "Recommendation ready"
        );

        let (homework, explanation) = assemble(request, selection.tasks, notes);
        Recommendation {
            homework,
            explanation,
            path,
            model_version: self.model_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::request::{Focus, Normalizer, RequestMode};
    use ihw_common::Dataset;
    use std::sync::Arc;

    fn request(topic: &str, budget: u32) -> RecommendationRequest {
        Normalizer::new(30).normalize(
            Arc::new(Dataset::demo()),
            RequestMode::Topic,
            "L001",
            Focus::Topic(topic.to_string()),
            Some(budget),
            None,
        )
    }

    fn local_only() -> Recommender {
        Recommender::new(None, 0.7, "rules-v1".to_string())
    }

    #[tokio::test]
    async fn test_not_configured_falls_back_with_note() {
        let request = request("Fractions", 15);
        let rec = local_only()
            .recommend(&request, StopPolicy::early_stop(0.8), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            rec.path,
            DelegationPath::LocalFallback(FallbackReason::NotConfigured)
        );
        assert_eq!(rec.model_version, "rules-v1");
        assert!(!rec.homework.tasks.is_empty());
        assert!(rec
            .explanation
            .notes
            .iter()
            .any(|n| n.contains("external engine not configured")));
    }

    #[tokio::test]
    async fn test_weak_aligned_fraction_item_is_first_for_l001() {
        // L001 is weak on NUM-FRAC-2, which only R003 covers
        let request = request("Fractions", 30);
        let rec = local_only()
            .recommend(&request, StopPolicy::fill_budget(), &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = rec
            .homework
            .tasks
            .iter()
            .map(|t| t.content_id.as_str())
            .collect();
        assert_eq!(ids, vec!["R003", "R001"]);
    }

    #[tokio::test]
    async fn test_unreachable_engine_falls_back() {
        // Port 9 (discard) is not expected to run an HTTP server
        let client = ScoringClient::new("http://127.0.0.1:9/score", 500).unwrap();
        let recommender = Recommender::new(Some(client), 0.7, "rules-v1".to_string());

        let request = request("Linear equations", 30);
        let rec = recommender
            .recommend(&request, StopPolicy::early_stop(0.8), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            rec.path,
            DelegationPath::LocalFallback(FallbackReason::Unavailable(_))
        ));
        assert_eq!(rec.homework.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_local_selection() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = local_only()
            .recommend(&request("Fractions", 15), StopPolicy::fill_budget(), &cancel)
            .await;
        assert!(matches!(result, Err(RecommendError::Cancelled)));
    }

    #[test]
    fn test_from_config_without_url_is_local() {
        let recommender = Recommender::from_config(&TomlConfig::default()).unwrap();
        assert!(!recommender.is_delegating());
    }

    #[test]
    fn test_from_config_with_blank_url_is_local() {
        let mut config = TomlConfig::default();
        config.external_engine.url = Some("  ".to_string());
        let recommender = Recommender::from_config(&config).unwrap();
        assert!(!recommender.is_delegating());
    }
}
