//! Request normalizer
//!
//! Builds the canonical, immutable `RecommendationRequest` from raw inputs.
//! The request doubles as the audit record returned to callers, so it is
//! built once and never mutated afterwards.

use ihw_common::models::{CalendarWeek, ContentItem, MasteryRecord, RecentActivity};
use ihw_common::Dataset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Status reported for learners the mastery store does not know
pub const UNKNOWN_LEARNER_STATUS: &str = "Unknown";

/// Which entry point produced the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    Topic,
    Calendar,
}

/// Target share of each difficulty tier
///
/// Carried through to the result; the local engine does not select on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMix {
    pub foundation: f64,
    pub core: f64,
    pub stretch: f64,
}

impl Default for DifficultyMix {
    fn default() -> Self {
        Self {
            foundation: 0.3,
            core: 0.5,
            stretch: 0.2,
        }
    }
}

/// Learner block of the request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSummary {
    pub learner_id: String,
    pub cohort: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<RecentActivity>,
}

impl LearnerSummary {
    /// Stand-in for a learner id the mastery store does not know
    pub fn placeholder(learner_id: &str) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            cohort: None,
            status: UNKNOWN_LEARNER_STATUS.to_string(),
            display_name: None,
            recent_activity: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == UNKNOWN_LEARNER_STATUS
    }
}

/// What the request is about: an explicit topic or a resolved calendar week
#[derive(Debug, Clone, PartialEq)]
pub enum Focus {
    Topic(String),
    Week { week: CalendarWeek, mapped: bool },
}

/// Canonical recommendation request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub request_id: Uuid,
    pub mode: RequestMode,
    pub learner: LearnerSummary,
    /// Resolved topic; `None` means the full catalogue is eligible
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<CalendarWeek>,
    pub budget_minutes: u32,
    pub difficulty_mix: DifficultyMix,
    pub mastery: Vec<MasteryRecord>,
    /// Copy of the catalogue subset matching `topic`
    pub candidates: Vec<ContentItem>,
    /// Catalogue version this request was built from
    #[serde(skip)]
    pub snapshot: Arc<Dataset>,
    /// Diagnostics gathered while normalizing, in order
    #[serde(skip)]
    pub notes: Vec<String>,
}

impl RecommendationRequest {
    /// Full catalogue of the snapshot the request was built from
    pub fn full_catalogue(&self) -> &[ContentItem] {
        &self.snapshot.catalogue
    }

    pub fn week_number(&self) -> Option<u32> {
        self.week.as_ref().map(|w| w.week_number)
    }

    /// Human label for the resolved topic
    pub fn topic_label(&self) -> &str {
        self.topic.as_deref().unwrap_or("general practice")
    }
}

/// Builds requests with configured defaults
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_budget_minutes: u32,
}

impl Normalizer {
    pub fn new(default_budget_minutes: u32) -> Self {
        Self {
            default_budget_minutes,
        }
    }

    /// Build a request against one dataset snapshot
    ///
    /// Unknown learners get a placeholder summary; that is a valid,
    /// degraded request rather than an error.
    pub fn normalize(
        &self,
        snapshot: Arc<Dataset>,
        mode: RequestMode,
        learner_id: &str,
        focus: Focus,
        budget_minutes: Option<u32>,
        difficulty_mix: Option<DifficultyMix>,
    ) -> RecommendationRequest {
        let mut notes = Vec::new();

        let learner = match snapshot.learner(learner_id) {
            Some(record) => LearnerSummary {
                learner_id: record.learner_id.clone(),
                cohort: record.cohort.clone(),
                status: record.status.clone(),
                display_name: record.display_name.clone(),
                recent_activity: Some(record.recent_activity.clone()),
            },
            None => {
                notes.push(format!(
                    "Learner {} not found; using a placeholder profile with no mastery history.",
                    learner_id
                ));
                LearnerSummary::placeholder(learner_id)
            }
        };

        let (topic, week) = match focus {
            Focus::Topic(t) => {
                let t = t.trim();
                ((!t.is_empty()).then(|| t.to_string()), None)
            }
            Focus::Week { week, mapped } => {
                if !mapped {
                    notes.push(format!(
                        "Week {} is not in the curriculum calendar; topic set to \"{}\".",
                        week.week_number, week.topic
                    ));
                }
                (Some(week.topic.clone()), Some(week))
            }
        };

        let candidates = snapshot.catalogue_for_topic(topic.as_deref());
        let mastery = snapshot.mastery_for(learner_id).to_vec();
        let budget_minutes = budget_minutes.unwrap_or(self.default_budget_minutes);

        let request = RecommendationRequest {
            request_id: Uuid::new_v4(),
            mode,
            learner,
            topic,
            week,
            budget_minutes,
            difficulty_mix: difficulty_mix.unwrap_or_default(),
            mastery,
            candidates,
            snapshot,
            notes,
        };

        debug!(
            request_id = %request.request_id,
            learner_id = %request.learner.learner_id,
            topic = ?request.topic,
            candidates = request.candidates.len(),
            budget_minutes = request.budget_minutes,
            "Normalized recommendation request"
        );

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> Arc<Dataset> {
        Arc::new(Dataset::demo())
    }

    #[test]
    fn test_known_learner_is_resolved() {
        let request = Normalizer::new(30).normalize(
            demo(),
            RequestMode::Topic,
            "L001",
            Focus::Topic("Linear equations and inequalities".to_string()),
            Some(30),
            None,
        );

        assert_eq!(request.learner.learner_id, "L001");
        assert_eq!(request.learner.cohort.as_deref(), Some("Year 7 - Group A"));
        assert!(!request.learner.is_placeholder());
        assert_eq!(request.mastery.len(), 3);
        assert_eq!(request.candidates.len(), 1);
        assert!(request.notes.is_empty());
    }

    #[test]
    fn test_unknown_learner_gets_placeholder() {
        let request = Normalizer::new(30).normalize(
            demo(),
            RequestMode::Topic,
            "L999",
            Focus::Topic("Fractions and mixed numbers".to_string()),
            Some(15),
            None,
        );

        assert_eq!(request.learner, LearnerSummary::placeholder("L999"));
        assert!(request.mastery.is_empty());
        assert_eq!(request.candidates.len(), 2);
        assert_eq!(request.notes.len(), 1);

        let json = serde_json::to_value(&request.learner).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"learnerId": "L999", "cohort": null, "status": "Unknown"})
        );
    }

    #[test]
    fn test_missing_budget_uses_default() {
        let request = Normalizer::new(30).normalize(
            demo(),
            RequestMode::Topic,
            "L001",
            Focus::Topic("Fractions".to_string()),
            None,
            None,
        );
        assert_eq!(request.budget_minutes, 30);
        assert_eq!(request.difficulty_mix, DifficultyMix::default());
    }

    #[test]
    fn test_blank_topic_makes_full_catalogue_eligible() {
        let request = Normalizer::new(30).normalize(
            demo(),
            RequestMode::Topic,
            "L001",
            Focus::Topic("   ".to_string()),
            None,
            None,
        );
        assert!(request.topic.is_none());
        assert_eq!(request.candidates.len(), request.full_catalogue().len());
    }

    #[test]
    fn test_unmapped_week_adds_note() {
        let week = CalendarWeek {
            week_number: 99,
            topic: "Unspecified".to_string(),
            semester_name: "Unmapped".to_string(),
            semester_focus: None,
        };
        let request = Normalizer::new(30).normalize(
            demo(),
            RequestMode::Calendar,
            "L001",
            Focus::Week {
                week,
                mapped: false,
            },
            None,
            None,
        );

        assert_eq!(request.topic.as_deref(), Some("Unspecified"));
        assert_eq!(request.week_number(), Some(99));
        assert!(request.candidates.is_empty());
        assert!(request.notes[0].contains("Week 99"));
    }
}
