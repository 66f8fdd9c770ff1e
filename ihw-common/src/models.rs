//! Curriculum data model
//!
//! Leaf data supplied by the data store: catalogue items, the curriculum
//! calendar, and per-learner mastery. All of it is read-only for the
//! duration of a recommendation request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Difficulty tier of a catalogue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyTier {
    Foundation,
    Core,
    Stretch,
}

impl DifficultyTier {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Foundation => "Foundation",
            DifficultyTier::Core => "Core",
            DifficultyTier::Stretch => "Stretch",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of instructional content with a fixed estimated duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub topic: String,
    pub difficulty_tier: DifficultyTier,
    /// Always > 0 (checked by `Dataset::validate`)
    pub duration_minutes: u32,
    /// Content kind, e.g. "video", "interactive", "practice"
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub aligned_outcome_ids: BTreeSet<String>,
}

impl ContentItem {
    /// Case-insensitive substring match of `topic` against this item's topic
    pub fn matches_topic(&self, topic: &str) -> bool {
        self.topic.to_lowercase().contains(&topic.to_lowercase())
    }

    /// True if any aligned outcome is in `outcome_ids`
    pub fn aligns_with(&self, outcome_ids: &BTreeSet<String>) -> bool {
        self.aligned_outcome_ids
            .iter()
            .any(|id| outcome_ids.contains(id))
    }
}

/// One learner's recorded proficiency on a learning outcome
///
/// Absence of a record means "unknown", not "mastered".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub outcome_id: String,
    pub topic: String,
    /// Proficiency in [0, 1]; `None` is never treated as weak
    #[serde(default)]
    pub proficiency: Option<f64>,
    /// Confidence in [0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl MasteryRecord {
    /// True if proficiency is recorded and strictly below `threshold`
    pub fn is_weak(&self, threshold: f64) -> bool {
        matches!(self.proficiency, Some(p) if p < threshold)
    }
}

/// Recent-activity summary kept alongside mastery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(default)]
    pub completed_tasks_last7_days: u32,
    #[serde(default)]
    pub minutes_last7_days: u32,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
}

/// A learner known to the mastery store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerRecord {
    pub learner_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub cohort: Option<String>,
    pub status: String,
    #[serde(default)]
    pub outcomes: Vec<MasteryRecord>,
    #[serde(default)]
    pub recent_activity: RecentActivity,
}

/// A curriculum week inside a semester (as stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekEntry {
    pub week_number: u32,
    pub topic: String,
}

/// A semester grouping consecutive weeks under one focus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub name: String,
    pub focus: String,
    pub weeks: Vec<WeekEntry>,
}

/// Ordered academic structure: semesters in order, each with ordered weeks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub semesters: Vec<Semester>,
}

/// A week resolved against the calendar, with its enclosing semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWeek {
    pub week_number: u32,
    pub topic: String,
    pub semester_name: String,
    pub semester_focus: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(topic: &str, outcomes: &[&str]) -> ContentItem {
        ContentItem {
            id: "R1".to_string(),
            topic: topic.to_string(),
            difficulty_tier: DifficultyTier::Core,
            duration_minutes: 10,
            kind: "practice".to_string(),
            title: "Practice".to_string(),
            aligned_outcome_ids: outcomes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_matches_topic_is_case_insensitive_substring() {
        let it = item("Fractions and mixed numbers", &[]);
        assert!(it.matches_topic("fractions"));
        assert!(it.matches_topic("MIXED NUMBERS"));
        assert!(!it.matches_topic("Ratios"));
    }

    #[test]
    fn test_aligns_with() {
        let it = item("Fractions", &["NUM-FRAC-1", "NUM-FRAC-2"]);
        let weak: BTreeSet<String> = ["NUM-FRAC-2".to_string()].into_iter().collect();
        let other: BTreeSet<String> = ["ALG-LIN-1".to_string()].into_iter().collect();
        assert!(it.aligns_with(&weak));
        assert!(!it.aligns_with(&other));
        assert!(!it.aligns_with(&BTreeSet::new()));
    }

    #[test]
    fn test_mastery_weakness_threshold() {
        let mut record = MasteryRecord {
            outcome_id: "ALG-LIN-1".to_string(),
            topic: "Linear equations".to_string(),
            proficiency: Some(0.69),
            confidence: Some(0.8),
        };
        assert!(record.is_weak(0.7));

        record.proficiency = Some(0.7);
        assert!(!record.is_weak(0.7), "threshold is strict");

        record.proficiency = None;
        assert!(!record.is_weak(0.7), "unrecorded proficiency is never weak");
    }

    #[test]
    fn test_content_item_json_shape() {
        let json = r#"{
            "id": "R9",
            "topic": "Geometry",
            "difficultyTier": "Stretch",
            "durationMinutes": 25,
            "kind": "quiz",
            "title": "Angles quiz",
            "alignedOutcomeIds": ["GEO-ANG-1"]
        }"#;
        let parsed: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.difficulty_tier, DifficultyTier::Stretch);
        assert_eq!(parsed.duration_minutes, 25);
        assert!(parsed.aligned_outcome_ids.contains("GEO-ANG-1"));
    }
}
