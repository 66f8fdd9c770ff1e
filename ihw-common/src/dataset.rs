//! Curriculum dataset: catalogue, calendar and mastery store
//!
//! A `Dataset` is one immutable version of the externally-owned data. It is
//! loaded from a JSON file, or falls back to the built-in demo curriculum.

use crate::models::{
    Calendar, ContentItem, DifficultyTier, LearnerRecord, MasteryRecord, RecentActivity, Semester,
    WeekEntry,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Longest content item accepted in a catalogue (one day)
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Catalogue, calendar and learners as one consistent version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub catalogue: Vec<ContentItem>,
    #[serde(default)]
    pub calendar: Calendar,
    #[serde(default)]
    pub learners: Vec<LearnerRecord>,
}

impl Dataset {
    /// Load a dataset from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Dataset file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        dataset.validate()?;

        info!(
            path = %path.display(),
            items = dataset.catalogue.len(),
            learners = dataset.learners.len(),
            "Loaded curriculum dataset"
        );
        Ok(dataset)
    }

    /// Load from `path` if given, otherwise (or if the file is missing) use the demo dataset
    ///
    /// A missing file is not fatal. A file that exists but fails to parse or
    /// validate is an error.
    pub fn load_or_demo(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => match Self::load(p) {
                Ok(dataset) => Ok(dataset),
                Err(Error::NotFound(msg)) => {
                    warn!("{}; using built-in demo dataset", msg);
                    Ok(Self::demo())
                }
                Err(e) => Err(e),
            },
            None => {
                info!("No dataset file configured; using built-in demo dataset");
                Ok(Self::demo())
            }
        }
    }

    /// Check catalogue durations (1..=MAX_DURATION_MINUTES) and duplicate ids
    ///
    /// Duplicate week numbers are allowed; resolution takes the first one.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for item in &self.catalogue {
            if item.duration_minutes == 0 {
                return Err(Error::InvalidInput(format!(
                    "Content item {} has zero duration",
                    item.id
                )));
            }
            if item.duration_minutes > MAX_DURATION_MINUTES {
                return Err(Error::InvalidInput(format!(
                    "Content item {} lasts {} minutes (max {})",
                    item.id, item.duration_minutes, MAX_DURATION_MINUTES
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate content item id: {}",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// Catalogue items whose topic contains `topic` (case-insensitive)
    ///
    /// `None` returns the full catalogue. Catalogue order is preserved.
    pub fn catalogue_for_topic(&self, topic: Option<&str>) -> Vec<ContentItem> {
        match topic {
            Some(t) => self
                .catalogue
                .iter()
                .filter(|item| item.matches_topic(t))
                .cloned()
                .collect(),
            None => self.catalogue.clone(),
        }
    }

    /// Look up a learner by id
    pub fn learner(&self, learner_id: &str) -> Option<&LearnerRecord> {
        self.learners.iter().find(|l| l.learner_id == learner_id)
    }

    /// Mastery records for a learner (empty for unknown learners)
    pub fn mastery_for(&self, learner_id: &str) -> &[MasteryRecord] {
        self.learner(learner_id)
            .map(|l| l.outcomes.as_slice())
            .unwrap_or(&[])
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Built-in demo curriculum
    pub fn demo() -> Self {
        let catalogue = vec![
            demo_item(
                "R001",
                "Fractions and mixed numbers",
                DifficultyTier::Foundation,
                10,
                "video",
                "Fraction strips warm-up",
                &["NUM-FRAC-1"],
            ),
            demo_item(
                "R002",
                "Linear equations and inequalities",
                DifficultyTier::Core,
                30,
                "interactive",
                "Desmos exploration: balancing equations",
                &["ALG-LIN-1", "ALG-LIN-2"],
            ),
            demo_item(
                "R003",
                "Fractions and mixed numbers",
                DifficultyTier::Core,
                15,
                "practice",
                "Mixed numbers practice set",
                &["NUM-FRAC-2"],
            ),
            demo_item(
                "R004",
                "Ratios and proportional reasoning",
                DifficultyTier::Core,
                20,
                "worked-example",
                "Ratio tables worked examples",
                &["NUM-RAT-1"],
            ),
            demo_item(
                "R005",
                "Geometry: area and perimeter",
                DifficultyTier::Foundation,
                15,
                "quiz",
                "Area of composite shapes quiz",
                &["GEO-AREA-1"],
            ),
            demo_item(
                "R006",
                "Ratios and proportional reasoning",
                DifficultyTier::Stretch,
                25,
                "project",
                "Scale drawing challenge",
                &["NUM-RAT-1", "NUM-RAT-2"],
            ),
        ];

        let calendar = Calendar {
            semesters: vec![
                Semester {
                    name: "Semester 1".to_string(),
                    focus: "Number sense and proportional reasoning".to_string(),
                    weeks: vec![
                        week(1, "Fractions and mixed numbers"),
                        week(2, "Fractions and mixed numbers"),
                        week(3, "Ratios and proportional reasoning"),
                    ],
                },
                Semester {
                    name: "Semester 2".to_string(),
                    focus: "Algebra and geometry foundations".to_string(),
                    weeks: vec![
                        week(4, "Linear equations and inequalities"),
                        week(5, "Linear equations and inequalities"),
                        week(6, "Geometry: area and perimeter"),
                    ],
                },
            ],
        };

        let learners = vec![
            LearnerRecord {
                learner_id: "L001".to_string(),
                display_name: Some("Ava".to_string()),
                cohort: Some("Year 7 - Group A".to_string()),
                status: "Active".to_string(),
                outcomes: vec![
                    mastery("ALG-LIN-1", "Linear equations and inequalities", 0.45, 0.6),
                    mastery("NUM-FRAC-1", "Fractions and mixed numbers", 0.82, 0.9),
                    mastery("NUM-FRAC-2", "Fractions and mixed numbers", 0.55, 0.7),
                ],
                recent_activity: RecentActivity {
                    completed_tasks_last7_days: 4,
                    minutes_last7_days: 85,
                    last_active_at: None,
                },
            },
            LearnerRecord {
                learner_id: "L002".to_string(),
                display_name: Some("Noah".to_string()),
                cohort: Some("Year 7 - Group B".to_string()),
                status: "Active".to_string(),
                outcomes: vec![
                    mastery("NUM-RAT-2", "Ratios and proportional reasoning", 0.4, 0.5),
                    mastery("GEO-AREA-1", "Geometry: area and perimeter", 0.9, 0.85),
                ],
                recent_activity: RecentActivity::default(),
            },
            LearnerRecord {
                learner_id: "L003".to_string(),
                display_name: None,
                cohort: Some("Year 7 - Group A".to_string()),
                status: "Inactive".to_string(),
                outcomes: Vec::new(),
                recent_activity: RecentActivity::default(),
            },
        ];

        Self {
            catalogue,
            calendar,
            learners,
        }
    }
}

fn demo_item(
    id: &str,
    topic: &str,
    tier: DifficultyTier,
    minutes: u32,
    kind: &str,
    title: &str,
    outcomes: &[&str],
) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        topic: topic.to_string(),
        difficulty_tier: tier,
        duration_minutes: minutes,
        kind: kind.to_string(),
        title: title.to_string(),
        aligned_outcome_ids: outcomes.iter().map(|s| s.to_string()).collect(),
    }
}

fn week(week_number: u32, topic: &str) -> WeekEntry {
    WeekEntry {
        week_number,
        topic: topic.to_string(),
    }
}

fn mastery(outcome_id: &str, topic: &str, proficiency: f64, confidence: f64) -> MasteryRecord {
    MasteryRecord {
        outcome_id: outcome_id.to_string(),
        topic: topic.to_string(),
        proficiency: Some(proficiency),
        confidence: Some(confidence),
    }
}
