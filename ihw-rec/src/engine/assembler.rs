//! Response assembler
//!
//! Pure packaging of a selected task list into a homework result with an
//! explanation block.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::{DifficultyMix, RecommendationRequest};
use super::selection::{sum_task_minutes, TaskEntry};

/// A packaged homework assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkResult {
    pub homework_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_number: Option<u32>,
    /// Always the exact sum of task minutes
    #[serde(rename = "estimatedTotalTimeMinutes", alias = "estimatedTotalMinutes")]
    pub estimated_total_minutes: u32,
    #[serde(default)]
    pub target_difficulty_profile: DifficultyMix,
    pub tasks: Vec<TaskEntry>,
}

impl HomeworkResult {
    /// Sequences must be 1-based and gapless; the total must equal the task sum
    pub fn check_invariants(&self) -> Result<(), String> {
        for (i, task) in self.tasks.iter().enumerate() {
            let expected = i as u32 + 1;
            if task.sequence != expected {
                return Err(format!(
                    "task {} has sequence {}, expected {}",
                    task.content_id, task.sequence, expected
                ));
            }
        }
        let sum = sum_task_minutes(&self.tasks)
            .ok_or_else(|| "task minutes overflow the total".to_string())?;
        if sum != self.estimated_total_minutes {
            return Err(format!(
                "estimated total {} does not match task sum {}",
                self.estimated_total_minutes, sum
            ));
        }
        Ok(())
    }
}

/// Diagnostic explanation; never affects selection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Explanation {
    pub summary: String,
    pub notes: Vec<String>,
}

fn new_homework_id() -> String {
    format!("hw-{}", Uuid::new_v4())
}

/// Package `tasks` for `request`
pub fn assemble(
    request: &RecommendationRequest,
    tasks: Vec<TaskEntry>,
    notes: Vec<String>,
) -> (HomeworkResult, Explanation) {
    let topic = request.topic_label().to_string();
    let week_number = request.week_number();
    // Saturates only for hand-built task lists; check_invariants rejects those
    let estimated_total_minutes = sum_task_minutes(&tasks).unwrap_or(u32::MAX);

    let title = match week_number {
        Some(week) => format!("Week {} homework: {}", week, topic),
        None => format!("Homework: {}", topic),
    };
    let description = format!(
        "Personalised practice for {} on {}, about {} of {} minutes.",
        request.learner.learner_id, topic, estimated_total_minutes, request.budget_minutes
    );

    let summary = match tasks.len() {
        0 => format!("No tasks could be selected for {}.", topic),
        1 => format!(
            "1 task for {} ({} minutes), weakest outcomes first.",
            topic, estimated_total_minutes
        ),
        n => format!(
            "{} tasks for {} ({} minutes), weakest outcomes first.",
            n, topic, estimated_total_minutes
        ),
    };

    let homework = HomeworkResult {
        homework_id: new_homework_id(),
        title,
        description,
        topic,
        week_number,
        estimated_total_minutes,
        target_difficulty_profile: request.difficulty_mix,
        tasks,
    };

    (homework, Explanation { summary, notes })
}
