//! Selection engine
//!
//! Greedy, duration-bounded, outcome-prioritized task selection:
//!
//! 1. The candidate pool is the request's topic subset, or the full
//!    catalogue snapshot when that subset is empty.
//! 2. Candidates are split into two buckets, weak-aligned first and then
//!    the rest. Each bucket keeps catalogue order; there is no ranking
//!    within a bucket.
//! 3. Items are appended in bucket order until the `StopPolicy` says stop.
//!    The last item may cross the budget (stop after crossing, not a cap).
//! 4. An exhausted pool returns whatever was collected.

use ihw_common::models::{ContentItem, DifficultyTier, MasteryRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::request::RecommendationRequest;

/// One entry of the ordered homework task list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    /// 1-based, gapless
    pub sequence: u32,
    pub content_id: String,
    pub display_text: String,
    pub estimated_minutes: u32,
    pub difficulty_tier: DifficultyTier,
    pub aligned_outcome_ids: BTreeSet<String>,
    pub topic: String,
}

impl TaskEntry {
    fn from_item(sequence: u32, item: &ContentItem) -> Self {
        Self {
            sequence,
            content_id: item.id.clone(),
            display_text: format!(
                "{} ({}, {} min)",
                item.title, item.kind, item.duration_minutes
            ),
            estimated_minutes: item.duration_minutes,
            difficulty_tier: item.difficulty_tier,
            aligned_outcome_ids: item.aligned_outcome_ids.clone(),
            topic: item.topic.clone(),
        }
    }
}

/// Exact sum of task minutes, `None` if it does not fit in `u32`
pub fn sum_task_minutes(tasks: &[TaskEntry]) -> Option<u32> {
    tasks
        .iter()
        .try_fold(0u32, |acc, t| acc.checked_add(t.estimated_minutes))
}

/// When the greedy walk stops adding tasks
///
/// Always stops once the accumulated time reaches the budget. With an
/// early-stop ratio it also stops once at least one task is selected and
/// the accumulated time reaches `ratio * budget`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopPolicy {
    early_stop_ratio: Option<f64>,
}

impl StopPolicy {
    /// Fill the full budget (calendar-driven default)
    pub fn fill_budget() -> Self {
        Self {
            early_stop_ratio: None,
        }
    }

    /// Stop at `ratio` of the budget (topic-driven default uses 0.8)
    pub fn early_stop(ratio: f64) -> Self {
        Self {
            early_stop_ratio: Some(ratio),
        }
    }

    pub fn from_ratio(ratio: Option<f64>) -> Self {
        match ratio {
            Some(r) => Self::early_stop(r),
            None => Self::fill_budget(),
        }
    }

    fn should_stop(&self, selected: usize, accumulated: u32, budget: u32) -> bool {
        if accumulated >= budget {
            return true;
        }
        match self.early_stop_ratio {
            Some(ratio) => selected >= 1 && f64::from(accumulated) >= ratio * f64::from(budget),
            None => false,
        }
    }
}

/// Outcome ids whose recorded proficiency is strictly below `threshold`
pub fn weak_outcome_ids(records: &[MasteryRecord], threshold: f64) -> BTreeSet<String> {
    records
        .iter()
        .filter(|r| r.is_weak(threshold))
        .map(|r| r.outcome_id.clone())
        .collect()
}

/// Ordered task list plus what the walk observed
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub tasks: Vec<TaskEntry>,
    /// Topic subset was empty, so the full catalogue was used
    pub used_full_catalogue: bool,
    /// Number of selected tasks from the weak-aligned bucket
    pub weak_aligned_selected: usize,
    pub total_minutes: u32,
}

/// Select an ordered, time-bounded task list for `request`
pub fn select(
    request: &RecommendationRequest,
    weak_outcomes: &BTreeSet<String>,
    policy: StopPolicy,
) -> Selection {
    let used_full_catalogue = request.candidates.is_empty();
    let pool: &[ContentItem] = if used_full_catalogue {
        request.full_catalogue()
    } else {
        &request.candidates
    };

    // Stable two-bucket partition; no ordering within a bucket
    let (weak_bucket, other_bucket): (Vec<&ContentItem>, Vec<&ContentItem>) =
        pool.iter().partition(|item| item.aligns_with(weak_outcomes));

    let budget = request.budget_minutes;
    let mut tasks = Vec::new();
    let mut total_minutes = 0u32;
    let mut weak_aligned_selected = 0;

    let ordered = weak_bucket
        .iter()
        .map(|item| (true, *item))
        .chain(other_bucket.iter().map(|item| (false, *item)));

    for (weak_aligned, item) in ordered {
        // A total that no longer fits is past any budget
        let Some(next_total) = total_minutes.checked_add(item.duration_minutes) else {
            break;
        };
        let sequence = tasks.len() as u32 + 1;
        tasks.push(TaskEntry::from_item(sequence, item));
        total_minutes = next_total;
        if weak_aligned {
            weak_aligned_selected += 1;
        }

        if policy.should_stop(tasks.len(), total_minutes, budget) {
            break;
        }
    }

    tracing::debug!(
        request_id = %request.request_id,
        pool = pool.len(),
        weak_bucket = weak_bucket.len(),
        selected = tasks.len(),
        total_minutes,
        budget,
        "Selection complete"
    );

    Selection {
        tasks,
        used_full_catalogue,
        weak_aligned_selected,
        total_minutes,
    }
}
