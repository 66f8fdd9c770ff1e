//! Homework recommendation engine
//!
//! Processing order for one request:
//! request normalizer → (calendar resolver) → delegation policy →
//! selection engine → response assembler.

pub mod assembler;
pub mod calendar;
pub mod delegation;
pub mod request;
pub mod scoring_client;
pub mod selection;

pub use assembler::{assemble, Explanation, HomeworkResult};
pub use calendar::{resolve_week, WeekResolution};
pub use delegation::{DelegationPath, FallbackReason, Recommendation, RecommendError, Recommender};
pub use request::{DifficultyMix, Focus, LearnerSummary, Normalizer, RecommendationRequest, RequestMode};
pub use scoring_client::{ScoringClient, ScoringError};
pub use selection::{select, weak_outcome_ids, StopPolicy, TaskEntry};
