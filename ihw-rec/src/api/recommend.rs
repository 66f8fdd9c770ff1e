//! Recommendation API handlers
//!
//! POST /api/recommend (topic-driven), POST /api/recommend/calendar
//! (calendar-driven). Validation failures are the only caller-visible
//! errors before the engine runs.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::engine::{
    resolve_week, DifficultyMix, Explanation, Focus, LearnerSummary, Recommendation,
    RecommendationRequest, RequestMode, StopPolicy, TaskEntry,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/recommend request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecommendationInput {
    pub learner_id: Option<String>,
    pub topic: Option<String>,
    pub max_total_time_minutes: Option<u32>,
    pub difficulty_profile: Option<DifficultyMix>,
    /// When false, only the delegation path note is kept
    pub explain: Option<bool>,
}

/// POST /api/recommend/calendar request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecommendationInput {
    pub learner_id: Option<String>,
    pub week_number: Option<u32>,
    /// Topic used when the week is not in the calendar
    pub topic: Option<String>,
    pub max_total_time_minutes: Option<u32>,
}

/// Explanation block in both response shapes
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationBlock {
    pub global: String,
    pub notes: Vec<String>,
    pub learner_id: String,
}

impl ExplanationBlock {
    fn new(explanation: Explanation, learner_id: &str) -> Self {
        Self {
            global: explanation.summary,
            notes: explanation.notes,
            learner_id: learner_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicHomework {
    pub homework_id: String,
    pub title: String,
    pub description: String,
    pub estimated_total_time_minutes: u32,
    pub target_difficulty_profile: DifficultyMix,
    pub tasks: Vec<TaskEntry>,
}

/// POST /api/recommend response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecommendationResponse {
    pub request_id: Uuid,
    pub model_version: String,
    pub learner: LearnerSummary,
    pub homework: TopicHomework,
    pub explanations: ExplanationBlock,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarHomework {
    pub homework_id: String,
    pub title: String,
    pub topic: String,
    pub week_number: u32,
    pub estimated_total_time_minutes: u32,
    pub tasks: Vec<TaskEntry>,
}

/// POST /api/recommend/calendar response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecommendationResponse {
    pub request_id: Uuid,
    pub model_version: String,
    pub generated_at: DateTime<Utc>,
    pub inputs: RecommendationRequest,
    pub homework_recommendation: CalendarHomework,
    pub explanations: ExplanationBlock,
}

/// Trimmed, non-empty required string field
fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

fn budget(value: Option<u32>) -> ApiResult<Option<u32>> {
    match value {
        Some(0) => Err(ApiError::BadRequest(
            "maxTotalTimeMinutes must be a positive number".to_string(),
        )),
        other => Ok(other),
    }
}

/// Run the delegation policy for one request and check the result
///
/// Dropping this future (caller disconnected) cancels the token, which
/// abandons any in-flight external call.
async fn run(
    state: &AppState,
    request: &RecommendationRequest,
    policy: StopPolicy,
) -> ApiResult<Recommendation> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let recommendation = state.recommender.recommend(request, policy, &cancel).await?;
    recommendation
        .homework
        .check_invariants()
        .map_err(ApiError::Internal)?;
    Ok(recommendation)
}

/// POST /api/recommend
pub async fn recommend_by_topic(
    State(state): State<AppState>,
    payload: Result<Json<TopicRecommendationInput>, JsonRejection>,
) -> ApiResult<Json<TopicRecommendationResponse>> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let learner_id = required(input.learner_id, "learnerId")?;
    let topic = required(input.topic, "topic")?;
    let max_minutes = budget(input.max_total_time_minutes)?;

    let snapshot = state.store.snapshot().await;
    let request = state.normalizer.normalize(
        snapshot,
        RequestMode::Topic,
        &learner_id,
        Focus::Topic(topic),
        max_minutes,
        input.difficulty_profile,
    );

    let policy = StopPolicy::from_ratio(state.settings.adhoc_early_stop_ratio);
    let recommendation = run(&state, &request, policy).await?;

    // The path note is always reported; explain=false drops the diagnostics
    let path_note = recommendation.path.note();
    let mut explanation = recommendation.explanation;
    if input.explain == Some(false) {
        explanation.notes.retain(|note| *note == path_note);
    }

    let homework = recommendation.homework;
    Ok(Json(TopicRecommendationResponse {
        request_id: request.request_id,
        model_version: recommendation.model_version,
        learner: request.learner,
        homework: TopicHomework {
            homework_id: homework.homework_id,
            title: homework.title,
            description: homework.description,
            estimated_total_time_minutes: homework.estimated_total_minutes,
            target_difficulty_profile: homework.target_difficulty_profile,
            tasks: homework.tasks,
        },
        explanations: ExplanationBlock::new(explanation, &learner_id),
    }))
}

/// POST /api/recommend/calendar
pub async fn recommend_by_calendar(
    State(state): State<AppState>,
    payload: Result<Json<CalendarRecommendationInput>, JsonRejection>,
) -> ApiResult<Json<CalendarRecommendationResponse>> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let learner_id = required(input.learner_id, "learnerId")?;
    let max_minutes = budget(input.max_total_time_minutes)?;
    let week_number = input.week_number.unwrap_or(state.settings.default_week);

    let snapshot = state.store.snapshot().await;
    let resolution = resolve_week(snapshot.calendar(), week_number, input.topic.as_deref());
    let request = state.normalizer.normalize(
        snapshot,
        RequestMode::Calendar,
        &learner_id,
        Focus::Week {
            week: resolution.week,
            mapped: resolution.mapped,
        },
        max_minutes,
        None,
    );

    let policy = StopPolicy::from_ratio(state.settings.calendar_early_stop_ratio);
    let recommendation = run(&state, &request, policy).await?;

    let homework = recommendation.homework;
    Ok(Json(CalendarRecommendationResponse {
        request_id: request.request_id,
        model_version: recommendation.model_version,
        generated_at: Utc::now(),
        homework_recommendation: CalendarHomework {
            homework_id: homework.homework_id,
            title: homework.title,
            topic: homework.topic,
            week_number: homework.week_number.unwrap_or(week_number),
            estimated_total_time_minutes: homework.estimated_total_minutes,
            tasks: homework.tasks,
        },
        explanations: ExplanationBlock::new(recommendation.explanation, &learner_id),
        inputs: request,
    }))
}

/// Build recommendation routes
pub fn recommend_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recommend", post(recommend_by_topic))
        .route("/api/recommend/calendar", post(recommend_by_calendar))
}
