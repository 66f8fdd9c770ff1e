//! ihw-rec library - homework recommendation service
//!
//! Exposes the application state and router for the binary and for
//! integration tests.

pub mod api;
pub mod engine;
pub mod error;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use ihw_common::config::RecommendationConfig;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::{Normalizer, Recommender};
use crate::store::CurriculumStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Current curriculum dataset
    pub store: CurriculumStore,
    /// Delegation policy with optional external engine
    pub recommender: Arc<Recommender>,
    pub normalizer: Normalizer,
    /// Selection tuning (defaults and stop ratios)
    pub settings: Arc<RecommendationConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: CurriculumStore,
        recommender: Recommender,
        settings: RecommendationConfig,
    ) -> Self {
        Self {
            store,
            recommender: Arc::new(recommender),
            normalizer: Normalizer::new(settings.default_budget_minutes),
            settings: Arc::new(settings),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(api::recommend_routes())
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
