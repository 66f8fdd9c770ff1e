//! HTTP API handlers for ihw-rec

pub mod health;
pub mod recommend;

pub use health::health_routes;
pub use recommend::recommend_routes;
