//! # IHW Common Library
//!
//! Shared code for the homework recommendation services:
//! - Curriculum data model (catalogue items, calendar, learner mastery)
//! - Dataset loading, including the built-in demo curriculum
//! - Bootstrap configuration (TOML)
//! - Common error type

pub mod config;
pub mod dataset;
pub mod error;
pub mod models;

pub use dataset::Dataset;
pub use error::{Error, Result};
