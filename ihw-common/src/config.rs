//! Bootstrap configuration loading
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`IHW_CONFIG`)
//! 3. Per-user config file (`~/.config/ihw/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing TOML file is not fatal: the service logs a warning and starts
//! with compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "IHW_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address to bind the HTTP server to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Curriculum dataset (JSON). Built-in demo data if unset.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub recommendation: RecommendationConfig,

    #[serde(default)]
    pub external_engine: ExternalEngineConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            data_file: None,
            logging: LoggingConfig::default(),
            recommendation: RecommendationConfig::default(),
            external_engine: ExternalEngineConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Selection engine tuning
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecommendationConfig {
    /// Time budget used when a request omits one
    #[serde(default = "default_budget_minutes")]
    pub default_budget_minutes: u32,

    /// Outcomes with proficiency strictly below this are weak
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: f64,

    /// Week used by the calendar flow when the request omits one
    #[serde(default = "default_week")]
    pub default_week: u32,

    /// Reported as `modelVersion` on locally produced results
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Topic flow stops once this fraction of the budget is filled
    #[serde(default = "default_adhoc_early_stop_ratio")]
    pub adhoc_early_stop_ratio: Option<f64>,

    /// Calendar flow early stop; unset means fill the full budget
    #[serde(default)]
    pub calendar_early_stop_ratio: Option<f64>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_budget_minutes: default_budget_minutes(),
            weak_threshold: default_weak_threshold(),
            default_week: default_week(),
            model_version: default_model_version(),
            adhoc_early_stop_ratio: default_adhoc_early_stop_ratio(),
            calendar_early_stop_ratio: None,
        }
    }
}

/// External scoring service
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExternalEngineConfig {
    /// Endpoint URL; delegation is disabled when unset
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ExternalEngineConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_budget_minutes() -> u32 {
    30
}

fn default_weak_threshold() -> f64 {
    0.7
}

fn default_week() -> u32 {
    1
}

fn default_model_version() -> String {
    "rules-v1".to_string()
}

fn default_adhoc_early_stop_ratio() -> Option<f64> {
    Some(0.8)
}

fn default_timeout_ms() -> u64 {
    5000
}

impl TomlConfig {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let rec = &self.recommendation;
        if rec.default_budget_minutes == 0 {
            return Err(Error::Config(
                "recommendation.default_budget_minutes must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&rec.weak_threshold) {
            return Err(Error::Config(format!(
                "recommendation.weak_threshold must be within [0, 1], got {}",
                rec.weak_threshold
            )));
        }
        for (key, ratio) in [
            ("adhoc_early_stop_ratio", rec.adhoc_early_stop_ratio),
            ("calendar_early_stop_ratio", rec.calendar_early_stop_ratio),
        ] {
            if let Some(r) = ratio {
                if !(r > 0.0 && r <= 1.0) {
                    return Err(Error::Config(format!(
                        "recommendation.{} must be within (0, 1], got {}",
                        key, r
                    )));
                }
            }
        }
        if self.external_engine.timeout_ms == 0 {
            return Err(Error::Config(
                "external_engine.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Returns `None` when no candidate is given and no default file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    dirs::config_dir()
        .map(|d| d.join("ihw").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load TOML config from `path`, degrading to defaults if it is missing
///
/// Parse and validation failures are errors.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found; using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file not found: {}; using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    config.validate()?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.recommendation.default_budget_minutes, 30);
        assert_eq!(config.recommendation.weak_threshold, 0.7);
        assert_eq!(config.recommendation.adhoc_early_stop_ratio, Some(0.8));
        assert_eq!(config.recommendation.calendar_early_stop_ratio, None);
        assert!(config.external_engine.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080

            [external_engine]
            url = "http://scoring.local/recommend"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(
            config.external_engine.url.as_deref(),
            Some("http://scoring.local/recommend")
        );
        assert_eq!(config.external_engine.timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        let mut config = TomlConfig::default();
        config.recommendation.calendar_early_stop_ratio = Some(1.5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = TomlConfig::default();
        config.recommendation.default_budget_minutes = 0;
        assert!(config.validate().is_err());
    }
}
