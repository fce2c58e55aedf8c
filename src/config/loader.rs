//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::HitCounterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `downstream.target`.
pub const ENV_DOWNSTREAM: &str = "DOWNSTREAM_FUNCTION_NAME";
/// Overrides `store.table`.
pub const ENV_TABLE: &str = "HITS_TABLE_NAME";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate.
pub fn load_config(path: Option<&Path>) -> Result<HitCounterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => HitCounterConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse TOML text without validating.
pub fn parse_config(content: &str) -> Result<HitCounterConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply deployment-provided overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut HitCounterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(target) = lookup(ENV_DOWNSTREAM).filter(|v| !v.is_empty()) {
        tracing::debug!(target_ref = %target, "Downstream target overridden from environment");
        config.downstream.target = target;
    }
    if let Some(table) = lookup(ENV_TABLE).filter(|v| !v.is_empty()) {
        tracing::debug!(table = %table, "Counter table overridden from environment");
        config.store.table = table;
    }
}
