use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::MAX_MATCH_LIMIT;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid embedding provider: {0}. Must be one of: openai, mock")]
    InvalidProvider(String),

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid workers: {0}. Must be at least 1")]
    InvalidWorkers(usize),

    #[error("Invalid default_limit: {0}. Must be between 1 and {max}", max = MAX_MATCH_LIMIT)]
    InvalidDefaultLimit(usize),

    #[error("Invalid diversity_weight: {0}. Must be within [0, 1]")]
    InvalidDiversityWeight(f32),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Project config file, created by `kindred init`.
pub const PROJECT_CONFIG_FILE: &str = "kindred.yaml";

/// Optional local overrides, not meant to be committed.
pub const LOCAL_CONFIG_FILE: &str = "kindred.local.yaml";

const ENV_PREFIX: &str = "KINDRED_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. kindred.yaml
    /// 3. kindred.local.yaml
    /// 4. Environment variables (`KINDRED_*`, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::extract(&figment).context("Failed to extract configuration from figment")
    }

    /// Load configuration from a specific file. Environment variables still
    /// override the file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::extract(&figment).with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn extract(figment: &Figment) -> Result<Config> {
        let config: Config = figment.extract()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        if !["json", "pretty"].contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        if !["daily", "hourly", "never"].contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if !["openai", "mock"].contains(&config.embedding.provider.as_str()) {
            return Err(ConfigError::InvalidProvider(config.embedding.provider.clone()));
        }
        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(config.embedding.dimension));
        }
        if config.embedding.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "embedding.timeout_secs must be positive".to_string(),
            ));
        }

        if config.jobs.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.jobs.max_attempts));
        }
        if config.jobs.workers == 0 {
            return Err(ConfigError::InvalidWorkers(config.jobs.workers));
        }
        if config.jobs.backoff_base_ms == 0 || config.jobs.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "jobs.backoff_base_ms and jobs.poll_interval_ms must be positive".to_string(),
            ));
        }

        if config.matching.candidate_cap == 0 {
            return Err(ConfigError::ValidationFailed(
                "matching.candidate_cap must be at least 1".to_string(),
            ));
        }
        if config.matching.default_limit == 0 || config.matching.default_limit > MAX_MATCH_LIMIT {
            return Err(ConfigError::InvalidDefaultLimit(config.matching.default_limit));
        }
        if !(0.0..=1.0).contains(&config.matching.diversity_weight) {
            return Err(ConfigError::InvalidDiversityWeight(config.matching.diversity_weight));
        }
        if config.matching.match_ttl_hours <= 0 {
            return Err(ConfigError::ValidationFailed(
                "matching.match_ttl_hours must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
