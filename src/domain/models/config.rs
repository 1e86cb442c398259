use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::embedding::JobOptions;

/// Main configuration structure for Kindred
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Embedding job queue configuration
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Candidate retrieval and ranking configuration
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".kindred/kindred.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Provider name: openai or mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name sent to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Expected vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_dimension() -> usize {
    1536
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Embedding job queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobsConfig {
    /// Provider attempts per job before it is marked failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay; doubles on each subsequent attempt
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Concurrent workers in the pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Idle poll interval when no enqueue notification arrives
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_base_ms() -> u64 {
    2_000
}

const fn default_workers() -> usize {
    4
}

const fn default_poll_interval_ms() -> u64 {
    1_000
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl JobsConfig {
    pub fn job_options(&self) -> JobOptions {
        JobOptions {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Candidate retrieval and ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MatchingConfig {
    /// Upper bound on candidates pulled into one scoring pass
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,

    /// Suggestions returned when a request omits a limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Weight of diversity in the final score when a request omits it
    #[serde(default = "default_diversity_weight")]
    pub diversity_weight: f32,

    /// Hours an unanswered acceptance stays open
    #[serde(default = "default_match_ttl_hours")]
    pub match_ttl_hours: i64,
}

const fn default_candidate_cap() -> usize {
    100
}

const fn default_limit() -> usize {
    super::contracts::DEFAULT_MATCH_LIMIT
}

const fn default_diversity_weight() -> f32 {
    0.3
}

const fn default_match_ttl_hours() -> i64 {
    14 * 24
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            candidate_cap: default_candidate_cap(),
            default_limit: default_limit(),
            diversity_weight: default_diversity_weight(),
            match_ttl_hours: default_match_ttl_hours(),
        }
    }
}

impl MatchingConfig {
    pub fn match_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.match_ttl_hours)
    }
}
