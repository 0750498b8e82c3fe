//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use mindbloom_core::constants::{
    ATTRIBUTION_SEED, DEFAULT_BACKGROUND_ROWS, DEFAULT_FOLLOW_UP_DAYS, DEFAULT_FOLLOW_UP_METHOD, DEFAULT_PERMUTATIONS,
    DEFAULT_SAMPLING_BUDGET_MS, DEFAULT_TOP_K,
};
use mindbloom_core::logic::explain::ExplainerConfig;
use mindbloom_core::EngineConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server port
    pub port: u16,

    /// Classifier artifact (JSON envelope or .onnx)
    pub model_path: String,

    /// Schema sidecar for ONNX models
    pub model_schema_path: Option<String>,

    /// Replacement label encoding table
    pub encoding_table_path: Option<String>,

    /// Training rows for sampling attribution
    pub background_data_path: Option<String>,

    pub background_sample_size: usize,

    /// Ranked contributions returned when the request does not say
    pub explain_top_k: usize,

    /// Upper bound on the explanation stage of a prediction request
    pub explain_timeout_ms: u64,

    pub sampling_permutations: usize,

    /// Days until the follow-up reminder
    pub follow_up_days: i64,

    pub follow_up_method: String,

    /// Labeled snapshots and the rolling labeled dataset
    pub export_dir: String,

    pub llm: LlmConfig,

    /// Environment (development, production)
    pub environment: String,
}

/// OpenAI-compatible chat provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            provider: non_empty("LLM_PROVIDER"),
            api_key: non_empty("LLM_API_KEY"),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            base_url: env::var("LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        }
    }

    /// A key is configured and the provider is not explicitly switched off
    pub fn is_enabled(&self) -> bool {
        let disabled = matches!(self.provider.as_deref(), Some("none") | Some("rules"));
        !disabled && self.api_key.is_some()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mindbloom.db?mode=rwc".to_string()),

            port: parsed("PORT", 8000),

            model_path: env::var("MODEL_PATH").unwrap_or_else(|_| "models/ppd_model.json".to_string()),
            model_schema_path: non_empty("MODEL_SCHEMA_PATH"),
            encoding_table_path: non_empty("ENCODING_TABLE_PATH"),
            background_data_path: non_empty("BACKGROUND_DATA_PATH"),
            background_sample_size: parsed("BACKGROUND_SAMPLE_SIZE", DEFAULT_BACKGROUND_ROWS).max(1),

            explain_top_k: parsed("EXPLAIN_TOP_K", DEFAULT_TOP_K).max(1),
            explain_timeout_ms: parsed("EXPLAIN_TIMEOUT_MS", 2000),
            sampling_permutations: parsed("SAMPLING_PERMUTATIONS", DEFAULT_PERMUTATIONS).max(1),

            follow_up_days: parsed("FOLLOW_UP_DAYS", DEFAULT_FOLLOW_UP_DAYS),
            follow_up_method: env::var("FOLLOW_UP_METHOD").unwrap_or_else(|_| DEFAULT_FOLLOW_UP_METHOD.to_string()),
            export_dir: env::var("EXPORT_DIR").unwrap_or_else(|_| "collected_data".to_string()),

            llm: LlmConfig::from_env(),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn explain_timeout(&self) -> Duration {
        Duration::from_millis(self.explain_timeout_ms)
    }

    /// Artifact locations and attribution settings for the core engine
    pub fn engine_config(&self) -> EngineConfig {
        // Sampling must give up before the request-level timeout does
        let budget_ms = DEFAULT_SAMPLING_BUDGET_MS.min(self.explain_timeout_ms);

        EngineConfig {
            model_path: PathBuf::from(&self.model_path),
            schema_path: self.model_schema_path.as_ref().map(PathBuf::from),
            encoding_table_path: self.encoding_table_path.as_ref().map(PathBuf::from),
            background_path: self.background_data_path.as_ref().map(PathBuf::from),
            top_k: self.explain_top_k,
            explainer: ExplainerConfig {
                permutations: self.sampling_permutations,
                seed: ATTRIBUTION_SEED,
                background_rows: self.background_sample_size,
                sampling_budget: Duration::from_millis(budget_ms),
            },
        }
    }
}
