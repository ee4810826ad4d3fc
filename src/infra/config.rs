// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::ArborError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub search: SearchDefaults,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub api: ApiConfig,
}

/// Where and how oracle calls are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// Stop generation at the end of each step in sample mode.
    pub stop_per_step: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            max_tokens: 1000,
            request_timeout_secs: 120,
            stop_per_step: true,
        }
    }
}

/// Values used for any field a solve request leaves out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub backend: String,
    pub temperature: f32,
    pub task: String,
    pub input: String,
    pub prompt_sample: String,
    pub method_generate: String,
    pub method_evaluate: String,
    pub method_select: String,
    pub n_generate_sample: usize,
    pub n_evaluate_sample: usize,
    pub n_select_sample: usize,
    pub time_budget_secs: u64,
    pub max_concurrency: usize,
    pub max_oracle_calls: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            backend: "gpt-4".into(),
            temperature: 0.7,
            task: "game24".into(),
            input: "4 9 10 13".into(),
            prompt_sample: "standard".into(),
            method_generate: "propose".into(),
            method_evaluate: "value".into(),
            method_select: "greedy".into(),
            n_generate_sample: 1,
            n_evaluate_sample: 3,
            n_select_sample: 5,
            time_budget_secs: 900,
            max_concurrency: 8,
            max_oracle_calls: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub jitter_fraction: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
            jitter_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
    /// Bearer token required on /solve when set.
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            token: None,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, ArborError> {
        match paths::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ArborError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
