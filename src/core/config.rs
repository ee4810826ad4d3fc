// src/core/config.rs — Solve request payload and the validated search config

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infra::config::{OracleConfig, SearchDefaults};
use crate::infra::errors::ArborError;
use crate::provider::ModelRef;
use crate::tasks;

/// Prompt style for sample-mode generation (and naive runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSample {
    Standard,
    Cot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateMode {
    Sample,
    Propose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluateMode {
    Value,
    Vote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    Greedy,
    Sample,
}

macro_rules! string_enum {
    ($ty:ident, $field:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ArborError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ArborError::config(format!(
                        "unknown {} '{}' (expected one of: {})",
                        $field,
                        other,
                        [$($name),+].join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(PromptSample, "prompt_sample", { "standard" => Standard, "cot" => Cot });
string_enum!(GenerateMode, "method_generate", { "sample" => Sample, "propose" => Propose });
string_enum!(EvaluateMode, "method_evaluate", { "value" => Value, "vote" => Vote });
string_enum!(SelectMode, "method_select", { "greedy" => Greedy, "sample" => Sample });

/// Request body for a solve. Every field is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub task: Option<String>,
    /// The task instance, e.g. "4 9 10 13" for the Game of 24.
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub naive_run: Option<bool>,
    #[serde(default)]
    pub prompt_sample: Option<String>,
    #[serde(default)]
    pub method_generate: Option<String>,
    #[serde(default)]
    pub method_evaluate: Option<String>,
    #[serde(default)]
    pub method_select: Option<String>,
    #[serde(default)]
    pub n_generate_sample: Option<i64>,
    #[serde(default)]
    pub n_evaluate_sample: Option<i64>,
    #[serde(default)]
    pub n_select_sample: Option<i64>,
    #[serde(default)]
    pub time_budget_secs: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Immutable, validated parameters for one search invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub backend: ModelRef,
    pub temperature: f32,
    pub task: String,
    pub naive_run: bool,
    pub prompt_sample: PromptSample,
    pub method_generate: GenerateMode,
    pub method_evaluate: EvaluateMode,
    pub method_select: SelectMode,
    pub n_generate_sample: usize,
    pub n_evaluate_sample: usize,
    pub n_select_sample: usize,
    pub time_budget: Duration,
    pub max_concurrency: usize,
    pub max_oracle_calls: Option<u64>,
    pub seed: Option<u64>,
    pub max_tokens: u32,
    pub stop_per_step: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: ModelRef::new("openai", "gpt-4"),
            temperature: 0.7,
            task: "game24".into(),
            naive_run: false,
            prompt_sample: PromptSample::Standard,
            method_generate: GenerateMode::Propose,
            method_evaluate: EvaluateMode::Value,
            method_select: SelectMode::Greedy,
            n_generate_sample: 1,
            n_evaluate_sample: 3,
            n_select_sample: 5,
            time_budget: Duration::from_secs(900),
            max_concurrency: 8,
            max_oracle_calls: None,
            seed: None,
            max_tokens: 1000,
            stop_per_step: true,
        }
    }
}

fn positive_count(field: &str, value: Option<i64>, default: usize) -> Result<usize, ArborError> {
    match value {
        None => Ok(default),
        Some(n) if n >= 1 => Ok(n as usize),
        Some(n) => Err(ArborError::config(format!("{field} must be >= 1, got {n}"))),
    }
}

fn mode<T: FromStr<Err = ArborError>>(given: Option<&str>, default: &str) -> Result<T, ArborError> {
    given.unwrap_or(default).parse()
}

impl SearchConfig {
    /// Merge a request over the configured defaults and validate the result.
    pub fn resolve(
        request: &SolveRequest,
        defaults: &SearchDefaults,
        oracle: &OracleConfig,
    ) -> Result<Self, ArborError> {
        let backend_str = request.backend.as_deref().unwrap_or(&defaults.backend);
        let backend = ModelRef::from_backend(backend_str)
            .ok_or_else(|| ArborError::config(format!("invalid backend '{backend_str}'")))?;

        let temperature = request.temperature.unwrap_or(defaults.temperature as f64);
        let time_budget_secs = request
            .time_budget_secs
            .unwrap_or(defaults.time_budget_secs as f64);
        let time_budget = Duration::try_from_secs_f64(time_budget_secs).map_err(|_| {
            ArborError::config(format!(
                "time_budget_secs must be a non-negative number, got {time_budget_secs}"
            ))
        })?;

        let config = Self {
            backend,
            temperature: temperature as f32,
            task: request
                .task
                .clone()
                .unwrap_or_else(|| defaults.task.clone()),
            naive_run: request.naive_run.unwrap_or(false),
            prompt_sample: mode(request.prompt_sample.as_deref(), &defaults.prompt_sample)?,
            method_generate: mode(request.method_generate.as_deref(), &defaults.method_generate)?,
            method_evaluate: mode(request.method_evaluate.as_deref(), &defaults.method_evaluate)?,
            method_select: mode(request.method_select.as_deref(), &defaults.method_select)?,
            n_generate_sample: positive_count(
                "n_generate_sample",
                request.n_generate_sample,
                defaults.n_generate_sample,
            )?,
            n_evaluate_sample: positive_count(
                "n_evaluate_sample",
                request.n_evaluate_sample,
                defaults.n_evaluate_sample,
            )?,
            n_select_sample: positive_count(
                "n_select_sample",
                request.n_select_sample,
                defaults.n_select_sample,
            )?,
            time_budget,
            max_concurrency: defaults.max_concurrency,
            max_oracle_calls: defaults.max_oracle_calls,
            seed: request.seed.or(defaults.seed),
            max_tokens: oracle.max_tokens,
            stop_per_step: oracle.stop_per_step,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that hold for every config, however it was built.
    pub fn validate(&self) -> Result<(), ArborError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ArborError::config(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        for (field, n) in [
            ("n_generate_sample", self.n_generate_sample),
            ("n_evaluate_sample", self.n_evaluate_sample),
            ("n_select_sample", self.n_select_sample),
            ("max_concurrency", self.max_concurrency),
        ] {
            if n == 0 {
                return Err(ArborError::config(format!("{field} must be >= 1")));
            }
        }
        if tasks::lookup(&self.task).is_none() {
            return Err(ArborError::config(format!(
                "unknown task '{}' (known: {})",
                self.task,
                tasks::known_ids().join(", ")
            )));
        }
        Ok(())
    }
}
