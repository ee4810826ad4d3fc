// src/provider/resolver.rs — Backend identifier to a ready, retrying provider

use std::sync::Arc;
use std::time::Duration;

use super::openai::OpenAIProvider;
use super::retry::{RetryConfig, RetryProvider};
use super::{ModelProvider, ModelRef};
use crate::infra::config::Config;
use crate::infra::errors::ArborError;

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Environment variable overriding the Ollama endpoint.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Build the provider behind a backend. Missing credentials are a
/// configuration error, caught before the search issues any call.
pub fn build_provider(
    backend: &ModelRef,
    config: &Config,
) -> Result<Arc<dyn ModelProvider>, ArborError> {
    let timeout = Duration::from_secs(config.oracle.request_timeout_secs);

    let inner: Arc<dyn ModelProvider> = match backend.provider.as_str() {
        "openai" => {
            let key_env = &config.oracle.api_key_env;
            let key = std::env::var(key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    ArborError::config(format!(
                        "backend '{backend}' needs an API key in ${key_env}"
                    ))
                })?;
            Arc::new(
                OpenAIProvider::with_base_url("openai", Some(key), config.oracle.base_url.clone())
                    .with_timeout(timeout),
            )
        }
        "ollama" => {
            let base_url = std::env::var(OLLAMA_HOST_ENV)
                .ok()
                .map(|host| format!("{}/v1", host.trim_end_matches('/')))
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            Arc::new(OpenAIProvider::with_base_url("ollama", None, base_url).with_timeout(timeout))
        }
        other => {
            return Err(ArborError::config(format!(
                "unknown provider '{other}' in backend '{backend}' (known: openai, ollama)"
            )))
        }
    };

    tracing::debug!(backend = %backend, "provider resolved");
    Ok(Arc::new(RetryProvider::with_config(
        inner,
        RetryConfig::from(&config.retry),
    )))
}
