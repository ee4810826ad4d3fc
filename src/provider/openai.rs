// src/provider/openai.rs — OpenAI-compatible Chat Completions provider
//
// Also serves local OpenAI-compatible endpoints (Ollama's /v1) when built
// without an API key.

use async_trait::async_trait;
use std::time::Duration;

use super::{ChatRequest, ChatResponse, ModelProvider, Role, StopReason, TokenUsage};
use crate::infra::errors::ArborError;

/// Fallback wait when a 429 carries no usable Retry-After header.
const DEFAULT_RETRY_AFTER_MS: u64 = 5_000;

pub struct OpenAIProvider {
    id: String,
    api_key: Option<String>,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url("openai", Some(api_key), "https://api.openai.com/v1".into())
    }

    pub fn with_base_url(id: impl Into<String>, api_key: Option<String>, base_url: String) -> Self {
        Self {
            id: id.into(),
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Apply a per-request timeout to every call made by this provider.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        self
    }

    fn build_body(request: &ChatRequest) -> serde_json::Value {
        let mut msgs = Vec::new();

        if let Some(system) = &request.system {
            msgs.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }

        for m in &request.messages {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            msgs.push(serde_json::json!({
                "role": role,
                "content": m.content,
            }));
        }

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": msgs,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if !request.stop.is_empty() {
            body["stop"] = serde_json::json!(request.stop);
        }
        body
    }
}

/// Parse a Retry-After header given in whole seconds.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
        .unwrap_or(DEFAULT_RETRY_AFTER_MS)
}

fn parse_response(resp: &serde_json::Value) -> ChatResponse {
    let choice = &resp["choices"][0];
    let content = choice["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };

    let stop_reason = match choice["finish_reason"].as_str() {
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::Unknown,
    };

    ChatResponse {
        content,
        usage,
        stop_reason,
    }
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "OpenAI-compatible"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ArborError> {
        let body = Self::build_body(&request);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| ArborError::Provider {
            provider: self.id.clone(),
            message: e.to_string(),
            retriable: e.is_timeout() || e.is_connect(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ArborError::RateLimited {
                provider: self.id.clone(),
                retry_after_ms: retry_after_ms(response.headers()),
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ArborError::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| ArborError::Provider {
            provider: self.id.clone(),
            message: format!("Failed to parse response: {}", e),
            retriable: false,
        })?;

        Ok(parse_response(&resp))
    }
}
