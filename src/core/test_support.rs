// src/core/test_support.rs — Scripted provider and stub task for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::config::PromptSample;
use super::types::ThoughtState;
use crate::infra::errors::ArborError;
use crate::provider::{ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::tasks::Task;

type Responder = Box<dyn Fn(&str, usize) -> Result<String, ArborError> + Send + Sync>;

/// Answers every prompt through a closure of (prompt, call index).
pub struct ScriptedProvider {
    responder: Responder,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(
        responder: impl Fn(&str, usize) -> Result<String, ArborError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_, _| {
            Err(ArborError::Provider {
                provider: "scripted".into(),
                message: "boom".into(),
                retriable: false,
            })
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ArborError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let content = (self.responder)(&prompt, n)?;
        Ok(ChatResponse {
            content,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
            stop_reason: StopReason::EndTurn,
        })
    }
}

/// Task whose prompts are easy to recognise in a responder:
/// "GENERATE <depth>", "PROPOSE <depth>", "VALUE <text>", "VOTE <n>".
pub struct StubTask {
    pub steps: usize,
}

impl StubTask {
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }
}

impl Task for StubTask {
    fn id(&self) -> &str {
        "stub"
    }

    fn steps(&self) -> usize {
        self.steps
    }

    fn stop(&self, _depth: usize) -> Option<&str> {
        Some("\n")
    }

    fn sample_prompt(
        &self,
        _input: &str,
        state: &ThoughtState,
        _style: PromptSample,
    ) -> Result<String, ArborError> {
        Ok(format!("GENERATE {}", state.depth()))
    }

    fn propose_prompt(&self, _input: &str, state: &ThoughtState) -> Result<String, ArborError> {
        Ok(format!("PROPOSE {}", state.depth()))
    }

    fn parse_proposals(&self, _state: &ThoughtState, output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    fn value_prompt(&self, _input: &str, state: &ThoughtState) -> Result<String, ArborError> {
        Ok(format!("VALUE {}", state.text()))
    }

    fn vote_prompt(&self, _input: &str, states: &[&ThoughtState]) -> Result<String, ArborError> {
        Ok(format!("VOTE {}", states.len()))
    }

    fn test_output(&self, _input: &str, output: &str) -> bool {
        output.contains("solved")
    }
}
