// src/provider/meter.rs — Oracle call accounting shared by concurrent calls

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::TokenUsage;

/// Counts oracle calls, failures and tokens across every in-flight call of a
/// search. All updates are lock-free increments.
#[derive(Debug, Default)]
pub struct OracleMeter {
    calls: AtomicU64,
    failures: AtomicU64,
    refused: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    max_calls: Option<u64>,
}

/// Point-in-time copy of the meter, serialized into responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub calls: u64,
    pub failures: u64,
    pub refused: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

impl OracleMeter {
    pub fn new(max_calls: Option<u64>) -> Self {
        Self {
            max_calls,
            ..Default::default()
        }
    }

    /// Reserve one call against the cap. Returns false once the cap is reached.
    pub fn try_acquire(&self) -> bool {
        let Some(max) = self.max_calls else {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return true;
        };
        let acquired = self
            .calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok();
        if !acquired {
            self.refused.fetch_add(1, Ordering::SeqCst);
        }
        acquired
    }

    pub fn record_usage(&self, usage: &TokenUsage) {
        self.input_tokens
            .fetch_add(usage.input_tokens as u64, Ordering::SeqCst);
        self.output_tokens
            .fetch_add(usage.output_tokens as u64, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, model: &str) -> UsageReport {
        let input_tokens = self.input_tokens.load(Ordering::SeqCst);
        let output_tokens = self.output_tokens.load(Ordering::SeqCst);
        UsageReport {
            calls: self.calls(),
            failures: self.failures(),
            refused: self.refused.load(Ordering::SeqCst),
            input_tokens,
            output_tokens,
            cost_usd: calculate_cost(model, input_tokens, output_tokens),
        }
    }
}

pub fn calculate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    let (input_price, output_price) = model_pricing(model);
    (input_tokens as f64 / 1_000_000.0) * input_price
        + (output_tokens as f64 / 1_000_000.0) * output_price
}

/// Returns (input_price_per_mtok, output_price_per_mtok).
pub fn model_pricing(model: &str) -> (f64, f64) {
    match model {
        m if m.contains("gpt-4o-mini") => (0.15, 0.6),
        m if m.contains("gpt-4o") => (2.5, 10.0),
        m if m.contains("gpt-4.1-mini") => (0.4, 1.6),
        m if m.contains("gpt-4.1") => (2.0, 8.0),
        m if m.contains("gpt-4") => (30.0, 60.0),
        m if m.contains("gpt-3.5-turbo") => (1.5, 2.0),
        m if m.contains("o3-mini") || m.contains("o4-mini") => (1.1, 4.4),

        // Local models
        m if m.contains("llama")
            || m.contains("mistral")
            || m.contains("gemma")
            || m.contains("qwen") =>
        {
            (0.0, 0.0)
        }

        _ => (3.0, 15.0),
    }
}
