// src/provider/oracle.rs — Oracle client used by the search core
//
// One prompt in, one completion out. Every call is metered, refused once the
// call cap is hit, and bounded by the search deadline.

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::meter::{OracleMeter, UsageReport};
use super::{ChatRequest, Message, ModelProvider};
use crate::core::deadline::Deadline;
use crate::infra::errors::ArborError;

pub struct Oracle {
    provider: Arc<dyn ModelProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    meter: Arc<OracleMeter>,
    deadline: Deadline,
    /// Caps in-flight requests; rounds fan out wider than a backend allows.
    permits: Option<Arc<Semaphore>>,
}

impl Oracle {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1000,
            meter: Arc::new(OracleMeter::default()),
            deadline: Deadline::unbounded(),
            permits: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_meter(mut self, meter: Arc<OracleMeter>) -> Self {
        self.meter = meter;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_concurrency(self, max_in_flight: usize) -> Self {
        self.with_permits(Arc::new(Semaphore::new(max_in_flight.max(1))))
    }

    /// Draw in-flight permits from a pool that may be shared with other
    /// oracles.
    pub fn with_permits(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = Some(permits);
        self
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub fn meter(&self) -> &OracleMeter {
        &self.meter
    }

    pub fn usage(&self) -> UsageReport {
        self.meter.snapshot(&self.model)
    }

    /// Issue one completion. `stop` ends generation at the first match.
    pub async fn complete(&self, prompt: &str, stop: Option<&str>) -> Result<String, ArborError> {
        if self.deadline.expired() {
            return Err(ArborError::DeadlineExceeded);
        }
        if !self.meter.try_acquire() {
            self.meter.record_failure();
            return Err(ArborError::OracleUnavailable {
                message: "oracle call budget exhausted".into(),
            });
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            stop: stop.map(|s| vec![s.to_string()]).unwrap_or_default(),
            system: None,
        };

        let call = async {
            let _permit = match &self.permits {
                Some(sem) => Some(sem.acquire().await.map_err(|_| {
                    ArborError::OracleUnavailable {
                        message: "oracle closed".into(),
                    }
                })?),
                None => None,
            };
            self.provider.chat(request).await
        };

        let result = match self.deadline.remaining() {
            Some(left) => tokio::time::timeout(left, call)
                .await
                .unwrap_or(Err(ArborError::DeadlineExceeded)),
            None => call.await,
        };

        match result {
            Ok(response) => {
                self.meter.record_usage(&response.usage);
                tracing::debug!(
                    model = %self.model,
                    output_tokens = response.usage.output_tokens,
                    "oracle call completed"
                );
                Ok(response.content)
            }
            Err(e) => {
                self.meter.record_failure();
                tracing::warn!(model = %self.model, "oracle call failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ScriptedProvider;
    use std::time::Duration;

    #[tokio::test]
    async fn test_complete_returns_content_and_meters() {
        let provider = Arc::new(ScriptedProvider::constant("sure"));
        let oracle = Oracle::new(provider.clone(), "gpt-4");
        assert_eq!(oracle.complete("judge", None).await.unwrap(), "sure");
        let usage = oracle.usage();
        assert_eq!(usage.calls, 1);
        assert_eq!(usage.failures, 0);
        assert_eq!(usage.input_tokens, 10);
    }

    #[tokio::test]
    async fn test_stop_sequence_forwarded() {
        let provider = Arc::new(ScriptedProvider::constant("x"));
        let oracle = Oracle::new(provider.clone(), "gpt-4");
        oracle.complete("p", Some("\n")).await.unwrap();
        let seen = provider.requests();
        assert_eq!(seen[0].stop, vec!["\n".to_string()]);
        assert_eq!(seen[0].temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_expired_deadline_issues_no_call() {
        let provider = Arc::new(ScriptedProvider::constant("x"));
        let oracle = Oracle::new(provider.clone(), "gpt-4")
            .with_deadline(Deadline::after(Duration::ZERO));
        let err = oracle.complete("p", None).await.unwrap_err();
        assert!(matches!(err, ArborError::DeadlineExceeded));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_call_cap_refuses() {
        let provider = Arc::new(ScriptedProvider::constant("x"));
        let oracle = Oracle::new(provider.clone(), "gpt-4")
            .with_meter(Arc::new(OracleMeter::new(Some(1))));
        assert!(oracle.complete("p", None).await.is_ok());
        let err = oracle.complete("p", None).await.unwrap_err();
        assert!(matches!(err, ArborError::OracleUnavailable { .. }));
        assert_eq!(provider.call_count(), 1);
        assert_eq!(oracle.usage().failures, 1);
    }

    #[tokio::test]
    async fn test_concurrency_limit_serializes_calls() {
        let provider =
            Arc::new(ScriptedProvider::constant("x").with_delay(Duration::from_millis(30)));
        let oracle = Oracle::new(provider.clone(), "gpt-4").with_concurrency(1);
        let start = std::time::Instant::now();
        let (a, b) = tokio::join!(oracle.complete("a", None), oracle.complete("b", None));
        assert!(a.is_ok() && b.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(55));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_slow_call_abandoned_at_deadline() {
        let provider =
            Arc::new(ScriptedProvider::constant("late").with_delay(Duration::from_secs(30)));
        let oracle = Oracle::new(provider, "gpt-4")
            .with_deadline(Deadline::after(Duration::from_millis(20)));
        let err = oracle.complete("p", None).await.unwrap_err();
        assert!(matches!(err, ArborError::DeadlineExceeded));
        assert_eq!(oracle.usage().failures, 1);
    }
}
