// src/core/solver.rs — One solve request in, one response out

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::config::{SearchConfig, SolveRequest};
use super::controller::SearchController;
use super::types::SolveResponse;
use crate::infra::config::Config;
use crate::infra::errors::ArborError;
use crate::provider::resolver;
use crate::provider::ModelProvider;
use crate::tasks;

/// Resolves requests against the loaded config and runs searches. Shared by
/// the CLI and the HTTP handlers.
pub struct Solver {
    config: Config,
    provider: Option<Arc<dyn ModelProvider>>,
    limiter: Option<Arc<Semaphore>>,
}

impl Solver {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider: None,
            limiter: None,
        }
    }

    /// Use this provider for every backend instead of resolving one.
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Cap in-flight oracle calls across every search this solver runs at
    /// `[search].max_concurrency`. Call budgets and usage stay per search.
    pub fn with_shared_limiter(mut self) -> Self {
        let permits = self.config.search.max_concurrency.max(1);
        self.limiter = Some(Arc::new(Semaphore::new(permits)));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate everything up front; configuration errors are the only
    /// failure a solve returns.
    pub async fn solve(&self, request: &SolveRequest) -> Result<SolveResponse, ArborError> {
        let search = SearchConfig::resolve(request, &self.config.search, &self.config.oracle)?;
        let task = tasks::lookup(&search.task)
            .ok_or_else(|| ArborError::config(format!("unknown task '{}'", search.task)))?;

        let input = request
            .input
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.config.search.input)
            .to_string();
        task.validate_input(&input)?;

        let provider = match &self.provider {
            Some(p) => p.clone(),
            None => resolver::build_provider(&search.backend, &self.config)?,
        };

        let mut controller = SearchController::new(provider, task.clone(), search)?;
        if let Some(limiter) = &self.limiter {
            controller = controller.with_call_limiter(limiter.clone());
        }
        let outcome = controller.run(&input).await?;
        Ok(SolveResponse::from_outcome(outcome, task.as_ref(), &input))
    }
}
