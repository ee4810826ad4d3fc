// src/core/controller.rs — Search controller: the round-by-round BFS loop
//
// INIT -> ROUND(0) .. ROUND(T-1) -> DONE, or INIT -> NAIVE -> DONE.
// Rounds run strictly one after another; work inside a round runs
// concurrently. A round that times out or produces nothing ends the search
// with the frontier from before that round.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Semaphore;

use super::config::SearchConfig;
use super::deadline::Deadline;
use super::evaluator::{self, ThoughtEvaluator};
use super::generator::{self, SampleGenerator, ThoughtGenerator};
use super::selector::{self, Selector};
use super::trace::{CandidateRecord, RoundOutcome, RoundRecord, Trace};
use super::types::{
    Candidate, FrontierMember, ScoredCandidate, SearchContext, SearchOutcome, SearchStatus,
    ThoughtState,
};
use crate::infra::errors::ArborError;
use crate::provider::meter::OracleMeter;
use crate::provider::oracle::Oracle;
use crate::provider::ModelProvider;
use crate::tasks::Task;

pub struct SearchController {
    provider: Arc<dyn ModelProvider>,
    task: Arc<dyn Task>,
    config: SearchConfig,
    /// In-flight call pool shared with other searches, if any.
    permits: Option<Arc<Semaphore>>,
    generator: Box<dyn ThoughtGenerator>,
    evaluator: Box<dyn ThoughtEvaluator>,
    selector: Box<dyn Selector>,
}

/// Oracle counters at the start of a round.
struct RoundStart {
    at: Instant,
    calls: u64,
    failures: u64,
}

impl SearchController {
    /// Validates the config and picks the strategies once.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        task: Arc<dyn Task>,
        config: SearchConfig,
    ) -> Result<Self, ArborError> {
        config.validate()?;
        Ok(Self {
            generator: generator::for_mode(config.method_generate),
            evaluator: evaluator::for_mode(config.method_evaluate),
            selector: selector::for_mode(config.method_select, config.seed),
            provider,
            task,
            config,
            permits: None,
        })
    }

    /// Bound in-flight calls by a pool shared with other searches. Budget
    /// and usage stay per search.
    pub fn with_call_limiter(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = Some(permits);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// A fresh oracle per run: its meter carries this search's call budget,
    /// usage and per-round counters.
    fn oracle(&self, deadline: Deadline) -> Oracle {
        let oracle = Oracle::new(self.provider.clone(), self.config.backend.model.clone())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
            .with_meter(Arc::new(OracleMeter::new(self.config.max_oracle_calls)))
            .with_deadline(deadline);
        match &self.permits {
            Some(permits) => oracle.with_permits(permits.clone()),
            None => oracle.with_concurrency(self.config.max_concurrency),
        }
    }

    /// Run one search over `input`. Only a rejected input is an error;
    /// timeouts and dead rounds come back as a degraded outcome.
    pub async fn run(&mut self, input: &str) -> Result<SearchOutcome, ArborError> {
        self.task.validate_input(input)?;

        let deadline = Deadline::after(self.config.time_budget);
        let oracle = self.oracle(deadline);
        let ctx = SearchContext {
            oracle: &oracle,
            task: self.task.as_ref(),
            input,
            config: &self.config,
        };

        tracing::info!(
            task = self.task.id(),
            backend = %self.config.backend,
            generate = %self.config.method_generate,
            evaluate = %self.config.method_evaluate,
            select = %self.config.method_select,
            naive = self.config.naive_run,
            "search started"
        );

        let mut trace = Trace::new();
        let (frontier, status) = if self.config.naive_run {
            naive(&ctx).await
        } else {
            rounds(
                &ctx,
                self.generator.as_ref(),
                self.evaluator.as_ref(),
                self.selector.as_mut(),
                &mut trace,
            )
            .await
        };

        let usage = oracle.usage();
        tracing::info!(
            status = ?status,
            rounds = trace.len(),
            frontier = frontier.len(),
            calls = usage.calls,
            failures = usage.failures,
            "search finished"
        );
        Ok(SearchOutcome {
            frontier,
            status,
            trace,
            usage,
        })
    }
}

/// One generator call at full depth; no evaluation, no selection.
async fn naive(ctx: &SearchContext<'_>) -> (Vec<FrontierMember>, SearchStatus) {
    let generated = SampleGenerator.one_shot(ctx).await;
    if generated.is_empty() {
        let status = if ctx.oracle.deadline().expired() {
            SearchStatus::TimedOut
        } else {
            SearchStatus::EmptyFrontier
        };
        tracing::warn!(status = ?status, "naive run produced nothing");
        return (vec![FrontierMember::root()], status);
    }
    let frontier = generated
        .into_iter()
        .map(|g| FrontierMember::unscored(g.state))
        .collect();
    (frontier, SearchStatus::Complete)
}

async fn rounds(
    ctx: &SearchContext<'_>,
    generator: &dyn ThoughtGenerator,
    evaluator: &dyn ThoughtEvaluator,
    selector: &mut dyn Selector,
    trace: &mut Trace,
) -> (Vec<FrontierMember>, SearchStatus) {
    let deadline = ctx.oracle.deadline();
    let meter = ctx.oracle.meter();
    let mut frontier = vec![FrontierMember::root()];

    for round in 0..ctx.task.steps() {
        let start = RoundStart {
            at: Instant::now(),
            calls: meter.calls(),
            failures: meter.failures(),
        };
        let parents: Vec<String> = frontier.iter().map(|m| m.state.text()).collect();

        if deadline.expired() {
            trace.push(record(round, parents, &[], &[], RoundOutcome::TimedOut, &start, meter));
            tracing::warn!(round, "time budget exhausted before round");
            return (frontier, SearchStatus::TimedOut);
        }

        // Expand every live state; global order is parent-major.
        let expansions = join_all(frontier.iter().map(|m| generator.expand(ctx, &m.state))).await;
        let candidates: Vec<Candidate> = expansions
            .into_iter()
            .enumerate()
            .flat_map(|(parent, generated)| {
                generated.into_iter().map(move |g| (parent, g))
            })
            .enumerate()
            .map(|(order, (parent, g))| Candidate {
                state: Arc::new(g.state),
                parent,
                call: g.call,
                order,
            })
            .collect();

        if deadline.expired() {
            trace.push(record(round, parents, &[], &[], RoundOutcome::TimedOut, &start, meter));
            tracing::warn!(round, "time budget exhausted during generation");
            return (frontier, SearchStatus::TimedOut);
        }
        if candidates.is_empty() {
            trace.push(record(round, parents, &[], &[], RoundOutcome::EmptyFrontier, &start, meter));
            tracing::warn!(round, "round produced no candidates");
            return (frontier, SearchStatus::EmptyFrontier);
        }

        let scored = evaluator.score(ctx, candidates).await;
        if deadline.expired() {
            trace.push(record(round, parents, &scored, &[], RoundOutcome::TimedOut, &start, meter));
            tracing::warn!(round, "time budget exhausted during evaluation");
            return (frontier, SearchStatus::TimedOut);
        }

        let selected = selector.select(&scored, ctx.config.n_select_sample);
        frontier = selected
            .iter()
            .filter_map(|&i| scored.get(i))
            .map(|s| FrontierMember {
                state: with_judgment(s),
                score: Some(s.score),
            })
            .collect();

        tracing::info!(
            round,
            candidates = scored.len(),
            selected = frontier.len(),
            best = frontier
                .iter()
                .filter_map(|m| m.score)
                .fold(f64::NEG_INFINITY, f64::max),
            "round complete"
        );
        trace.push(record(round, parents, &scored, &selected, RoundOutcome::Selected, &start, meter));
    }

    (frontier, SearchStatus::Complete)
}

/// The selected state, carrying the evaluator text that scored it.
fn with_judgment(scored: &ScoredCandidate) -> Arc<ThoughtState> {
    if scored.raw.is_empty() {
        return scored.candidate.state.clone();
    }
    Arc::new(scored.candidate.state.with_partial_eval(scored.raw.join("\n")))
}

fn record(
    round: usize,
    frontier: Vec<String>,
    scored: &[ScoredCandidate],
    selected: &[usize],
    outcome: RoundOutcome,
    start: &RoundStart,
    meter: &OracleMeter,
) -> RoundRecord {
    RoundRecord {
        round,
        frontier,
        candidates: scored
            .iter()
            .map(|s| CandidateRecord {
                text: s.candidate.state.text(),
                parent: s.candidate.parent,
                score: Some(s.score),
                raw: s.raw.clone(),
            })
            .collect(),
        selected: selected.to_vec(),
        outcome,
        oracle_calls: meter.calls().saturating_sub(start.calls),
        oracle_failures: meter.failures().saturating_sub(start.failures),
        elapsed_ms: start.at.elapsed().as_millis() as u64,
    }
}
