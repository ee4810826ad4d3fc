// src/core/evaluator.rs — Scores a round's candidates by value or by vote
//
// Every candidate handed in comes back scored. A failed oracle call adds
// nothing; only a candidate whose calls all failed drops to SENTINEL_SCORE.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;

use super::config::EvaluateMode;
use super::eval_cache::{CachedValue, ValueCache};
use super::types::{Candidate, ScoredCandidate, SearchContext, ThoughtState, SENTINEL_SCORE};
use crate::infra::errors::ArborError;
use crate::util::{last_word, truncate_str};

/// Qualitative judgment returned by a value call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Impossible,
    Likely,
    Sure,
}

impl Judgment {
    /// Read the judgment from the last word of the last non-empty line.
    pub fn parse(output: &str) -> Option<Self> {
        match last_word(output)?.as_str() {
            "impossible" => Some(Self::Impossible),
            "likely" => Some(Self::Likely),
            "sure" | "certain" => Some(Self::Sure),
            _ => None,
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Self::Impossible => 0.0,
            Self::Likely => 1.0,
            Self::Sure => 20.0,
        }
    }
}

/// Sum of lexicon weights. Unknown judgments add nothing.
pub fn aggregate_judgments<S: AsRef<str>>(outputs: &[S]) -> f64 {
    outputs
        .iter()
        .filter_map(|o| Judgment::parse(o.as_ref()))
        .map(Judgment::weight)
        .sum()
}

#[async_trait]
pub trait ThoughtEvaluator: Send + Sync {
    fn mode(&self) -> EvaluateMode;

    /// Score every candidate, in input order.
    async fn score(&self, ctx: &SearchContext<'_>, candidates: Vec<Candidate>)
        -> Vec<ScoredCandidate>;
}

pub fn for_mode(mode: EvaluateMode) -> Box<dyn ThoughtEvaluator> {
    match mode {
        EvaluateMode::Value => Box::new(ValueEvaluator::new()),
        EvaluateMode::Vote => Box::new(VoteEvaluator),
    }
}

/// `n_evaluate_sample` judgments per distinct value prompt, summed through
/// the lexicon. Scores are memoized by prompt for the lifetime of the
/// evaluator.
pub struct ValueEvaluator {
    cache: ValueCache,
}

/// How a candidate's value is obtained.
enum ValueSource {
    Known(CachedValue),
    Prompt(String),
}

fn sentinel_value() -> CachedValue {
    CachedValue {
        score: SENTINEL_SCORE,
        raw: Vec::new(),
    }
}

impl Default for ValueEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueEvaluator {
    pub fn new() -> Self {
        Self {
            cache: ValueCache::new(),
        }
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }

    fn source(&self, ctx: &SearchContext<'_>, state: &ThoughtState) -> ValueSource {
        if let Some(score) = ctx.task.static_value(state) {
            return ValueSource::Known(CachedValue { score, raw: Vec::new() });
        }
        match ctx.task.value_prompt(ctx.input, state) {
            Ok(prompt) => ValueSource::Prompt(prompt),
            Err(e) => {
                tracing::warn!("value prompt failed: {}", e);
                ValueSource::Known(sentinel_value())
            }
        }
    }

    async fn ask(&self, ctx: &SearchContext<'_>, prompt: &str) -> CachedValue {
        let calls = (0..ctx.config.n_evaluate_sample).map(|_| ctx.oracle.complete(prompt, None));
        let outputs: Vec<String> = join_all(calls)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        if outputs.is_empty() {
            return sentinel_value();
        }
        for output in &outputs {
            if Judgment::parse(output).is_none() {
                let err = ArborError::MalformedOutput {
                    what: "value judgment".into(),
                    output: truncate_str(output, 120).to_string(),
                };
                tracing::warn!("{}", err);
            }
        }
        CachedValue {
            score: aggregate_judgments(&outputs),
            raw: outputs,
        }
    }
}

#[async_trait]
impl ThoughtEvaluator for ValueEvaluator {
    fn mode(&self) -> EvaluateMode {
        EvaluateMode::Value
    }

    async fn score(
        &self,
        ctx: &SearchContext<'_>,
        candidates: Vec<Candidate>,
    ) -> Vec<ScoredCandidate> {
        let sources: Vec<ValueSource> = candidates
            .iter()
            .map(|c| self.source(ctx, &c.state))
            .collect();

        // One evaluation per distinct prompt not already paid for.
        let mut pending: Vec<&str> = Vec::new();
        for source in &sources {
            if let ValueSource::Prompt(prompt) = source {
                if self.cache.get(prompt).is_none() && !pending.contains(&prompt.as_str()) {
                    pending.push(prompt);
                }
            }
        }

        let fresh = join_all(pending.iter().map(|prompt| self.ask(ctx, prompt))).await;
        let mut values: HashMap<&str, CachedValue> = HashMap::new();
        for (prompt, value) in pending.into_iter().zip(fresh) {
            // A sentinel is a failure, not a verdict; retry it if the prompt recurs.
            if value.score != SENTINEL_SCORE {
                self.cache.insert(prompt, value.clone());
            }
            values.insert(prompt, value);
        }

        candidates
            .into_iter()
            .zip(sources.iter())
            .map(|(candidate, source)| {
                let value = match source {
                    ValueSource::Known(value) => value.clone(),
                    ValueSource::Prompt(prompt) => values
                        .get(prompt.as_str())
                        .cloned()
                        .or_else(|| self.cache.get(prompt))
                        .unwrap_or_else(sentinel_value),
                };
                ScoredCandidate {
                    candidate,
                    score: value.score,
                    raw: value.raw,
                }
            })
            .collect()
    }
}

/// `n_evaluate_sample` comparisons over the whole candidate set; a
/// candidate's score is the number of comparisons that picked it.
pub struct VoteEvaluator;

#[async_trait]
impl ThoughtEvaluator for VoteEvaluator {
    fn mode(&self) -> EvaluateMode {
        EvaluateMode::Vote
    }

    async fn score(
        &self,
        ctx: &SearchContext<'_>,
        candidates: Vec<Candidate>,
    ) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let states: Vec<&ThoughtState> = candidates.iter().map(|c| c.state.as_ref()).collect();
        let n = states.len();

        let outputs: Vec<Result<String, ArborError>> = match ctx.task.vote_prompt(ctx.input, &states)
        {
            Ok(prompt) => {
                let calls =
                    (0..ctx.config.n_evaluate_sample).map(|_| ctx.oracle.complete(&prompt, None));
                join_all(calls).await
            }
            Err(e) => {
                tracing::warn!("vote prompt failed: {}", e);
                Vec::new()
            }
        };

        let answered = outputs.iter().filter(|r| r.is_ok()).count();
        let mut votes = vec![0u32; n];
        let mut raw: Vec<Vec<String>> = vec![Vec::new(); n];
        for output in outputs.into_iter().filter_map(Result::ok) {
            match ctx.task.parse_vote(&output, n) {
                Some(i) => {
                    votes[i] += 1;
                    raw[i].push(output);
                }
                None => {
                    tracing::warn!(output = %truncate_str(&output, 120), "unparseable vote");
                }
            }
        }

        candidates
            .into_iter()
            .zip(votes.into_iter().zip(raw))
            .map(|(candidate, (count, raw))| ScoredCandidate {
                candidate,
                score: if answered == 0 {
                    SENTINEL_SCORE
                } else {
                    f64::from(count)
                },
                raw,
            })
            .collect()
    }
}
