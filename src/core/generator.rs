// src/core/generator.rs — Expands a state into candidate successor states
//
// A failed or unparseable oracle call yields zero candidates for that call.
// The round goes on with whatever the other calls produced.

use async_trait::async_trait;
use futures::future::join_all;

use super::config::{GenerateMode, SearchConfig};
use super::types::{SearchContext, ThoughtState};
use crate::util::{nonempty_lines, truncate_str};

/// One successor and the generation call that produced it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub call: usize,
    pub state: ThoughtState,
}

#[async_trait]
pub trait ThoughtGenerator: Send + Sync {
    fn mode(&self) -> GenerateMode;

    /// At most `n_generate_sample` successors of `state`.
    async fn expand(&self, ctx: &SearchContext<'_>, state: &ThoughtState) -> Vec<Generated>;
}

pub fn for_mode(mode: GenerateMode) -> Box<dyn ThoughtGenerator> {
    match mode {
        GenerateMode::Sample => Box::new(SampleGenerator),
        GenerateMode::Propose => Box::new(ProposeGenerator),
    }
}

/// `n_generate_sample` independent draws, one continuation each. Duplicates
/// are kept.
pub struct SampleGenerator;

impl SampleGenerator {
    /// A whole solution in one shot per draw, no per-step stop. Each result
    /// sits at full task depth.
    pub async fn one_shot(&self, ctx: &SearchContext<'_>) -> Vec<Generated> {
        let root = ThoughtState::root();
        let prompt = match ctx
            .task
            .sample_prompt(ctx.input, &root, ctx.config.prompt_sample)
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("naive prompt failed: {}", e);
                return Vec::new();
            }
        };

        let calls = (0..ctx.config.n_generate_sample).map(|_| ctx.oracle.complete(&prompt, None));
        let depth = ctx.task.steps();
        join_all(calls)
            .await
            .into_iter()
            .enumerate()
            .filter_map(|(call, result)| match result {
                Ok(text) => {
                    let steps: Vec<String> = nonempty_lines(&text).map(String::from).collect();
                    if steps.is_empty() {
                        tracing::warn!(call, "naive sample was empty");
                        return None;
                    }
                    Some(Generated {
                        call,
                        state: ThoughtState::from_parts(steps, depth),
                    })
                }
                Err(e) => {
                    tracing::debug!(call, "naive sample dropped: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn step_stop<'a>(ctx: &'a SearchContext<'_>, state: &ThoughtState) -> Option<&'a str> {
    if ctx.config.stop_per_step {
        ctx.task.stop(state.depth())
    } else {
        None
    }
}

/// First non-empty line of a continuation; a stop sequence that the backend
/// ignored must not smuggle several steps into one.
fn first_step(text: &str) -> Option<&str> {
    nonempty_lines(text).next()
}

#[async_trait]
impl ThoughtGenerator for SampleGenerator {
    fn mode(&self) -> GenerateMode {
        GenerateMode::Sample
    }

    async fn expand(&self, ctx: &SearchContext<'_>, state: &ThoughtState) -> Vec<Generated> {
        let prompt = match ctx
            .task
            .sample_prompt(ctx.input, state, ctx.config.prompt_sample)
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("sample prompt failed: {}", e);
                return Vec::new();
            }
        };
        let stop = step_stop(ctx, state);

        let calls = (0..ctx.config.n_generate_sample).map(|_| ctx.oracle.complete(&prompt, stop));
        join_all(calls)
            .await
            .into_iter()
            .enumerate()
            .filter_map(|(call, result)| match result {
                Ok(text) => match first_step(&text) {
                    Some(step) => Some(Generated {
                        call,
                        state: state.extend(step),
                    }),
                    None => {
                        tracing::warn!(call, "sample returned no step");
                        None
                    }
                },
                Err(e) => {
                    tracing::debug!(call, "sample dropped: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// One call whose response lists several next steps.
pub struct ProposeGenerator;

fn cap(config: &SearchConfig, mut steps: Vec<String>) -> Vec<String> {
    steps.truncate(config.n_generate_sample);
    steps
}

#[async_trait]
impl ThoughtGenerator for ProposeGenerator {
    fn mode(&self) -> GenerateMode {
        GenerateMode::Propose
    }

    async fn expand(&self, ctx: &SearchContext<'_>, state: &ThoughtState) -> Vec<Generated> {
        let prompt = match ctx.task.propose_prompt(ctx.input, state) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("propose prompt failed: {}", e);
                return Vec::new();
            }
        };

        let text = match ctx.oracle.complete(&prompt, None).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("proposal dropped: {}", e);
                return Vec::new();
            }
        };

        let proposals = cap(ctx.config, ctx.task.parse_proposals(state, &text));
        if proposals.is_empty() {
            tracing::warn!(output = %truncate_str(&text, 120), "no parseable proposals");
        }
        proposals
            .into_iter()
            .map(|step| Generated {
                call: 0,
                state: state.extend(step),
            })
            .collect()
    }
}
