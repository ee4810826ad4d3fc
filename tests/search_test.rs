// tests/search_test.rs — Integration test: full searches against a scripted oracle

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use arbor::core::config::{EvaluateMode, GenerateMode, SearchConfig, SelectMode};
use arbor::core::controller::SearchController;
use arbor::core::trace::RoundOutcome;
use arbor::core::types::SearchStatus;
use arbor::infra::errors::ArborError;
use arbor::provider::*;
use arbor::tasks::game24::Game24;
use arbor::tasks::Task;

const STEP: &str = "4 + 9 = 13 (left: 10 13 13)";

/// A mock provider that answers through a closure without any network calls.
struct ScriptedOracle {
    respond: Box<dyn Fn(&str) -> Result<String, ArborError> + Send + Sync>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    fn new(respond: impl Fn(&str) -> Result<String, ArborError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for ScriptedOracle {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ArborError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(ChatResponse {
            content: (self.respond)(prompt)?,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 20,
            },
            stop_reason: StopReason::EndTurn,
        })
    }
}

fn is_value_prompt(prompt: &str) -> bool {
    prompt.contains("Evaluate if given numbers can reach 24") || prompt.ends_with("Judge:")
}

fn is_vote_prompt(prompt: &str) -> bool {
    prompt.contains("decide which choice is most promising")
}

/// One fixed next step for generation, "certain" for every judgment.
fn step_then_certain() -> ScriptedOracle {
    ScriptedOracle::new(|prompt| {
        if is_value_prompt(prompt) {
            Ok("certain".into())
        } else {
            Ok(STEP.into())
        }
    })
}

fn minimal_config() -> SearchConfig {
    SearchConfig {
        method_generate: GenerateMode::Sample,
        method_evaluate: EvaluateMode::Value,
        method_select: SelectMode::Greedy,
        n_generate_sample: 1,
        n_evaluate_sample: 1,
        n_select_sample: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_three_step_search_end_to_end() {
    let oracle = Arc::new(step_then_certain());
    let task: Arc<dyn Task> = Arc::new(Game24::new().with_steps(3));
    let mut controller = SearchController::new(oracle.clone(), task, minimal_config()).unwrap();

    let outcome = controller.run("4 9 10 13").await.unwrap();

    assert_eq!(outcome.status, SearchStatus::Complete);
    assert!(!outcome.incomplete());
    assert_eq!(outcome.frontier.len(), 1);
    assert_eq!(outcome.frontier[0].state.steps(), &[STEP, STEP, STEP]);
    assert_eq!(outcome.trace.len(), 3);
    for (d, round) in outcome.trace.rounds().iter().enumerate() {
        assert_eq!(round.round, d);
        assert_eq!(round.outcome, RoundOutcome::Selected);
        assert_eq!(round.candidates.len(), 1);
        assert_eq!(round.selected, vec![0]);
    }
    // Rounds 0 and 1 are judged "certain"; the depth-3 state without an
    // answer is a dead end scored locally.
    let scores: Vec<Option<f64>> = outcome
        .trace
        .rounds()
        .iter()
        .map(|r| r.candidates[0].score)
        .collect();
    assert_eq!(scores, vec![Some(20.0), Some(20.0), Some(0.0)]);
    assert_eq!(oracle.calls(), 5);
}

#[tokio::test]
async fn test_naive_run_makes_exactly_one_call() {
    let oracle = Arc::new(ScriptedOracle::new(|_| {
        Ok("Answer: (13 - 9) * (10 - 4) = 24".into())
    }));
    let task: Arc<dyn Task> = Arc::new(Game24::new());
    let config = SearchConfig {
        naive_run: true,
        n_evaluate_sample: 7,
        n_select_sample: 7,
        ..minimal_config()
    };
    let mut controller = SearchController::new(oracle.clone(), task.clone(), config).unwrap();

    let outcome = controller.run("4 9 10 13").await.unwrap();

    assert_eq!(oracle.calls(), 1);
    assert!(outcome.trace.is_empty());
    let best = outcome.best().unwrap();
    assert!(task.test_output("4 9 10 13", &best.text()));
}

#[tokio::test]
async fn test_every_call_failing_gives_empty_frontier() {
    let oracle = Arc::new(ScriptedOracle::new(|_| {
        Err(ArborError::OracleUnavailable {
            message: "connection refused".into(),
        })
    }));
    let task: Arc<dyn Task> = Arc::new(Game24::new());
    let mut controller = SearchController::new(oracle, task, minimal_config()).unwrap();

    let outcome = controller.run("4 9 10 13").await.unwrap();

    assert_eq!(outcome.status, SearchStatus::EmptyFrontier);
    assert!(outcome.incomplete());
    assert_eq!(outcome.frontier.len(), 1);
    assert!(outcome.frontier[0].state.is_root());
    assert_eq!(outcome.trace.len(), 1);
    assert_eq!(outcome.usage.failures, 1);
}

#[tokio::test]
async fn test_vote_mode_selects_most_voted() {
    let oracle = Arc::new(ScriptedOracle::new(|prompt| {
        if is_vote_prompt(prompt) {
            Ok("Choice 2 keeps 13 and 10.\nThe best choice is 2".into())
        } else {
            Ok("4 + 9 = 13 (left: 10 13 13)\n10 - 4 = 6 (left: 6 9 13)\n13 - 9 = 4 (left: 4 4 10)".into())
        }
    }));
    let task: Arc<dyn Task> = Arc::new(Game24::new().with_steps(1));
    let config = SearchConfig {
        method_generate: GenerateMode::Propose,
        method_evaluate: EvaluateMode::Vote,
        n_generate_sample: 3,
        n_evaluate_sample: 4,
        ..minimal_config()
    };
    let mut controller = SearchController::new(oracle.clone(), task, config).unwrap();

    let outcome = controller.run("4 9 10 13").await.unwrap();

    let round = &outcome.trace.rounds()[0];
    let votes: Vec<Option<f64>> = round.candidates.iter().map(|c| c.score).collect();
    assert_eq!(votes, vec![Some(0.0), Some(4.0), Some(0.0)]);
    assert_eq!(round.selected_texts(), vec!["10 - 4 = 6 (left: 6 9 13)"]);
    // One propose call plus four comparisons.
    assert_eq!(oracle.calls(), 5);
}

#[tokio::test]
async fn test_greedy_ties_keep_generation_order() {
    let oracle = Arc::new(ScriptedOracle::new(|prompt| {
        if is_value_prompt(prompt) {
            Ok("likely".into())
        } else {
            Ok("1 + 1 = 2 (left: 2 10 13)\n9 - 4 = 5 (left: 5 10 13)".into())
        }
    }));
    let task: Arc<dyn Task> = Arc::new(Game24::new().with_steps(2));
    let config = SearchConfig {
        method_generate: GenerateMode::Propose,
        n_generate_sample: 2,
        ..minimal_config()
    };
    let mut controller = SearchController::new(oracle, task, config).unwrap();

    let outcome = controller.run("4 9 10 13").await.unwrap();

    let first = &outcome.trace.rounds()[0];
    assert_eq!(first.candidates[0].score, Some(1.0));
    assert_eq!(first.candidates[1].score, Some(1.0));
    assert_eq!(first.selected_texts(), vec!["1 + 1 = 2 (left: 2 10 13)"]);
}

#[tokio::test]
async fn test_time_budget_returns_degraded_result() {
    let oracle = Arc::new(step_then_certain().with_delay(Duration::from_millis(50)));
    let task: Arc<dyn Task> = Arc::new(Game24::new());
    let config = SearchConfig {
        time_budget: Duration::from_millis(130),
        ..minimal_config()
    };
    let mut controller = SearchController::new(oracle, task, config).unwrap();

    let outcome = controller.run("4 9 10 13").await.unwrap();

    assert_eq!(outcome.status, SearchStatus::TimedOut);
    assert!(outcome.incomplete());
    // Round 0 completes (two 50ms calls); round 1 runs out of time.
    assert_eq!(outcome.frontier[0].state.steps(), &[STEP]);
    assert_eq!(outcome.trace.last().unwrap().outcome, RoundOutcome::TimedOut);
}

#[tokio::test]
async fn test_malformed_input_rejected_before_any_call() {
    let oracle = Arc::new(step_then_certain());
    let task: Arc<dyn Task> = Arc::new(Game24::new());
    let mut controller = SearchController::new(oracle.clone(), task, minimal_config()).unwrap();

    let err = controller.run("4 9 ten").await.unwrap_err();
    assert!(err.is_config());
    assert_eq!(oracle.calls(), 0);
}
