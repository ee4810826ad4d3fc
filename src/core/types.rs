// src/core/types.rs — Core domain types

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::config::SearchConfig;
use super::trace::Trace;
use crate::provider::meter::UsageReport;
use crate::provider::oracle::Oracle;
use crate::tasks::Task;

/// Score given to a candidate whose every evaluation call failed. Below any
/// real score, so selection still sees a total order.
pub const SENTINEL_SCORE: f64 = -1.0;

/// A partial solution: the steps taken so far. Never mutated; `extend`
/// derives a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ThoughtState {
    steps: Vec<String>,
    depth: usize,
    partial_eval: Option<String>,
}

impl ThoughtState {
    /// The empty solution every search starts from.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_parts(steps: Vec<String>, depth: usize) -> Self {
        Self {
            steps,
            depth,
            partial_eval: None,
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Rounds completed to reach this state.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn partial_eval(&self) -> Option<&str> {
        self.partial_eval.as_deref()
    }

    pub fn last_step(&self) -> Option<&str> {
        self.steps.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps joined by newlines.
    pub fn text(&self) -> String {
        self.steps.join("\n")
    }

    pub fn extend(&self, step: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step.into());
        Self {
            steps,
            depth: self.depth + 1,
            partial_eval: None,
        }
    }

    pub fn with_partial_eval(&self, text: impl Into<String>) -> Self {
        Self {
            partial_eval: Some(text.into()),
            ..self.clone()
        }
    }
}

/// A state produced this round, with where it came from.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub state: Arc<ThoughtState>,
    /// Index of the parent in the frontier that was expanded.
    pub parent: usize,
    /// Index of the generation call (per parent) that produced it.
    pub call: usize,
    /// Position in the round's generation order; tie-breaks selection.
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    /// Raw evaluator outputs behind the score.
    pub raw: Vec<String>,
}

impl ScoredCandidate {
    pub fn is_sentinel(&self) -> bool {
        self.score == SENTINEL_SCORE
    }
}

/// A live state carried between rounds, with the score that got it selected.
#[derive(Debug, Clone)]
pub struct FrontierMember {
    pub state: Arc<ThoughtState>,
    pub score: Option<f64>,
}

impl FrontierMember {
    pub fn root() -> Self {
        Self {
            state: Arc::new(ThoughtState::root()),
            score: None,
        }
    }

    pub fn unscored(state: ThoughtState) -> Self {
        Self {
            state: Arc::new(state),
            score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Complete,
    /// A round produced no candidates; the previous frontier was kept.
    EmptyFrontier,
    /// The time budget ran out; the last completed frontier was kept.
    TimedOut,
}

/// Everything generators and evaluators need for one search.
pub struct SearchContext<'a> {
    pub oracle: &'a Oracle,
    pub task: &'a dyn Task,
    pub input: &'a str,
    pub config: &'a SearchConfig,
}

/// What a search hands back to its caller.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub frontier: Vec<FrontierMember>,
    pub status: SearchStatus,
    pub trace: Trace,
    pub usage: UsageReport,
}

impl SearchOutcome {
    pub fn incomplete(&self) -> bool {
        self.status != SearchStatus::Complete
    }

    /// Highest-scored frontier member, first on ties; the first member when
    /// nothing was scored.
    pub fn best(&self) -> Option<&Arc<ThoughtState>> {
        let mut best: Option<&FrontierMember> = None;
        for member in &self.frontier {
            best = match best {
                None => Some(member),
                Some(current) => {
                    let cur = current.score.unwrap_or(f64::NEG_INFINITY);
                    let new = member.score.unwrap_or(f64::NEG_INFINITY);
                    if new > cur {
                        Some(member)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.map(|m| &m.state)
    }
}

/// Response body for a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResponse {
    pub solution: String,
    /// Whether the task's own success test accepts the solution.
    pub solved: bool,
    pub status: SearchStatus,
    pub incomplete: bool,
    pub frontier: Vec<String>,
    pub steps: Trace,
    pub usage: UsageReport,
}

impl SolveResponse {
    pub fn from_outcome(outcome: SearchOutcome, task: &dyn Task, input: &str) -> Self {
        let solution = outcome.best().map(|s| s.text()).unwrap_or_default();
        let solved = !solution.is_empty() && task.test_output(input, &solution);
        Self {
            solved,
            status: outcome.status,
            incomplete: outcome.incomplete(),
            frontier: outcome.frontier.iter().map(|m| m.state.text()).collect(),
            solution,
            steps: outcome.trace,
            usage: outcome.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(steps: &[&str], score: Option<f64>) -> FrontierMember {
        FrontierMember {
            state: Arc::new(ThoughtState::from_parts(
                steps.iter().map(|s| s.to_string()).collect(),
                steps.len(),
            )),
            score,
        }
    }

    fn outcome(frontier: Vec<FrontierMember>, status: SearchStatus) -> SearchOutcome {
        SearchOutcome {
            frontier,
            status,
            trace: Trace::new(),
            usage: UsageReport::default(),
        }
    }

    // ─── ThoughtState ───────────────────────────────────────────

    #[test]
    fn test_root_is_empty() {
        let root = ThoughtState::root();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.text(), "");
        assert!(root.last_step().is_none());
    }

    #[test]
    fn test_extend_derives_child_without_touching_parent() {
        let root = ThoughtState::root();
        let child = root.extend("4 + 9 = 13 (left: 10 13 13)");
        let grandchild = child.extend("13 - 10 = 3 (left: 3 13)");

        assert!(root.is_root());
        assert_eq!(child.depth(), 1);
        assert_eq!(grandchild.depth(), 2);
        assert_eq!(grandchild.steps().len(), 2);
        assert_eq!(
            grandchild.text(),
            "4 + 9 = 13 (left: 10 13 13)\n13 - 10 = 3 (left: 3 13)"
        );
        assert_eq!(grandchild.last_step(), Some("13 - 10 = 3 (left: 3 13)"));
    }

    #[test]
    fn test_partial_eval_not_inherited() {
        let s = ThoughtState::root().extend("a").with_partial_eval("likely");
        assert_eq!(s.partial_eval(), Some("likely"));
        assert!(s.extend("b").partial_eval().is_none());
    }

    // ─── SearchOutcome ──────────────────────────────────────────

    #[test]
    fn test_best_prefers_highest_score_first_on_ties() {
        let o = outcome(
            vec![
                member(&["a"], Some(1.0)),
                member(&["b"], Some(20.0)),
                member(&["c"], Some(20.0)),
            ],
            SearchStatus::Complete,
        );
        assert_eq!(o.best().unwrap().text(), "b");
        assert!(!o.incomplete());
    }

    #[test]
    fn test_best_unscored_is_first() {
        let o = outcome(
            vec![member(&["x"], None), member(&["y"], None)],
            SearchStatus::EmptyFrontier,
        );
        assert_eq!(o.best().unwrap().text(), "x");
        assert!(o.incomplete());
    }

    #[test]
    fn test_sentinel_detection() {
        let sc = ScoredCandidate {
            candidate: Candidate {
                state: Arc::new(ThoughtState::root()),
                parent: 0,
                call: 0,
                order: 0,
            },
            score: SENTINEL_SCORE,
            raw: vec![],
        };
        assert!(sc.is_sentinel());
    }
}
