// src/core/trace.rs — Append-only record of what a search explored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Selected,
    EmptyFrontier,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub text: String,
    pub parent: usize,
    /// None when the round ended before scoring.
    pub score: Option<f64>,
    pub raw: Vec<String>,
}

/// One round, assembled after all of its oracle calls settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: usize,
    pub frontier: Vec<String>,
    pub candidates: Vec<CandidateRecord>,
    /// Indices into `candidates`, in selection order.
    pub selected: Vec<usize>,
    pub outcome: RoundOutcome,
    pub oracle_calls: u64,
    pub oracle_failures: u64,
    pub elapsed_ms: u64,
}

impl RoundRecord {
    pub fn selected_texts(&self) -> Vec<&str> {
        self.selected
            .iter()
            .filter_map(|&i| self.candidates.get(i))
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub search_id: String,
    pub started_at: DateTime<Utc>,
    rounds: Vec<RoundRecord>,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    pub fn new() -> Self {
        Self {
            search_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            rounds: Vec::new(),
        }
    }

    pub fn push(&mut self, record: RoundRecord) {
        self.rounds.push(record);
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }
}
