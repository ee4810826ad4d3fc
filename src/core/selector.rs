// src/core/selector.rs — Trims a scored round down to the next frontier

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::SelectMode;
use super::types::ScoredCandidate;

/// Floor for sampling weights, so a zero or sentinel score stays drawable.
pub const MIN_WEIGHT: f64 = 1e-6;

pub trait Selector: Send {
    fn mode(&self) -> SelectMode;

    /// Indices into `scored`, in selection order, `min(width, scored.len())` long.
    fn select(&mut self, scored: &[ScoredCandidate], width: usize) -> Vec<usize>;
}

pub fn for_mode(mode: SelectMode, seed: Option<u64>) -> Box<dyn Selector> {
    match mode {
        SelectMode::Greedy => Box::new(GreedySelector),
        SelectMode::Sample => Box::new(SampleSelector::new(seed)),
    }
}

/// Highest scores first; earlier-generated candidates win ties.
pub struct GreedySelector;

fn by_score_then_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.candidate.order.cmp(&b.candidate.order))
}

impl Selector for GreedySelector {
    fn mode(&self) -> SelectMode {
        SelectMode::Greedy
    }

    fn select(&mut self, scored: &[ScoredCandidate], width: usize) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..scored.len()).collect();
        ids.sort_by(|&a, &b| by_score_then_order(&scored[a], &scored[b]));
        ids.truncate(width);
        ids
    }
}

/// Weighted draws without replacement, weight = score.
pub struct SampleSelector {
    rng: StdRng,
}

impl SampleSelector {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

fn weight(score: f64) -> f64 {
    if score.is_finite() && score > MIN_WEIGHT {
        score
    } else {
        MIN_WEIGHT
    }
}

impl Selector for SampleSelector {
    fn mode(&self) -> SelectMode {
        SelectMode::Sample
    }

    fn select(&mut self, scored: &[ScoredCandidate], width: usize) -> Vec<usize> {
        let mut pool: Vec<(usize, f64)> = scored
            .iter()
            .enumerate()
            .map(|(i, s)| (i, weight(s.score)))
            .collect();
        let mut picked = Vec::with_capacity(width.min(pool.len()));

        while picked.len() < width && !pool.is_empty() {
            let total: f64 = pool.iter().map(|(_, w)| w).sum();
            let mut target = self.rng.gen::<f64>() * total;
            // Float drift can leave target past the last weight.
            let mut at = pool.len() - 1;
            for (k, (_, w)) in pool.iter().enumerate() {
                if target < *w {
                    at = k;
                    break;
                }
                target -= w;
            }
            picked.push(pool.remove(at).0);
        }
        picked
    }
}
