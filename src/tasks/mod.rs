// src/tasks/mod.rs — Task adapters: prompts, parsers and success tests per problem

pub mod game24;

use std::sync::Arc;

use crate::core::config::PromptSample;
use crate::core::types::ThoughtState;
use crate::infra::errors::ArborError;

/// Everything problem-specific the search engine consumes. The engine itself
/// knows nothing about the problem beyond this trait.
pub trait Task: Send + Sync {
    fn id(&self) -> &str;

    /// Number of rounds a full solution takes.
    fn steps(&self) -> usize;

    /// Reject malformed task instances before any oracle call.
    fn validate_input(&self, _input: &str) -> Result<(), ArborError> {
        Ok(())
    }

    /// Stop sequence for stepwise sampling at the given depth.
    fn stop(&self, _depth: usize) -> Option<&str> {
        None
    }

    fn sample_prompt(
        &self,
        input: &str,
        state: &ThoughtState,
        style: PromptSample,
    ) -> Result<String, ArborError>;

    fn propose_prompt(&self, input: &str, state: &ThoughtState) -> Result<String, ArborError>;

    /// Split one propose response into candidate next steps.
    fn parse_proposals(&self, state: &ThoughtState, output: &str) -> Vec<String>;

    fn value_prompt(&self, input: &str, state: &ThoughtState) -> Result<String, ArborError>;

    /// A value known without asking the oracle, e.g. a dead end.
    fn static_value(&self, _state: &ThoughtState) -> Option<f64> {
        None
    }

    fn vote_prompt(&self, input: &str, states: &[&ThoughtState]) -> Result<String, ArborError>;

    /// Zero-based index of the chosen candidate, if the response names one.
    fn parse_vote(&self, output: &str, n_choices: usize) -> Option<usize> {
        parse_best_choice(output, n_choices)
    }

    /// Success predicate for a finished solution. Used by callers only.
    fn test_output(&self, input: &str, output: &str) -> bool;
}

/// Parse "... best choice is 3" (1-based) into a zero-based index.
pub fn parse_best_choice(output: &str, n_choices: usize) -> Option<usize> {
    let lower = output.to_ascii_lowercase();
    let at = lower.rfind("best choice is")?;
    let rest = &lower[at + "best choice is".len()..];
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let choice: usize = digits.parse().ok()?;
    (1..=n_choices).contains(&choice).then(|| choice - 1)
}

pub fn known_ids() -> Vec<&'static str> {
    vec![game24::TASK_ID]
}

pub fn lookup(id: &str) -> Option<Arc<dyn Task>> {
    match id.trim().to_ascii_lowercase().as_str() {
        game24::TASK_ID | "24" => Some(Arc::new(game24::Game24::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_best_choice() {
        assert_eq!(
            parse_best_choice("Choice 2 is weaker.\nThe best choice is 3", 3),
            Some(2)
        );
        assert_eq!(parse_best_choice("The best choice is 1.", 2), Some(0));
    }

    #[test]
    fn test_parse_best_choice_uses_last_mention() {
        let out = "Earlier I said the best choice is 1, but the best choice is 2";
        assert_eq!(parse_best_choice(out, 2), Some(1));
    }

    #[test]
    fn test_parse_best_choice_out_of_range() {
        assert_eq!(parse_best_choice("The best choice is 4", 3), None);
        assert_eq!(parse_best_choice("The best choice is 0", 3), None);
    }

    #[test]
    fn test_parse_best_choice_unparseable() {
        assert_eq!(parse_best_choice("I like all of them", 3), None);
        assert_eq!(parse_best_choice("The best choice is unclear", 3), None);
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("game24").is_some());
        assert!(lookup("Game24").is_some());
        assert!(lookup("text").is_none());
        assert_eq!(known_ids(), vec!["game24"]);
    }
}
