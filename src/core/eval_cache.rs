// src/core/eval_cache.rs — Value memoization keyed by the rendered value prompt

use std::collections::HashMap;
use std::sync::Mutex;

/// A cached value score and the judgments behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub score: f64,
    pub raw: Vec<String>,
}

/// Scores already paid for. The key is the full value prompt, so two states
/// that render the same prompt share a score whichever parent produced them,
/// and a prompt that depends on the puzzle input never leaks across inputs.
pub struct ValueCache {
    cache: Mutex<HashMap<String, CachedValue>>,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueCache {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, prompt: &str) -> Option<CachedValue> {
        self.cache.lock().ok()?.get(prompt).cloned()
    }

    pub fn insert(&self, prompt: impl Into<String>, value: CachedValue) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(prompt.into(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(score: f64) -> CachedValue {
        CachedValue {
            score,
            raw: vec!["sure".into()],
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ValueCache::new();
        assert!(cache.get("4 + 9 = 13 (left: 10 13 13)").is_none());
        cache.insert("4 + 9 = 13 (left: 10 13 13)", value(21.0));
        assert_eq!(cache.get("4 + 9 = 13 (left: 10 13 13)"), Some(value(21.0)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keyed_by_exact_prompt() {
        let cache = ValueCache::new();
        cache.insert("a\nb", value(1.0));
        assert!(cache.get("a\nb").is_some());
        assert!(cache.get("a\nc").is_none());
    }

    #[test]
    fn test_overwrite() {
        let cache = ValueCache::new();
        cache.insert("x", value(1.0));
        cache.insert("x", value(20.0));
        assert_eq!(cache.get("x").unwrap().score, 20.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_prompts_never_share_a_slot() {
        let cache = ValueCache::new();
        let prompts: Vec<String> = (0..2000).map(|i| format!("{i} {i}")).collect();
        for (i, p) in prompts.iter().enumerate() {
            cache.insert(p.as_str(), value(i as f64));
        }
        assert_eq!(cache.len(), prompts.len());
        for (i, p) in prompts.iter().enumerate() {
            assert_eq!(cache.get(p).unwrap().score, i as f64);
        }
    }
}
