// src/core/deadline.rs — Wall-clock budget for one search

use std::time::Duration;

use tokio::time::Instant;

/// Cooperative stop signal: checked before every oracle call and at round
/// boundaries. Copy, so every concurrent call carries its own handle.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
        }
    }

    pub fn unbounded() -> Self {
        Self { expires_at: None }
    }

    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, or None when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::unbounded()
    }
}
