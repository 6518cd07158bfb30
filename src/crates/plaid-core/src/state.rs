use crate::TimeSpan;
use serde::{Deserialize, Serialize};

/// State represents the context for querying a pattern
///
/// It carries the timespan being queried and the composition seed every
/// probabilistic node draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// The timespan being queried
    pub span: TimeSpan,

    /// Explicit composition seed
    pub seed: u64,
}

impl State {
    /// Create a new State with the given timespan and seed 0
    pub fn new(span: TimeSpan) -> Self {
        State { span, seed: 0 }
    }

    /// Create a new State with the given timespan and seed
    pub fn with_seed(span: TimeSpan, seed: u64) -> Self {
        State { span, seed }
    }

    /// Return a new State with a different span
    pub fn set_span(&self, span: TimeSpan) -> State {
        State {
            span,
            seed: self.seed,
        }
    }

    /// Return a new State with the span modified by a function
    pub fn with_span<F>(&self, func: F) -> State
    where
        F: FnOnce(&TimeSpan) -> TimeSpan,
    {
        self.set_span(func(&self.span))
    }
}
