use crate::{Fraction, TimeSpan, Value};
use serde::{Deserialize, Serialize};

/// A Hap (Happening/Event) represents a value active during a timespan
///
/// The 'part' is the timespan fragment of this event, which may be smaller
/// than the 'whole' timespan if the event is fragmented. The 'part' must
/// never extend outside of the 'whole'. If the event represents a continuously
/// changing value, then 'whole' will be None.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hap {
    /// The full timespan of the event (may be None for continuous events)
    pub whole: Option<TimeSpan>,

    /// The active fragment timespan (always present)
    pub part: TimeSpan,

    /// The value of this event
    pub value: Value,
}

impl Hap {
    /// Create a new Hap with the given timespans and value
    pub fn new(whole: Option<TimeSpan>, part: TimeSpan, value: Value) -> Self {
        Hap { whole, part, value }
    }

    /// Get the whole timespan or fall back to part
    pub fn whole_or_part(&self) -> TimeSpan {
        self.whole.unwrap_or(self.part)
    }

    /// Check if this hap contains the onset (beginning of whole matches beginning of part)
    pub fn has_onset(&self) -> bool {
        match self.whole {
            Some(w) => w.begin == self.part.begin,
            None => false,
        }
    }

    /// Start of the whole, or of the part for continuous haps
    pub fn onset(&self) -> Fraction {
        self.whole_or_part().begin
    }

    /// Apply a function to the value, returning a new Hap
    pub fn with_value<F>(&self, func: F) -> Hap
    where
        F: FnOnce(&Value) -> Value,
    {
        Hap {
            whole: self.whole,
            part: self.part,
            value: func(&self.value),
        }
    }

    /// Apply a function to the timespans, returning a new Hap
    pub fn with_span<F>(&self, func: F) -> Hap
    where
        F: Fn(&TimeSpan) -> TimeSpan,
    {
        Hap {
            whole: self.whole.map(|w| func(&w)),
            part: func(&self.part),
            value: self.value.clone(),
        }
    }

    /// Get the duration of this event
    pub fn duration(&self) -> Fraction {
        self.whole_or_part().duration()
    }
}
