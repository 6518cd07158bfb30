use crate::Fraction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a half-open span of time `[begin, end)` measured in cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: Fraction,
    pub end: Fraction,
}

impl TimeSpan {
    /// Create a new timespan
    pub fn new(begin: Fraction, end: Fraction) -> Self {
        TimeSpan { begin, end }
    }

    /// Create a timespan from two integers (whole numbers)
    pub fn from_ints(begin: i64, end: i64) -> Self {
        TimeSpan {
            begin: Fraction::from_int(begin),
            end: Fraction::from_int(end),
        }
    }

    /// Create a timespan from two floats
    pub fn from_floats(begin: f64, end: f64) -> Self {
        TimeSpan {
            begin: Fraction::from_float(begin),
            end: Fraction::from_float(end),
        }
    }

    /// Get the duration of this timespan
    pub fn duration(&self) -> Fraction {
        self.end - self.begin
    }

    /// Check if this timespan contains a point in time
    pub fn contains(&self, time: Fraction) -> bool {
        time >= self.begin && time < self.end
    }

    /// Check if two timespans overlap
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Get the intersection of two timespans, if any
    pub fn intersection(&self, other: &TimeSpan) -> Option<TimeSpan> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeSpan::new(
            self.begin.max(other.begin),
            self.end.min(other.end),
        ))
    }

    /// Check if the timespan is empty (begin == end)
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Shift the timespan by an offset
    pub fn shift(&self, offset: Fraction) -> TimeSpan {
        TimeSpan::new(self.begin + offset, self.end + offset)
    }

    /// Scale the timespan by a factor
    pub fn scale(&self, factor: Fraction) -> TimeSpan {
        TimeSpan::new(self.begin * factor, self.end * factor)
    }

    /// Apply a function to both ends of the span
    pub fn with_time<F>(&self, func: F) -> TimeSpan
    where
        F: Fn(Fraction) -> Fraction,
    {
        TimeSpan::new(func(self.begin), func(self.end))
    }

    /// The whole cycle `[floor(begin), floor(begin) + 1)` this span starts in
    pub fn whole_cycle(&self) -> TimeSpan {
        let start = self.begin.floor();
        TimeSpan::new(start, start + Fraction::one())
    }

    /// Split the span at cycle boundaries
    ///
    /// Empty spans produce no pieces.
    pub fn span_cycles(&self) -> Vec<TimeSpan> {
        let mut spans = Vec::new();
        let mut begin = self.begin;

        while begin < self.end {
            let next_cycle = begin.floor() + Fraction::one();
            let end = next_cycle.min(self.end);
            spans.push(TimeSpan::new(begin, end));
            begin = end;
        }

        spans
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timespan_duration() {
        let ts = TimeSpan::from_ints(0, 2);
        assert_eq!(ts.duration(), Fraction::from_int(2));
    }

    #[test]
    fn test_timespan_contains() {
        let ts = TimeSpan::from_ints(0, 1);
        assert!(ts.contains(Fraction::new(1, 2)));
        assert!(!ts.contains(Fraction::from_int(1)));
    }

    #[test]
    fn test_timespan_overlap() {
        let ts1 = TimeSpan::from_ints(0, 2);
        assert!(ts1.overlaps(&TimeSpan::from_ints(1, 3)));
        assert!(!ts1.overlaps(&TimeSpan::from_ints(2, 4)));
    }

    #[test]
    fn test_timespan_intersection() {
        let ts1 = TimeSpan::from_ints(0, 2);
        let ts2 = TimeSpan::from_ints(1, 3);
        let intersection = ts1.intersection(&ts2).unwrap();
        assert_eq!(intersection, TimeSpan::from_ints(1, 2));
    }

    #[test]
    fn test_span_cycles() {
        let span = TimeSpan::new(Fraction::new(1, 2), Fraction::new(5, 2));
        let pieces = span.span_cycles();
        assert_eq!(
            pieces,
            vec![
                TimeSpan::new(Fraction::new(1, 2), Fraction::from_int(1)),
                TimeSpan::from_ints(1, 2),
                TimeSpan::new(Fraction::from_int(2), Fraction::new(5, 2)),
            ]
        );
        assert!(TimeSpan::from_ints(3, 3).span_cycles().is_empty());
    }

    #[test]
    fn test_span_cycles_negative() {
        let span = TimeSpan::new(Fraction::new(-1, 2), Fraction::new(1, 2));
        assert_eq!(span.span_cycles().len(), 2);
        assert_eq!(span.whole_cycle(), TimeSpan::from_ints(-1, 0));
    }
}
