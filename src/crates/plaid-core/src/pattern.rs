use crate::error::{RangeError, Result};
use crate::{seed, Fraction, Hap, State, TimeSpan, Value};
use std::fmt;
use std::sync::Arc;

type QueryFn = dyn Fn(State) -> Result<Vec<Hap>> + Send + Sync;

/// A Pattern represents a time-varying sequence of values
///
/// Patterns are queried with a State (a timespan plus the composition seed)
/// and return the Haps (events) that occur within that timespan. Querying is
/// side-effect free: the same state always yields the same haps.
pub struct Pattern {
    /// The query function that produces events for a given state
    query_func: Arc<QueryFn>,
}

impl Pattern {
    /// Create a new Pattern with a query function
    pub fn new<F>(query_func: F) -> Self
    where
        F: Fn(State) -> Result<Vec<Hap>> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
        }
    }

    /// Query this pattern with the given state
    ///
    /// This is the raw query used by combinators; haps come back in the
    /// order the tree produces them. Use [`Pattern::query_span`] from the
    /// outside.
    pub fn query(&self, state: State) -> Result<Vec<Hap>> {
        (self.query_func)(state)
    }

    /// Query `[begin, end)` with seed 0
    pub fn query_span(&self, begin: Fraction, end: Fraction) -> Result<Vec<Hap>> {
        self.query_seeded(TimeSpan::new(begin, end), 0)
    }

    /// Validate the span, query, and sort haps by onset
    ///
    /// The sort is stable so haps sharing an onset keep the order of the
    /// children that produced them.
    pub fn query_seeded(&self, span: TimeSpan, seed: u64) -> Result<Vec<Hap>> {
        if span.begin > span.end {
            return Err(RangeError::ReversedSpan {
                begin: span.begin,
                end: span.end,
            });
        }
        if span.is_empty() {
            return Ok(Vec::new());
        }
        let mut haps = self.query(State::with_seed(span, seed))?;
        haps.sort_by_key(|hap| hap.onset());
        Ok(haps)
    }

    /// Apply a function to each value in the pattern
    ///
    /// This is the functor map operation (fmap)
    pub fn with_value<F>(self, func: F) -> Pattern
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| {
            Ok(query_func(state)?
                .into_iter()
                .map(|hap| hap.with_value(&func))
                .collect())
        })
    }

    /// Apply a function to the query span (before querying)
    pub fn with_query_span<F>(self, func: F) -> Pattern
    where
        F: Fn(TimeSpan) -> TimeSpan + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| query_func(state.set_span(func(state.span))))
    }

    /// Apply a function to query time (before querying)
    pub fn with_query_time<F>(self, func: F) -> Pattern
    where
        F: Fn(Fraction) -> Fraction + Send + Sync + 'static,
    {
        self.with_query_span(move |span| span.with_time(&func))
    }

    /// Apply a function to hap time (after querying)
    pub fn with_hap_time<F>(self, func: F) -> Pattern
    where
        F: Fn(Fraction) -> Fraction + Send + Sync + 'static,
    {
        self.with_hap(move |hap| hap.with_span(|ts| ts.with_time(&func)))
    }

    /// Apply a function to each hap
    pub fn with_hap<F>(self, func: F) -> Pattern
    where
        F: Fn(&Hap) -> Hap + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| Ok(query_func(state)?.iter().map(&func).collect()))
    }

    /// Apply a function to all haps of one query at once
    pub fn with_haps<F>(self, func: F) -> Pattern
    where
        F: Fn(Vec<Hap>, &State) -> Vec<Hap> + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| {
            let haps = query_func(state)?;
            Ok(func(haps, &state))
        })
    }

    /// Keep only haps matching a predicate
    pub fn filter_haps<F>(self, predicate: F) -> Pattern
    where
        F: Fn(&Hap) -> bool + Send + Sync + 'static,
    {
        self.with_haps(move |haps, _| haps.into_iter().filter(|h| predicate(h)).collect())
    }

    /// Split queries at cycle boundaries
    ///
    /// Every query the inner function sees lies within a single cycle.
    pub fn split_queries(self) -> Pattern {
        let query_func = self.query_func;
        Pattern::new(move |state| {
            let mut all_haps = Vec::new();
            for cycle_span in state.span.span_cycles() {
                all_haps.extend(query_func(state.set_span(cycle_span))?);
            }
            Ok(all_haps)
        })
    }

    /// Speed up the pattern by a constant factor
    ///
    /// Multiplies the query time by the factor and divides hap times.
    /// A zero factor silences the pattern; a negative one also reverses it.
    pub fn fast(self, factor: impl Into<Fraction>) -> Pattern {
        let factor = factor.into();
        if factor.is_zero() {
            return crate::silence();
        }
        if factor.is_negative() {
            return self.fast(factor.abs()).rev();
        }
        self.with_query_time(move |t| t * factor)
            .with_hap_time(move |t| t / factor)
    }

    /// Slow down the pattern by a constant factor
    ///
    /// A zero factor silences the pattern.
    pub fn slow(self, factor: impl Into<Fraction>) -> Pattern {
        let factor = factor.into();
        if factor.is_zero() {
            return crate::silence();
        }
        self.fast(factor.reciprocal())
    }

    /// For each event of `self`, query the pattern `func` builds from its
    /// value over that event's part, keeping the inner events' timing
    pub fn inner_bind<F>(self, func: F) -> Pattern
    where
        F: Fn(&Value) -> Pattern + Send + Sync + 'static,
    {
        let outer = self;
        Pattern::new(move |state| {
            let mut result = Vec::new();
            for outer_hap in outer.query(state)? {
                let inner = func(&outer_hap.value);
                result.extend(inner.query(state.set_span(outer_hap.part))?);
            }
            Ok(result)
        })
    }

    /// Speed up by a patterned factor
    ///
    /// Non-numeric factor values are silent.
    pub fn fast_pat(self, factor: Pattern) -> Pattern {
        factor.inner_bind(move |value| match value.as_number() {
            Some(n) => self.clone().fast(n),
            None => crate::silence(),
        })
    }

    /// Slow down by a patterned factor
    pub fn slow_pat(self, factor: Pattern) -> Pattern {
        factor.inner_bind(move |value| match value.as_number() {
            Some(n) => self.clone().slow(n),
            None => crate::silence(),
        })
    }

    /// Repeat each cycle n times
    ///
    /// Each source cycle is repeated n times before moving to the next.
    pub fn repeat_cycles(self, n: usize) -> Pattern {
        if n <= 1 {
            return self;
        }

        let query_func = self.query_func;
        let n_frac = Fraction::from_int(n as i64);

        Pattern::new(move |state| {
            let cycle = state.span.begin.floor();
            let source_cycle = (cycle / n_frac).floor();
            let delta = cycle - source_cycle;

            let haps = query_func(state.with_span(|span| span.shift(-delta)))?;
            Ok(haps
                .into_iter()
                .map(|hap| hap.with_span(|span| span.shift(delta)))
                .collect())
        })
        .split_queries()
    }

    /// Apply a Euclidean rhythm as structure
    ///
    /// `hits > steps` is reported when the pattern is queried.
    pub fn euclid(self, hits: i64, steps: i64, rotation: i64) -> Pattern {
        match crate::euclid::euclid_rhythm(hits, steps, rotation) {
            Ok(rhythm) => self.struct_(crate::bool_sequence(&rhythm)),
            Err(err) => Pattern::new(move |_| Err(err.clone())),
        }
    }

    /// Euclidean rhythm whose arguments are themselves patterns
    pub fn euclid_pat(self, hits: Pattern, steps: Pattern, rotation: Pattern) -> Pattern {
        hits.inner_bind(move |h| {
            let source = self.clone();
            let rotation = rotation.clone();
            let Some(h) = h.as_number() else {
                return crate::silence();
            };
            steps.clone().inner_bind(move |s| {
                let source = source.clone();
                let Some(s) = s.as_number() else {
                    return crate::silence();
                };
                rotation.clone().inner_bind(move |r| match r.as_number() {
                    Some(r) => source
                        .clone()
                        .euclid(h.round() as i64, s.round() as i64, r.round() as i64),
                    None => crate::silence(),
                })
            })
        })
    }

    /// Reverse each cycle
    pub fn rev(self) -> Pattern {
        let query_func = self.query_func;
        Pattern::new(move |state| {
            let cycle = state.span.begin.floor();
            let next_cycle = cycle + Fraction::one();
            let reflect = |span: &TimeSpan| {
                TimeSpan::new(cycle + next_cycle - span.end, cycle + next_cycle - span.begin)
            };

            let haps = query_func(state.set_span(reflect(&state.span)))?;
            Ok(haps.into_iter().map(|hap| hap.with_span(reflect)).collect())
        })
        .split_queries()
    }

    /// Shift pattern in time
    ///
    /// Positive amounts shift the pattern later, negative amounts earlier.
    pub fn shift(self, amount: impl Into<Fraction>) -> Pattern {
        let amount = amount.into();
        self.with_query_time(move |t| t - amount)
            .with_hap_time(move |t| t + amount)
    }

    /// Nudge pattern earlier in time
    pub fn early(self, amount: impl Into<Fraction>) -> Pattern {
        self.shift(-amount.into())
    }

    /// Nudge pattern later in time
    pub fn late(self, amount: impl Into<Fraction>) -> Pattern {
        self.shift(amount)
    }

    /// Randomly remove events with probability `amount`
    ///
    /// Each event is decided by a draw keyed by the query seed, `salt` and
    /// the event's onset, so fragments of one event agree and re-querying
    /// never re-rolls.
    pub fn degrade_by(self, amount: f64, salt: u64) -> Pattern {
        self.with_haps(move |haps, state| {
            haps.into_iter()
                .filter(|hap| seed::onset_chance(state.seed, salt, hap.onset()) >= amount)
                .collect()
        })
    }

    /// Randomly remove 50% of events
    pub fn degrade(self, salt: u64) -> Pattern {
        self.degrade_by(0.5, salt)
    }

    /// Apply a rhythmic structure to this pattern
    ///
    /// The structure pattern provides the timing, this pattern provides the
    /// values. Each structure event samples this pattern over its whole
    /// span; the result keeps the structure's whole and the overlap of both
    /// parts.
    pub fn struct_(self, structure: Pattern) -> Pattern {
        let value_pattern = self;
        Pattern::new(move |state| {
            let mut result_haps = Vec::new();

            for structure_hap in structure.query(state)? {
                let value_state = state.set_span(structure_hap.whole_or_part());
                for value_hap in value_pattern.query(value_state)? {
                    if let Some(new_part) = structure_hap.part.intersection(&value_hap.part) {
                        result_haps.push(Hap::new(structure_hap.whole, new_part, value_hap.value));
                    }
                }
            }

            Ok(result_haps)
        })
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            query_func: self.query_func.clone(),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fastcat, pure, sequence, slowcat};

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d)
    }

    fn onsets(haps: &[Hap]) -> Vec<Fraction> {
        haps.iter().filter(|h| h.has_onset()).map(|h| h.onset()).collect()
    }

    fn strings(haps: &[Hap]) -> Vec<String> {
        haps.iter().map(|h| h.value.to_string()).collect()
    }

    fn seq(names: &[&str]) -> Pattern {
        sequence(names.iter().map(|n| pure(Value::from(*n))).collect())
    }

    #[test]
    fn test_pattern_creation() {
        let pattern = Pattern::new(|_state| Ok(Vec::new()));
        let haps = pattern.query_span(Fraction::zero(), Fraction::one()).unwrap();
        assert!(haps.is_empty());
    }

    #[test]
    fn test_reversed_span_is_error() {
        let result = pure(Value::from(1.0)).query_span(Fraction::one(), Fraction::zero());
        assert_eq!(
            result,
            Err(RangeError::ReversedSpan {
                begin: Fraction::one(),
                end: Fraction::zero()
            })
        );
    }

    #[test]
    fn test_empty_span_is_empty() {
        let haps = pure(Value::from(1.0))
            .query_span(frac(1, 2), frac(1, 2))
            .unwrap();
        assert!(haps.is_empty());
    }

    #[test]
    fn test_pattern_with_value() {
        let mapped = pure(Value::Number(10.0)).with_value(|v| match v {
            Value::Number(n) => Value::Number(n + 5.0),
            _ => v.clone(),
        });

        let haps = mapped.query_span(Fraction::zero(), Fraction::one()).unwrap();
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].value, Value::Number(15.0));
    }

    #[test]
    fn test_fast_and_slow() {
        let pat = seq(&["a", "b"]);
        let fast = pat.clone().fast(2).query_span(Fraction::zero(), Fraction::one()).unwrap();
        assert_eq!(strings(&fast), vec!["a", "b", "a", "b"]);
        assert_eq!(onsets(&fast), vec![frac(0, 1), frac(1, 4), frac(1, 2), frac(3, 4)]);

        let slow = pat.slow(2).query_span(Fraction::zero(), Fraction::from_int(2)).unwrap();
        assert_eq!(strings(&slow), vec!["a", "b"]);
        assert_eq!(slow[1].whole, Some(TimeSpan::from_ints(1, 2)));
    }

    #[test]
    fn test_fast_zero_is_silence() {
        let haps = seq(&["a", "b"])
            .fast(0)
            .query_span(Fraction::zero(), Fraction::from_int(4))
            .unwrap();
        assert!(haps.is_empty());
    }

    #[test]
    fn test_fast_pat() {
        let factor = slowcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]);
        let pat = pure(Value::from("bd")).fast_pat(factor);
        let haps = pat.query_span(Fraction::zero(), Fraction::from_int(2)).unwrap();
        assert_eq!(onsets(&haps), vec![frac(0, 1), frac(1, 1), frac(3, 2)]);
    }

    #[test]
    fn test_repeat_cycles() {
        let pattern = slowcat(vec![pure(Value::Number(0.0)), pure(Value::Number(1.0))]);
        let haps = pattern
            .repeat_cycles(2)
            .fast(6)
            .query_span(Fraction::zero(), Fraction::one())
            .unwrap();

        let values: Vec<f64> = haps.iter().filter_map(|h| h.value.as_number()).collect();
        assert_eq!(values, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_euclid_3_8() {
        let haps = pure(Value::from("bd"))
            .euclid(3, 8, 0)
            .query_span(Fraction::zero(), Fraction::one())
            .unwrap();
        assert_eq!(onsets(&haps), vec![frac(0, 8), frac(3, 8), frac(6, 8)]);
        assert!(haps.iter().all(|h| h.duration() == frac(1, 8)));
    }

    #[test]
    fn test_euclid_keeps_source_values() {
        let haps = seq(&["a", "b"])
            .euclid(3, 8, 0)
            .query_span(Fraction::zero(), Fraction::one())
            .unwrap();
        assert_eq!(strings(&haps), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_euclid_hits_exceed_steps_at_query_time() {
        let pat = pure(Value::from("bd")).euclid(9, 8, 0);
        assert_eq!(
            pat.query_span(Fraction::zero(), Fraction::one()),
            Err(RangeError::EuclidHitsExceedSteps { hits: 9, steps: 8 })
        );
    }

    #[test]
    fn test_euclid_pat_rejects_huge_step_counts() {
        let pat = pure(Value::from("bd")).euclid_pat(
            pure(Value::from(1.0)),
            pure(Value::from(4e9)),
            pure(Value::from(0.0)),
        );
        assert!(matches!(
            pat.query_span(Fraction::zero(), Fraction::one()),
            Err(RangeError::EuclidTooManySteps { .. })
        ));
    }

    #[test]
    fn test_euclid_pat_alternates_hits() {
        let hits = slowcat(vec![pure(Value::from(3.0)), pure(Value::from(5.0))]);
        let pat = pure(Value::from("bd")).euclid_pat(
            hits,
            pure(Value::from(8.0)),
            pure(Value::from(0.0)),
        );
        let haps = pat.query_span(Fraction::zero(), Fraction::from_int(2)).unwrap();
        assert_eq!(onsets(&haps).len(), 8);
    }

    #[test]
    fn test_rev() {
        let haps = seq(&["a", "b", "c"])
            .rev()
            .query_span(Fraction::zero(), Fraction::from_int(2))
            .unwrap();
        assert_eq!(strings(&haps), vec!["c", "b", "a", "c", "b", "a"]);
        assert_eq!(haps[0].whole, Some(TimeSpan::new(frac(0, 1), frac(1, 3))));
    }

    #[test]
    fn test_shift() {
        let haps = pure(Value::from("bd"))
            .late(frac(1, 4))
            .query_span(Fraction::zero(), Fraction::one())
            .unwrap();
        assert_eq!(onsets(&haps), vec![frac(1, 4)]);

        let early = pure(Value::from("bd"))
            .early(frac(1, 4))
            .query_span(Fraction::zero(), Fraction::one())
            .unwrap();
        assert_eq!(onsets(&early), vec![frac(3, 4)]);
    }

    #[test]
    fn test_degrade_is_deterministic() {
        let pat = pure(Value::from("hh")).fast(16).degrade_by(0.5, 3);
        let span = TimeSpan::from_ints(0, 4);
        let first = pat.query_seeded(span, 11).unwrap();
        let second = pat.query_seeded(span, 11).unwrap();
        assert_eq!(first, second);
        assert!(first.len() < 64);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_degrade_agrees_across_windows() {
        let pat = pure(Value::from("hh")).fast(8).degrade_by(0.5, 3);
        let whole = pat.query_seeded(TimeSpan::from_ints(0, 1), 5).unwrap();
        let mut halves = pat.query_seeded(TimeSpan::new(frac(0, 1), frac(1, 2)), 5).unwrap();
        halves.extend(pat.query_seeded(TimeSpan::new(frac(1, 2), frac(1, 1)), 5).unwrap());
        assert_eq!(whole, halves);
    }

    #[test]
    fn test_struct() {
        let values = fastcat(vec![
            pure(Value::from("a")),
            pure(Value::from("b")),
            pure(Value::from("c")),
            pure(Value::from("d")),
        ]);
        let structure = crate::bool_sequence(&[true, false, true, false]);

        let haps = values
            .struct_(structure)
            .query_span(Fraction::zero(), Fraction::one())
            .unwrap();
        assert_eq!(strings(&haps), vec!["a", "c"]);
    }

    #[test]
    fn test_query_is_sorted_by_onset() {
        let pat = crate::stack(vec![seq(&["a", "b"]), seq(&["c", "d", "e", "f"])]);
        let haps = pat.query_span(Fraction::zero(), Fraction::one()).unwrap();
        assert_eq!(strings(&haps), vec!["a", "c", "d", "b", "e", "f"]);
    }
}
