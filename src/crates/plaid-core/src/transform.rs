//! Periodic and probabilistic pattern rewrites
//!
//! Transforms are applied lazily: the decision to rewrite is taken per cycle
//! at query time, never baked into the tree.

use crate::{seed, Pattern, Value};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// When a transform fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// Cycles where `floor(cycle) mod n == 0`
    Every(NonZeroU32),
    /// Cycles where the seeded draw falls below the probability
    Sometimes(f64),
}

/// What a transform does to the pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rewrite {
    Rev,
    Add(f64),
    Fast(f64),
    Slow(f64),
    Degrade(f64),
}

/// A conditional rewrite attached to a pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub condition: Condition,
    pub rewrite: Rewrite,
    /// Identity of the pattern this transform belongs to
    pub salt: u64,
}

impl Transform {
    pub fn new(condition: Condition, rewrite: Rewrite, salt: u64) -> Self {
        Transform {
            condition,
            rewrite,
            salt,
        }
    }

    /// Attach this transform to a pattern
    pub fn apply(&self, pattern: Pattern) -> Pattern {
        let rewrite = self.rewrite;
        let salt = self.salt;
        let op = move |p: Pattern| rewrite.apply(p, salt);
        match self.condition {
            Condition::Every(n) => pattern.every(n, op),
            Condition::Sometimes(p) => pattern.sometimes_by(p, salt, op),
        }
    }
}

impl Rewrite {
    /// Rewrite a pattern unconditionally
    pub fn apply(self, pattern: Pattern, salt: u64) -> Pattern {
        match self {
            Rewrite::Rev => pattern.rev(),
            Rewrite::Add(x) => pattern.add(x),
            Rewrite::Fast(k) => pattern.fast(k),
            Rewrite::Slow(k) => pattern.slow(k),
            // Offset the salt so degrade draws differ from the gating draw
            Rewrite::Degrade(p) => pattern.degrade_by(p, salt.wrapping_add(1)),
        }
    }
}

/// Add `x` to a pitch-like value
///
/// Targets `note` if present, else `n`, else a bare number. Other values
/// pass through unchanged.
pub fn add_to_value(value: &Value, x: f64) -> Value {
    match value {
        Value::Number(n) => Value::Number(n + x),
        Value::Map(map) => {
            let mut map = map.clone();
            for key in ["note", "n"] {
                if let Some(Value::Number(n)) = map.get(key) {
                    let shifted = n + x;
                    map.insert(key.to_string(), Value::Number(shifted));
                    break;
                }
            }
            Value::Map(map)
        }
        other => other.clone(),
    }
}

impl Pattern {
    /// Apply `op` on cycles where `floor(cycle) mod n == 0`
    pub fn every<F>(self, n: NonZeroU32, op: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        let transformed = op(self.clone());
        let n = n.get() as i64;
        Pattern::new(move |state| {
            if state.span.begin.cycle().rem_euclid(n) == 0 {
                transformed.query(state)
            } else {
                self.query(state)
            }
        })
        .split_queries()
    }

    /// Apply `op` on a cycle with probability `prob`
    ///
    /// The draw is keyed by the query seed, `salt` and the cycle index, so
    /// repeated queries of a cycle always decide the same way.
    pub fn sometimes_by<F>(self, prob: f64, salt: u64, op: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        let transformed = op(self.clone());
        Pattern::new(move |state| {
            let cycle = state.span.begin.cycle();
            if seed::cycle_chance(state.seed, salt, cycle) < prob {
                transformed.query(state)
            } else {
                self.query(state)
            }
        })
        .split_queries()
    }

    /// Apply `op` on half of the cycles
    pub fn sometimes<F>(self, salt: u64, op: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        self.sometimes_by(0.5, salt, op)
    }

    /// Apply `op` on three quarters of the cycles
    pub fn often<F>(self, salt: u64, op: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        self.sometimes_by(0.75, salt, op)
    }

    /// Apply `op` on a quarter of the cycles
    pub fn rarely<F>(self, salt: u64, op: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        self.sometimes_by(0.25, salt, op)
    }

    /// Shift pitch by `x`
    pub fn add(self, x: f64) -> Pattern {
        self.with_value(move |v| add_to_value(v, x))
    }

    /// Attach transforms in order; each one wraps the previous result
    pub fn transform_all(self, transforms: &[Transform]) -> Pattern {
        transforms.iter().fold(self, |pat, t| t.apply(pat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pure, sequence, Fraction, Hap, TimeSpan};

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn cycle_values(haps: &[Hap]) -> Vec<f64> {
        haps.iter().filter_map(|h| h.value.as_number()).collect()
    }

    #[test]
    fn test_every_fires_on_multiples() {
        let pat = pure(Value::from(0.0)).every(nz(4), |p| p.add(12.0));
        let haps = pat
            .query_span(Fraction::zero(), Fraction::from_int(8))
            .unwrap();
        assert_eq!(
            cycle_values(&haps),
            vec![12.0, 0.0, 0.0, 0.0, 12.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_every_negative_cycles() {
        let pat = pure(Value::from(0.0)).every(nz(4), |p| p.add(1.0));
        let haps = pat
            .query_span(Fraction::from_int(-4), Fraction::from_int(-3))
            .unwrap();
        assert_eq!(cycle_values(&haps), vec![1.0]);
    }

    #[test]
    fn test_sometimes_is_reproducible() {
        let pat = sequence(vec![pure(Value::from(1.0)), pure(Value::from(2.0))])
            .sometimes(17, |p| p.rev());
        let span = TimeSpan::from_ints(0, 32);
        let first = pat.query_seeded(span, 3).unwrap();
        let second = pat.query_seeded(span, 3).unwrap();
        assert_eq!(first, second);

        // Some cycles are reversed, some are not
        let reversed = first
            .chunks(2)
            .filter(|pair| pair[0].value == Value::from(2.0))
            .count();
        assert!(reversed > 0 && reversed < 32);
    }

    #[test]
    fn test_sometimes_extremes() {
        let base = pure(Value::from(0.0));
        let always = base.clone().sometimes_by(1.0, 1, |p| p.add(1.0));
        let never = base.sometimes_by(0.0, 1, |p| p.add(1.0));
        let span = TimeSpan::from_ints(0, 16);
        assert!(cycle_values(&always.query_seeded(span, 5).unwrap())
            .iter()
            .all(|v| *v == 1.0));
        assert!(cycle_values(&never.query_seeded(span, 5).unwrap())
            .iter()
            .all(|v| *v == 0.0));
    }

    #[test]
    fn test_add_targets_note_then_n() {
        let with_note = Value::from(0.0)
            .with_control("note", Value::from(60.0), "n")
            .with_control("n", Value::from(2.0), "n");
        let shifted = add_to_value(&with_note, 12.0);
        assert_eq!(shifted.get("note"), Some(&Value::from(72.0)));
        assert_eq!(shifted.get("n"), Some(&Value::from(2.0)));

        let with_n = Value::from(3.0).with_control("s", Value::from("sine"), "n");
        assert_eq!(add_to_value(&with_n, 12.0).get("n"), Some(&Value::from(15.0)));

        assert_eq!(add_to_value(&Value::from("bd"), 12.0), Value::from("bd"));
    }

    #[test]
    fn test_transforms_compose_in_order() {
        let transforms = [
            Transform::new(Condition::Every(nz(1)), Rewrite::Add(1.0), 1),
            Transform::new(Condition::Every(nz(2)), Rewrite::Add(10.0), 2),
        ];
        let pat = pure(Value::from(0.0)).transform_all(&transforms);
        let haps = pat
            .query_span(Fraction::zero(), Fraction::from_int(2))
            .unwrap();
        assert_eq!(cycle_values(&haps), vec![11.0, 1.0]);
    }

    #[test]
    fn test_rewrite_deserialize() {
        let rev: Rewrite = serde_json::from_str("\"rev\"").unwrap();
        assert_eq!(rev, Rewrite::Rev);
        let add: Rewrite = serde_json::from_str(r#"{"add": 12}"#).unwrap();
        assert_eq!(add, Rewrite::Add(12.0));
    }
}
