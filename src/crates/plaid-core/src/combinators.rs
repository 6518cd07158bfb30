use crate::{seed, Fraction, Hap, Pattern, TimeSpan, Value};
use rand::Rng;
use std::sync::Arc;

/// Create a pattern with a single constant value
///
/// The value repeats once per cycle: every event's whole is a full cycle.
pub fn pure(value: Value) -> Pattern {
    Pattern::new(move |state| {
        Ok(state
            .span
            .span_cycles()
            .into_iter()
            .map(|part| Hap::new(Some(part.whole_cycle()), part, value.clone()))
            .collect())
    })
}

/// Create an empty/silent pattern
///
/// Returns no events for any query
pub fn silence() -> Pattern {
    Pattern::new(|_state| Ok(Vec::new()))
}

/// Squeeze a pattern's cycles into `[begin, end)` of every cycle
///
/// `begin` and `end` are cycle fractions with `0 <= begin < end <= 1`.
/// Queries outside the slot never reach the child.
pub fn compress(pattern: Pattern, begin: Fraction, end: Fraction) -> Pattern {
    let width = end - begin;
    if width <= Fraction::zero() || begin < Fraction::zero() || end > Fraction::one() {
        return silence();
    }

    Pattern::new(move |state| {
        let cycle = state.span.begin.floor();
        let slot = TimeSpan::new(cycle + begin, cycle + end);
        let Some(window) = state.span.intersection(&slot) else {
            return Ok(Vec::new());
        };

        let to_child = |t: Fraction| cycle + (t - slot.begin) / width;
        let from_child = |t: Fraction| slot.begin + (t - cycle) * width;

        let haps = pattern.query(state.set_span(window.with_time(to_child)))?;
        Ok(haps
            .into_iter()
            .map(|hap| hap.with_span(|span| span.with_time(from_child)))
            .collect())
    })
    .split_queries()
}

/// Concatenate weighted patterns into one cycle
///
/// Each pattern takes a share of the cycle proportional to its weight.
/// Non-positive weights are skipped.
pub fn timecat(weighted: Vec<(Fraction, Pattern)>) -> Pattern {
    let weighted: Vec<_> = weighted
        .into_iter()
        .filter(|(w, _)| *w > Fraction::zero())
        .collect();
    let total = weighted
        .iter()
        .fold(Fraction::zero(), |acc, (w, _)| acc + *w);
    if weighted.is_empty() {
        return silence();
    }
    if weighted.len() == 1 {
        return weighted.into_iter().map(|(_, p)| p).next().unwrap_or_else(silence);
    }

    let mut offset = Fraction::zero();
    let mut slots = Vec::with_capacity(weighted.len());
    for (weight, pattern) in weighted {
        let begin = offset / total;
        offset = offset + weight;
        slots.push(compress(pattern, begin, offset / total));
    }
    stack(slots)
}

/// Concatenate patterns, cramming them all into one cycle
///
/// This is also known as "sequence": each of n patterns plays in 1/n of
/// every cycle
pub fn fastcat(patterns: Vec<Pattern>) -> Pattern {
    timecat(
        patterns
            .into_iter()
            .map(|p| (Fraction::one(), p))
            .collect(),
    )
}

/// Alias for fastcat
pub fn sequence(patterns: Vec<Pattern>) -> Pattern {
    fastcat(patterns)
}

/// A cycle-long sequence of steps, `true` steps carry 1.0, `false` are rests
pub fn bool_sequence(steps: &[bool]) -> Pattern {
    fastcat(
        steps
            .iter()
            .map(|&on| if on { pure(Value::Number(1.0)) } else { silence() })
            .collect(),
    )
}

/// Concatenate patterns, switching between them successively per cycle
///
/// Cycle `c` plays pattern `c mod n`, which sees its own cycle `floor(c / n)`
/// so nested alternations advance once per visit.
pub fn slowcat(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap_or_else(silence);
    }

    let pat_count = patterns.len() as i64;
    let patterns_rc = Arc::new(patterns);

    Pattern::new(move |state| {
        let cycle = state.span.begin.cycle();
        let pat_n = cycle.rem_euclid(pat_count) as usize;
        let offset = Fraction::from_int(cycle - cycle.div_euclid(pat_count));

        let haps = patterns_rc[pat_n].query(state.with_span(|span| span.shift(-offset)))?;
        Ok(haps
            .into_iter()
            .map(|hap| hap.with_span(|span| span.shift(offset)))
            .collect())
    })
    .split_queries()
}

/// Stack/layer multiple patterns on top of each other
///
/// All patterns play simultaneously; haps come back child by child.
pub fn stack(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap_or_else(silence);
    }

    let patterns_rc = Arc::new(patterns);
    Pattern::new(move |state| {
        let mut haps = Vec::new();
        for pat in patterns_rc.iter() {
            haps.extend(pat.query(state)?);
        }
        Ok(haps)
    })
}

/// Choose - randomly select one pattern per cycle
pub fn choose(patterns: Vec<Pattern>, salt: u64) -> Pattern {
    choose_weighted(patterns.into_iter().map(|p| (p, 1.0)).collect(), salt)
}

/// Choose with weights - select one pattern per cycle using weighted probabilities
///
/// The draw is keyed by the query seed, `salt` and the cycle, so a cycle
/// always picks the same branch for the same seed.
///
/// # Examples
/// ```
/// use plaid_core::{pure, Value, choose_weighted};
///
/// let bd = pure(Value::from("bd"));
/// let sd = pure(Value::from("sd"));
///
/// // bd is 2x more likely to be selected than sd
/// let pattern = choose_weighted(vec![(bd, 2.0), (sd, 1.0)], 0);
/// ```
pub fn choose_weighted(patterns_with_weights: Vec<(Pattern, f64)>, salt: u64) -> Pattern {
    if patterns_with_weights.is_empty() {
        return silence();
    }
    if patterns_with_weights.len() == 1 {
        return patterns_with_weights
            .into_iter()
            .map(|(p, _)| p)
            .next()
            .unwrap_or_else(silence);
    }

    let (patterns, weights): (Vec<Pattern>, Vec<f64>) = patterns_with_weights
        .into_iter()
        .map(|(p, w)| (p, w.max(0.0)))
        .unzip();
    let total_weight: f64 = weights.iter().sum();
    let patterns_rc = Arc::new(patterns);

    Pattern::new(move |state| {
        let mut rng = seed::cycle_rng(state.seed, salt, state.span.begin.cycle());

        // Zero total weight degrades to a uniform choice
        if total_weight <= 0.0 {
            let choice = rng.gen_range(0..patterns_rc.len());
            return patterns_rc[choice].query(state);
        }

        let random_value = rng.gen::<f64>() * total_weight;
        let mut cumulative = 0.0;
        for (i, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if random_value < cumulative {
                return patterns_rc[i].query(state);
            }
        }

        patterns_rc[patterns_rc.len() - 1].query(state)
    })
    .split_queries()
}
