/// Evaluator for mini notation AST
///
/// Converts parsed AST nodes into plaid-core patterns
use crate::ast::*;
use crate::error::Result;
use plaid_core::{choose, pure, silence, slowcat, stack, timecat, Fraction, Pattern, Value};

/// Evaluate an AST node into a Pattern
pub fn evaluate(ast: &Ast) -> Result<Pattern> {
    match ast {
        Ast::Atom(atom) => Ok(eval_atom(atom)),
        Ast::Pattern(pattern) => eval_pattern(pattern),
        Ast::Element(element) => eval_element(element),
    }
}

/// Evaluate an atom into a constant pattern
fn eval_atom(atom: &AtomNode) -> Pattern {
    match &atom.value {
        AtomValue::Number(n) => pure(Value::Number(*n)),
        AtomValue::String(s) => pure(Value::String(s.clone())),
        AtomValue::Silence => silence(),
    }
}

/// Evaluate a pattern node with alignment
fn eval_pattern(pattern: &PatternNode) -> Result<Pattern> {
    if pattern.children.is_empty() {
        return Ok(silence());
    }

    let result = match pattern.alignment {
        Alignment::Sequence => timecat(weighted_steps(&pattern.children)?),
        Alignment::Stack => stack(eval_children(&pattern.children)?),
        Alignment::Rand => choose(
            eval_children(&pattern.children)?,
            pattern.seed.unwrap_or(0),
        ),
        Alignment::Alternate => {
            let layers = pattern
                .children
                .iter()
                .map(eval_alternation)
                .collect::<Result<Vec<_>>>()?;
            stack(layers)
        }
    };

    Ok(result)
}

fn eval_children(children: &[Ast]) -> Result<Vec<Pattern>> {
    children.iter().map(evaluate).collect()
}

/// One comma-separated layer of `<...>`: each step lasts its weight in cycles
fn eval_alternation(layer: &Ast) -> Result<Pattern> {
    let steps = match layer {
        Ast::Pattern(node) if node.alignment == Alignment::Sequence => {
            weighted_steps(&node.children)?
        }
        other => vec![(Fraction::one(), evaluate(other)?)],
    };

    if steps.iter().all(|(weight, _)| *weight == Fraction::one()) {
        return Ok(slowcat(steps.into_iter().map(|(_, p)| p).collect()));
    }

    let total = steps
        .iter()
        .fold(Fraction::zero(), |acc, (weight, _)| acc + *weight);
    Ok(timecat(steps).slow(total))
}

/// Expand sequence steps into (weight, pattern) slots, repeating `!` copies
fn weighted_steps(children: &[Ast]) -> Result<Vec<(Fraction, Pattern)>> {
    let mut steps = Vec::with_capacity(children.len());
    for child in children {
        let (weight, reps) = match child {
            Ast::Element(element) => (element.weight, element.reps),
            _ => (1.0, 1),
        };
        let pattern = evaluate(child)?;
        let weight = Fraction::from_float(weight);
        for _ in 0..reps {
            steps.push((weight, pattern.clone()));
        }
    }
    Ok(steps)
}

/// Evaluate an element, applying its operators left to right
fn eval_element(element: &ElementNode) -> Result<Pattern> {
    let mut pattern = evaluate(&element.source)?;

    for op in &element.ops {
        pattern = apply_slice_op(pattern, op)?;
    }

    Ok(pattern)
}

fn apply_slice_op(pattern: Pattern, op: &SliceOp) -> Result<Pattern> {
    let result = match op {
        SliceOp::Stretch { amount, op_type } => match (amount.literal_number(), op_type) {
            (Some(n), StretchType::Fast) => pattern.fast(n),
            (Some(n), StretchType::Slow) => pattern.slow(n),
            (None, StretchType::Fast) => pattern.fast_pat(evaluate(amount)?),
            (None, StretchType::Slow) => pattern.slow_pat(evaluate(amount)?),
        },
        SliceOp::Euclid {
            hits,
            steps,
            rotation,
        } => {
            let literal_rotation = match rotation {
                Some(r) => r.literal_number(),
                None => Some(0.0),
            };
            match (hits.literal_number(), steps.literal_number(), literal_rotation) {
                (Some(h), Some(s), Some(r)) => pattern.euclid(h as i64, s as i64, r as i64),
                _ => {
                    let rotation = match rotation {
                        Some(r) => evaluate(r)?,
                        None => pure(Value::Number(0.0)),
                    };
                    pattern.euclid_pat(evaluate(hits)?, evaluate(steps)?, rotation)
                }
            }
        }
        SliceOp::DegradeBy { amount, seed } => pattern.degrade_by(*amount, *seed),
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use plaid_core::{Hap, TimeSpan};

    fn eval(src: &str) -> Pattern {
        evaluate(&parse(src).unwrap()).unwrap()
    }

    fn query(src: &str, begin: i64, end: i64) -> Vec<Hap> {
        eval(src)
            .query_seeded(TimeSpan::from_ints(begin, end), 0)
            .unwrap()
    }

    fn names(haps: &[Hap]) -> Vec<String> {
        haps.iter().map(|h| h.value.to_string()).collect()
    }

    fn onsets(haps: &[Hap]) -> Vec<Fraction> {
        haps.iter().map(|h| h.part.begin).collect()
    }

    #[test]
    fn test_eval_single_atom() {
        let haps = query("bd", 0, 1);
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].whole, Some(TimeSpan::from_ints(0, 1)));
    }

    #[test]
    fn test_eval_sequence() {
        let haps = query("bd sd hh cp", 0, 1);
        assert_eq!(names(&haps), vec!["bd", "sd", "hh", "cp"]);
        assert_eq!(haps[1].part.begin, Fraction::new(1, 4));
    }

    #[test]
    fn test_eval_silence() {
        let haps = query("bd ~ sd -", 0, 1);
        assert_eq!(names(&haps), vec!["bd", "sd"]);
        assert_eq!(onsets(&haps), vec![Fraction::zero(), Fraction::new(1, 2)]);
    }

    #[test]
    fn test_eval_nested() {
        let haps = query("bd [sd sd]", 0, 1);
        assert_eq!(
            onsets(&haps),
            vec![Fraction::zero(), Fraction::new(1, 2), Fraction::new(3, 4)]
        );
    }

    #[test]
    fn test_eval_stack() {
        let haps = query("bd*2, hh*4", 0, 1);
        assert_eq!(haps.len(), 6);
    }

    #[test]
    fn test_eval_weights() {
        let haps = query("a@3 b", 0, 1);
        assert_eq!(haps[0].whole, Some(TimeSpan::new(Fraction::zero(), Fraction::new(3, 4))));
        assert_eq!(haps[1].part.begin, Fraction::new(3, 4));

        let elongated = query("a _ _ b", 0, 1);
        assert_eq!(elongated[1].part.begin, Fraction::new(3, 4));
    }

    #[test]
    fn test_eval_replicate_adds_steps() {
        let haps = query("a!3 b", 0, 1);
        assert_eq!(names(&haps), vec!["a", "a", "a", "b"]);
        assert_eq!(haps[3].part.begin, Fraction::new(3, 4));

        let bare = query("a ! b", 0, 1);
        assert_eq!(names(&bare), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_eval_alternation() {
        let haps = query("<a b c>", 0, 4);
        assert_eq!(names(&haps), vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_eval_nested_alternation() {
        let haps = query("<a <b c>>", 0, 4);
        assert_eq!(names(&haps), vec!["a", "b", "a", "c"]);
    }

    #[test]
    fn test_eval_weighted_alternation_holds() {
        let haps = query("<a@3 b>", 0, 4);
        assert_eq!(names(&haps), vec!["a", "b"]);
        assert_eq!(haps[0].whole, Some(TimeSpan::from_ints(0, 3)));

        // A query inside the held span sees a fragment without onset
        let held = query("<a@3 b>", 1, 2);
        assert_eq!(held.len(), 1);
        assert!(!held[0].has_onset());
    }

    #[test]
    fn test_eval_stacked_alternation() {
        let haps = query("<a b, c d>", 1, 2);
        let mut got = names(&haps);
        got.sort();
        assert_eq!(got, vec!["b", "d"]);
    }

    #[test]
    fn test_eval_patterned_fast() {
        let counts: Vec<usize> = (0..4).map(|c| query("bd*<1 2 4 8>", c, c + 1).len()).collect();
        assert_eq!(counts, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_eval_slow() {
        let haps = query("[a b]/2", 0, 2);
        assert_eq!(names(&haps), vec!["a", "b"]);
        assert_eq!(haps[1].part.begin, Fraction::one());
    }

    #[test]
    fn test_eval_euclid() {
        let haps = query("bd(3,8)", 0, 1);
        assert_eq!(
            onsets(&haps),
            vec![Fraction::zero(), Fraction::new(3, 8), Fraction::new(3, 4)]
        );
    }

    #[test]
    fn test_eval_euclid_rotation() {
        let haps = query("bd(3,8,2)", 0, 1);
        // x..x..x. rotated left by two gives .x..x.x.
        assert_eq!(
            onsets(&haps),
            vec![Fraction::new(1, 8), Fraction::new(1, 2), Fraction::new(3, 4)]
        );
    }

    #[test]
    fn test_eval_patterned_euclid() {
        let haps = query("bd(<3 5>,8)", 1, 2);
        assert_eq!(haps.len(), 5);
    }

    #[test]
    fn test_eval_euclid_overflow_errors_at_query() {
        let pattern = eval("bd(9,8)");
        assert!(pattern.query_span(Fraction::zero(), Fraction::one()).is_err());
    }

    #[test]
    fn test_eval_degrade_is_reproducible() {
        let pattern = eval("hh*16?");
        let span = TimeSpan::from_ints(0, 8);
        let first = pattern.query_seeded(span, 42).unwrap();
        let second = pattern.query_seeded(span, 42).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty() && first.len() < 128);
    }

    #[test]
    fn test_eval_degrade_extremes() {
        assert_eq!(query("hh*8?0", 0, 1).len(), 8);
        assert!(query("hh*8?1", 0, 1).is_empty());
    }

    #[test]
    fn test_eval_choose_reproducible() {
        let pattern = eval("a | b | c");
        let span = TimeSpan::from_ints(0, 32);
        let first = pattern.query_seeded(span, 9).unwrap();
        assert_eq!(first.len(), 32);
        assert_eq!(first, pattern.query_seeded(span, 9).unwrap());

        let distinct: std::collections::BTreeSet<String> = names(&first).into_iter().collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_eval_numbers() {
        let haps = query("0 -5 7", 0, 1);
        let values: Vec<f64> = haps.iter().filter_map(|h| h.value.as_number()).collect();
        assert_eq!(values, vec![0.0, -5.0, 7.0]);
    }

    #[test]
    fn test_eval_chord_alternation() {
        let haps = query("<[0,3,7] [5,8,12]>", 1, 2);
        let mut values: Vec<f64> = haps.iter().filter_map(|h| h.value.as_number()).collect();
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![5.0, 8.0, 12.0]);
    }

    #[test]
    fn test_eval_drum_layers() {
        let haps = query("[bd bd]*2, sd*4, hh*16, [cp ~]*4", 0, 1);
        let count = |name: &str| haps.iter().filter(|h| h.value.to_string() == name).count();
        assert_eq!(count("bd"), 4);
        assert_eq!(count("sd"), 4);
        assert_eq!(count("hh"), 16);
        assert_eq!(count("cp"), 4);
    }
}
