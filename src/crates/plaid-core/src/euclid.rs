//! Euclidean rhythm generation using the Bjorklund algorithm
//!
//! Distributes pulses as evenly as possible across a number of steps, then
//! rotates the result.

use crate::error::{RangeError, Result};

/// Largest step count a Euclidean rhythm may have
pub const MAX_STEPS: i64 = 4096;

/// Generate the unrotated Bjorklund distribution of `pulses` over `steps`
///
/// `pulses` is clamped to `steps`.
///
/// # Examples
/// ```
/// use plaid_core::euclid::bjorklund;
///
/// let pattern = bjorklund(3, 8);
/// let onsets: Vec<usize> = (0..8).filter(|&i| pattern[i]).collect();
/// assert_eq!(onsets, vec![0, 3, 6]);
/// ```
pub fn bjorklund(pulses: usize, steps: usize) -> Vec<bool> {
    let pulses = pulses.min(steps);
    let mut ons = pulses;
    let mut offs = steps - pulses;
    let mut xs: Vec<Vec<bool>> = vec![vec![true]; ons];
    let mut ys: Vec<Vec<bool>> = vec![vec![false]; offs];

    // Each round appends the smaller group onto the head of the larger one
    // until at most one remainder group is left.
    while ons.min(offs) > 1 {
        if ons > offs {
            let rest = xs.split_off(offs);
            for (x, y) in xs.iter_mut().zip(ys.drain(..)) {
                x.extend(y);
            }
            ys = rest;
            let new_ons = offs;
            offs = ons - offs;
            ons = new_ons;
        } else {
            let rest = ys.split_off(ons);
            for (x, y) in xs.iter_mut().zip(ys.drain(..)) {
                x.extend(y);
            }
            ys = rest;
            offs -= ons;
        }
    }

    xs.into_iter().chain(ys).flatten().collect()
}

/// Euclidean rhythm with rotation
///
/// The pattern is rotated left by `rotation` steps (negative rotations turn
/// right). Negative `hits` invert the pattern of `|hits|` pulses. Zero or
/// negative `steps` give an empty pattern; more than [`MAX_STEPS`] is an error.
pub fn euclid_rhythm(hits: i64, steps: i64, rotation: i64) -> Result<Vec<bool>> {
    if steps <= 0 {
        return Ok(Vec::new());
    }
    if steps > MAX_STEPS {
        return Err(RangeError::EuclidTooManySteps {
            steps,
            max: MAX_STEPS,
        });
    }
    if hits.unsigned_abs() > steps as u64 {
        return Err(RangeError::EuclidHitsExceedSteps { hits, steps });
    }

    let mut pattern = bjorklund(hits.unsigned_abs() as usize, steps as usize);
    if hits < 0 {
        pattern.iter_mut().for_each(|step| *step = !*step);
    }

    let rot = rotation.rem_euclid(steps) as usize;
    pattern.rotate_left(rot);
    Ok(pattern)
}
