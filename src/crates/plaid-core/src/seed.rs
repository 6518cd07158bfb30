//! Seeded random streams
//!
//! Every probabilistic decision draws from a stream keyed by the composition
//! seed, a per-node salt and a time key (cycle index or event onset). The
//! same key always produces the same stream.

use crate::Fraction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fold a list of words into a single 64-bit key
pub fn mix(words: &[u64]) -> u64 {
    let mut state = 0u64;
    let mut out = 0u64;
    for &word in words {
        state ^= word;
        out = splitmix64(&mut state);
    }
    out
}

/// Stable salt for a named pattern node (FNV-1a)
pub fn salt_for(name: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Random stream for one cycle of one node
pub fn cycle_rng(seed: u64, salt: u64, cycle: i64) -> StdRng {
    StdRng::seed_from_u64(mix(&[seed, salt, cycle as u64]))
}

/// Random stream for one event, keyed by its exact onset
pub fn onset_rng(seed: u64, salt: u64, onset: Fraction) -> StdRng {
    StdRng::seed_from_u64(mix(&[
        seed,
        salt,
        onset.numerator as u64,
        onset.denominator as u64,
    ]))
}

/// Uniform draw in [0, 1) for one cycle of one node
pub fn cycle_chance(seed: u64, salt: u64, cycle: i64) -> f64 {
    cycle_rng(seed, salt, cycle).gen::<f64>()
}

/// Uniform draw in [0, 1) for one event
pub fn onset_chance(seed: u64, salt: u64, onset: Fraction) -> f64 {
    onset_rng(seed, salt, onset).gen::<f64>()
}
