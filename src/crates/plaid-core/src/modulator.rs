//! Continuous modulators
//!
//! A modulator is a periodic waveform sampled at an event's onset and mapped
//! into a numeric range. It holds no phase state: the value depends only on
//! the time it is sampled at.

use crate::Fraction;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

/// Periodic waveform with unipolar output in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Cosine,
    Saw,
    ISaw,
    Tri,
    Square,
}

impl Waveform {
    /// Native value at `t` cycles
    pub fn at(self, t: f64) -> f64 {
        let phase = t.rem_euclid(1.0);
        match self {
            Waveform::Sine => 0.5 + 0.5 * (t * TAU).sin(),
            Waveform::Cosine => 0.5 + 0.5 * (t * TAU).cos(),
            Waveform::Saw => phase,
            Waveform::ISaw => 1.0 - phase,
            Waveform::Tri => {
                if phase < 0.5 {
                    phase * 2.0
                } else {
                    2.0 - phase * 2.0
                }
            }
            Waveform::Square => {
                if phase < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Sine => "sine",
            Waveform::Cosine => "cosine",
            Waveform::Saw => "saw",
            Waveform::ISaw => "isaw",
            Waveform::Tri => "tri",
            Waveform::Square => "square",
        };
        f.write_str(name)
    }
}

/// A waveform with an output range and a period in cycles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulator {
    pub waveform: Waveform,
    pub lo: f64,
    pub hi: f64,
    /// Length of one waveform period in cycles
    pub period: f64,
}

impl Modulator {
    /// Unit-range modulator with a one-cycle period
    pub fn new(waveform: Waveform) -> Self {
        Modulator {
            waveform,
            lo: 0.0,
            hi: 1.0,
            period: 1.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn cosine() -> Self {
        Self::new(Waveform::Cosine)
    }

    pub fn saw() -> Self {
        Self::new(Waveform::Saw)
    }

    pub fn isaw() -> Self {
        Self::new(Waveform::ISaw)
    }

    pub fn tri() -> Self {
        Self::new(Waveform::Tri)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    /// Map the native [0, 1] output affinely onto [lo, hi]
    pub fn range(self, lo: f64, hi: f64) -> Self {
        Modulator { lo, hi, ..self }
    }

    /// Stretch the period by `k`; non-positive factors are ignored
    pub fn slow(self, k: f64) -> Self {
        if k > 0.0 && k.is_finite() {
            Modulator {
                period: self.period * k,
                ..self
            }
        } else {
            self
        }
    }

    /// Shrink the period by `k`; non-positive factors are ignored
    pub fn fast(self, k: f64) -> Self {
        if k > 0.0 && k.is_finite() {
            Modulator {
                period: self.period / k,
                ..self
            }
        } else {
            self
        }
    }

    /// Sample the modulator at time `t` (in cycles)
    pub fn sample(&self, t: Fraction) -> f64 {
        let native = self.waveform.at(t.to_float() / self.period);
        self.lo + (self.hi - self.lo) * native
    }
}
