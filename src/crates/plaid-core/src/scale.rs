//! Scale-degree to pitch mapping
//!
//! `Scale::parse("C5:minor")` gives a root MIDI note and interval set;
//! degrees wrap into neighbouring octaves in both directions.

use crate::{Pattern, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_OCTAVE: i32 = 3;

/// Octaves a root note may name (MIDI octaves -1 through 9)
const OCTAVES: std::ops::RangeInclusive<i32> = -1..=9;

/// Degrees beyond this are clamped before they are turned into notes
const MAX_DEGREE: i64 = 10_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("scale '{0}' is missing the ':' between root and mode")]
    MissingMode(String),

    #[error("invalid root note '{0}'")]
    InvalidRoot(String),

    #[error("unknown scale mode '{0}'")]
    UnknownMode(String),
}

fn scale_intervals(mode: &str) -> Option<&'static [i32]> {
    match mode {
        "major" | "ionian" => Some(&[0, 2, 4, 5, 7, 9, 11]),
        "minor" | "aeolian" => Some(&[0, 2, 3, 5, 7, 8, 10]),
        "dorian" => Some(&[0, 2, 3, 5, 7, 9, 10]),
        "phrygian" => Some(&[0, 1, 3, 5, 7, 8, 10]),
        "lydian" => Some(&[0, 2, 4, 6, 7, 9, 11]),
        "mixolydian" => Some(&[0, 2, 4, 5, 7, 9, 10]),
        "locrian" => Some(&[0, 1, 3, 5, 6, 8, 10]),
        "pentatonic" | "major_pentatonic" => Some(&[0, 2, 4, 7, 9]),
        "minor_pentatonic" => Some(&[0, 3, 5, 7, 10]),
        "blues" => Some(&[0, 3, 5, 6, 7, 10]),
        "chromatic" => Some(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
        "wholetone" | "whole_tone" => Some(&[0, 2, 4, 6, 8, 10]),
        "harmonic_minor" => Some(&[0, 2, 3, 5, 7, 8, 11]),
        "melodic_minor" => Some(&[0, 2, 3, 5, 7, 9, 11]),
        _ => None,
    }
}

/// Parse a note name like `C`, `F#2` or `Bb5` into a MIDI note number
///
/// Octave 4 holds middle C (60); a missing octave means octave 3.
pub fn note_to_midi(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let pitch_class = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let accidentals = rest
        .chars()
        .take_while(|c| matches!(c, '#' | 's' | 'b' | 'f'))
        .count();
    let offset: i32 = rest[..accidentals]
        .chars()
        .map(|c| if matches!(c, '#' | 's') { 1 } else { -1 })
        .sum();

    let octave_str = &rest[accidentals..];
    let octave = if octave_str.is_empty() {
        DEFAULT_OCTAVE
    } else {
        octave_str.parse::<i32>().ok()?
    };
    if !OCTAVES.contains(&octave) {
        return None;
    }

    Some(12 * (octave + 1) + pitch_class + offset)
}

/// A rooted scale
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    name: String,
    root: i32,
    intervals: &'static [i32],
}

impl Scale {
    /// Parse `root:mode`, e.g. `C5:minor` or `F#:dorian`
    pub fn parse(spec: &str) -> Result<Scale, ScaleError> {
        let (root, mode) = spec
            .split_once(':')
            .ok_or_else(|| ScaleError::MissingMode(spec.to_string()))?;

        let root_midi =
            note_to_midi(root.trim()).ok_or_else(|| ScaleError::InvalidRoot(root.to_string()))?;

        let mode_key = mode.trim().to_lowercase().replace([' ', '-'], "_");
        let intervals =
            scale_intervals(&mode_key).ok_or_else(|| ScaleError::UnknownMode(mode.to_string()))?;

        Ok(Scale {
            name: spec.to_string(),
            root: root_midi,
            intervals,
        })
    }

    /// MIDI note of the root
    pub fn root(&self) -> i32 {
        self.root
    }

    /// MIDI note for a (possibly negative) scale degree
    ///
    /// Degrees are clamped to +/-10000.
    pub fn degree(&self, degree: i64) -> i64 {
        let degree = degree.clamp(-MAX_DEGREE, MAX_DEGREE);
        let len = self.intervals.len() as i64;
        let octave = degree.div_euclid(len);
        let step = degree.rem_euclid(len) as usize;
        self.root as i64 + 12 * octave + self.intervals[step] as i64
    }
}

impl FromStr for Scale {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::parse(s)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Pattern {
    /// Turn scale degrees into notes
    ///
    /// An `n` control (or a bare number) is read as a degree and replaced by
    /// a `note` control. Other values pass through.
    pub fn scale(self, scale: Scale) -> Pattern {
        self.with_value(move |value| match value {
            Value::Number(d) => {
                let mut map = crate::ValueMap::new();
                map.insert("note".to_string(), scale_note(&scale, *d));
                Value::Map(map)
            }
            Value::Map(map) => match map.get("n").and_then(Value::as_number) {
                Some(d) => {
                    let mut map = map.clone();
                    map.remove("n");
                    map.insert("note".to_string(), scale_note(&scale, d));
                    Value::Map(map)
                }
                None => value.clone(),
            },
            other => other.clone(),
        })
    }
}

fn scale_note(scale: &Scale, degree: f64) -> Value {
    Value::Number(scale.degree(degree.round() as i64) as f64)
}
