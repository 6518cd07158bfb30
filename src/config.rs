//! TOML composition files
//!
//! ```toml
//! title = "Example"
//! seed = 7
//! timeline = "intro@4 verse@4"
//!
//! [tempo]
//! bpm = 140
//! beats_per_cycle = 4
//!
//! [[sections.intro.layers]]
//! s = "bd*4"
//! params = { bank = "RolandTR909" }
//! ```

use plaid_core::{Modulator, Rewrite, Waveform};
use serde::Deserialize;
use std::collections::BTreeMap;

fn default_beats_per_cycle() -> u32 {
    4
}

fn unit_range() -> [f64; 2] {
    [0.0, 1.0]
}

/// A whole composition as written in a TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositionConfig {
    #[serde(default)]
    pub title: Option<String>,
    /// Seed for every random choice in the piece
    #[serde(default)]
    pub seed: u64,
    /// Weighted section list, e.g. `"<intro@4 verse@4>"`
    pub timeline: String,
    /// Play the timeline once instead of looping
    #[serde(default)]
    pub finite: bool,
    pub tempo: TempoConfig,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TempoConfig {
    pub bpm: f64,
    #[serde(default = "default_beats_per_cycle")]
    pub beats_per_cycle: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    /// Controls applied to every layer of the section
    #[serde(default)]
    pub params: BTreeMap<String, ParamConfig>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

/// One pattern layer inside a section
///
/// Exactly one of `s`, `n` or `note` gives the source pattern.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    pub s: Option<String>,
    pub n: Option<String>,
    pub note: Option<String>,
    pub scale: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamConfig>,
    pub fast: Option<f64>,
    pub slow: Option<f64>,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

/// A control value: constant, or a modulator table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamConfig {
    Number(f64),
    Text(String),
    Modulated(ModulatorConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModulatorConfig {
    pub wave: Waveform,
    #[serde(default = "unit_range")]
    pub range: [f64; 2],
    pub slow: Option<f64>,
    pub fast: Option<f64>,
}

impl ModulatorConfig {
    pub fn to_modulator(&self) -> Modulator {
        let [lo, hi] = self.range;
        let mut modulator = Modulator::new(self.wave).range(lo, hi);
        if let Some(k) = self.slow {
            modulator = modulator.slow(k);
        }
        if let Some(k) = self.fast {
            modulator = modulator.fast(k);
        }
        modulator
    }
}

/// `{ every = 4, rewrite = { add = 12 } }` or `{ sometimes = 0.5, rewrite = "rev" }`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    pub every: Option<u32>,
    pub sometimes: Option<f64>,
    pub rewrite: Rewrite,
}

impl CompositionConfig {
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}
