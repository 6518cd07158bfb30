//! Building playable compositions from configuration
//!
//! Each layer is assembled in a fixed order: source pattern, scale, params,
//! `fast`/`slow`, then transforms in the order they are listed. Section-wide
//! params are applied to the stacked layers last.

use crate::config::{CompositionConfig, LayerConfig, ParamConfig, TransformConfig};
use plaid_core::{
    controls, seed, stack, Condition, Control, Event, Fraction, Pattern, Rewrite, Scale,
    ScaleError, Transform,
};
use plaid_mini::ParseError;
use plaid_timeline::{
    Arrangement, ConfigError, Resolved, Scheduler, Tempo, TimelineSpec,
};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const BUNDLED: &str = include_str!("../compositions/theyve-gone-plaid.toml");

/// Errors raised while turning configuration into a composition
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("section '{section}', layer {layer}: {source}")]
    Syntax {
        section: String,
        layer: usize,
        #[source]
        source: ParseError,
    },

    #[error("section '{section}', layer {layer}: {source}")]
    Scale {
        section: String,
        layer: usize,
        #[source]
        source: ScaleError,
    },

    #[error("section '{section}', layer {layer}: probability {value} is outside [0, 1]")]
    InvalidProbability {
        section: String,
        layer: usize,
        value: f64,
    },

    #[error("section '{section}', layer {layer}: {message}")]
    InvalidLayer {
        section: String,
        layer: usize,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid composition file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompositionError>;

/// A built composition: tempo plus an arrangement of sections
#[derive(Debug, Clone)]
pub struct Composition {
    title: String,
    tempo: Tempo,
    arrangement: Arrangement,
}

impl Composition {
    /// The composition shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CompositionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config = CompositionConfig::from_toml(source)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &CompositionConfig) -> Result<Self> {
        let tempo = Tempo::new(config.tempo.bpm, config.tempo.beats_per_cycle)?;
        let timeline = TimelineSpec::parse(&config.timeline)?;

        let mut builder = Arrangement::builder()
            .timeline(timeline)
            .seed(config.seed)
            .finite(config.finite);

        for (name, section) in &config.sections {
            if section.layers.is_empty() {
                warn!(section = %name, "section has no layers and will be silent");
            }
            let layers = section
                .layers
                .iter()
                .enumerate()
                .map(|(index, layer)| build_layer(name, index, layer))
                .collect::<Result<Vec<_>>>()?;
            let pattern = apply_params(stack(layers), &section.params);
            builder = builder.section(name.clone(), pattern);
        }

        let arrangement = builder.build()?;
        let title = config
            .title
            .clone()
            .unwrap_or_else(|| "untitled".to_string());
        info!(
            title = %title,
            bpm = tempo.bpm(),
            sections = config.sections.len(),
            "built composition"
        );

        Ok(Composition {
            title,
            tempo,
            arrangement,
        })
    }

    /// Events with onsets in `[begin, end)` cycles
    pub fn query(&self, begin: Fraction, end: Fraction) -> plaid_core::Result<Vec<Event>> {
        self.arrangement.query(begin, end)
    }

    pub fn resolve(&self, cycle: Fraction) -> Option<Resolved<'_>> {
        self.arrangement.resolve(cycle)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    /// Length of one pass of the timeline in seconds
    pub fn duration_secs(&self) -> f64 {
        self.arrangement.total_cycles().to_float() * self.tempo.seconds_per_cycle()
    }

    /// The same composition under another seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.arrangement = self.arrangement.with_seed(seed);
        self
    }

    /// A pull scheduler playing this composition
    pub fn scheduler(&self, lookahead: Duration) -> Scheduler {
        Scheduler::new(self.arrangement.clone(), self.tempo).with_lookahead(lookahead)
    }
}

fn build_layer(section: &str, index: usize, layer: &LayerConfig) -> Result<Pattern> {
    let invalid = |message: String| CompositionError::InvalidLayer {
        section: section.to_string(),
        layer: index,
        message,
    };

    let (source, wrap): (&str, fn(Pattern) -> Pattern) =
        match (&layer.s, &layer.n, &layer.note) {
            (Some(src), None, None) => (src.as_str(), controls::s),
            (None, Some(src), None) => (src.as_str(), controls::n),
            (None, None, Some(src)) => (src.as_str(), controls::note),
            _ => {
                return Err(invalid(
                    "exactly one of 's', 'n' or 'note' must be given".to_string(),
                ))
            }
        };

    let compiled = plaid_mini::compile(source).map_err(|source| CompositionError::Syntax {
        section: section.to_string(),
        layer: index,
        source,
    })?;
    let mut pattern = wrap(compiled);

    if let Some(name) = &layer.scale {
        let scale = Scale::parse(name).map_err(|source| CompositionError::Scale {
            section: section.to_string(),
            layer: index,
            source,
        })?;
        pattern = pattern.scale(scale);
    }

    pattern = apply_params(pattern, &layer.params);

    if let Some(k) = layer.fast {
        pattern = pattern.fast(positive(k, "fast").map_err(invalid)?);
    }
    if let Some(k) = layer.slow {
        pattern = pattern.slow(positive(k, "slow").map_err(invalid)?);
    }

    let salt = seed::salt_for(&format!("{}/{}", section, index));
    let transforms = layer
        .transforms
        .iter()
        .enumerate()
        .map(|(i, t)| build_transform(section, index, t, seed::mix(&[salt, i as u64])))
        .collect::<Result<Vec<_>>>()?;

    Ok(pattern.transform_all(&transforms))
}

fn build_transform(
    section: &str,
    layer: usize,
    config: &TransformConfig,
    salt: u64,
) -> Result<Transform> {
    let invalid = |message: &str| CompositionError::InvalidLayer {
        section: section.to_string(),
        layer,
        message: message.to_string(),
    };
    let check_probability = |value: f64| {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(CompositionError::InvalidProbability {
                section: section.to_string(),
                layer,
                value,
            })
        }
    };

    let condition = match (config.every, config.sometimes) {
        (Some(n), None) => Condition::Every(
            NonZeroU32::new(n).ok_or_else(|| invalid("'every' must be at least 1"))?,
        ),
        (None, Some(p)) => Condition::Sometimes(check_probability(p)?),
        _ => return Err(invalid("a transform needs exactly one of 'every' or 'sometimes'")),
    };

    match config.rewrite {
        Rewrite::Degrade(p) => {
            check_probability(p)?;
        }
        Rewrite::Fast(k) | Rewrite::Slow(k) if positive(k, "speed factor").is_err() => {
            return Err(invalid("speed factors must be positive"));
        }
        _ => {}
    }

    Ok(Transform::new(condition, config.rewrite, salt))
}

/// A speed factor that stays positive once converted to cycle time
fn positive(k: f64, name: &str) -> std::result::Result<Fraction, String> {
    let factor = Fraction::from_float(k);
    if k.is_finite() && factor > Fraction::zero() {
        Ok(factor)
    } else {
        Err(format!("'{}' must be a positive number, got {}", name, k))
    }
}

fn apply_params(pattern: Pattern, params: &BTreeMap<String, ParamConfig>) -> Pattern {
    params.iter().fold(pattern, |pattern, (key, param)| {
        let control = match param {
            ParamConfig::Number(n) => Control::from(*n),
            ParamConfig::Text(s) => Control::from(s.as_str()),
            ParamConfig::Modulated(m) => Control::from(m.to_modulator()),
        };
        pattern.set(key, control)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaid_core::Value;

    fn layer_error(layer: &str) -> CompositionError {
        let source = format!(
            "timeline = \"a\"\n[tempo]\nbpm = 120\n[[sections.a.layers]]\n{}\n",
            layer
        );
        Composition::from_toml(&source).unwrap_err()
    }

    #[test]
    fn test_layer_build_order() {
        let source = r#"
            timeline = "a"
            [tempo]
            bpm = 120
            [[sections.a.layers]]
            n = "0 2"
            scale = "C4:major"
            params = { s = "sine" }
            transforms = [{ every = 1, rewrite = { add = 12 } }]
        "#;
        let composition = Composition::from_toml(source).unwrap();
        let events = composition
            .query(Fraction::zero(), Fraction::one())
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].param("note"), Some(&Value::from(72.0)));
        assert_eq!(events[1].param("note"), Some(&Value::from(76.0)));
        assert_eq!(events[0].param("s"), Some(&Value::from("sine")));
        assert_eq!(events[0].param("n"), None);
    }

    #[test]
    fn test_section_params_reach_every_layer() {
        let source = r##"
            timeline = "a"
            [tempo]
            bpm = 120
            [sections.a]
            params = { color = "#FFD700" }
            [[sections.a.layers]]
            s = "bd"
            [[sections.a.layers]]
            s = "hh*2"
        "##;
        let composition = Composition::from_toml(source).unwrap();
        let events = composition
            .query(Fraction::zero(), Fraction::one())
            .unwrap();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| e.param("color") == Some(&Value::from("#FFD700"))));
    }

    #[test]
    fn test_syntax_errors_carry_context() {
        let err = layer_error("s = \"bd [sd\"");
        match err {
            CompositionError::Syntax { section, layer, .. } => {
                assert_eq!(section, "a");
                assert_eq!(layer, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_scale() {
        assert!(matches!(
            layer_error("n = \"0\"\nscale = \"C4:nonsense\""),
            CompositionError::Scale { .. }
        ));
    }

    #[test]
    fn test_invalid_probability() {
        assert!(matches!(
            layer_error("s = \"bd\"\ntransforms = [{ sometimes = 1.5, rewrite = \"rev\" }]"),
            CompositionError::InvalidProbability { value, .. } if value == 1.5
        ));
        assert!(matches!(
            layer_error("s = \"bd\"\ntransforms = [{ every = 2, rewrite = { degrade = -0.1 } }]"),
            CompositionError::InvalidProbability { .. }
        ));
    }

    #[test]
    fn test_invalid_layers() {
        assert!(matches!(
            layer_error("s = \"bd\"\nn = \"0\""),
            CompositionError::InvalidLayer { .. }
        ));
        assert!(matches!(
            layer_error("scale = \"C4:minor\""),
            CompositionError::InvalidLayer { .. }
        ));
        assert!(matches!(
            layer_error("s = \"bd\"\nslow = 0"),
            CompositionError::InvalidLayer { .. }
        ));
        assert!(matches!(
            layer_error("s = \"bd\"\nfast = 1e-7"),
            CompositionError::InvalidLayer { .. }
        ));
        assert!(matches!(
            layer_error("s = \"bd\"\ntransforms = [{ every = 2, rewrite = { slow = 4e-7 } }]"),
            CompositionError::InvalidLayer { .. }
        ));
        assert!(Composition::from_toml(
            "timeline = \"a\"\n[tempo]\nbpm = 120\n[[sections.a.layers]]\ns = \"bd\"\nslow = 1e-6\n"
        )
        .is_ok());
        assert!(matches!(
            layer_error("s = \"bd\"\ntransforms = [{ every = 0, rewrite = \"rev\" }]"),
            CompositionError::InvalidLayer { .. }
        ));
        assert!(matches!(
            layer_error("s = \"bd\"\ntransforms = [{ rewrite = \"rev\" }]"),
            CompositionError::InvalidLayer { .. }
        ));
    }

    #[test]
    fn test_timeline_and_tempo_errors() {
        let unknown = "timeline = \"a b\"\n[tempo]\nbpm = 120\n[[sections.a.layers]]\ns = \"bd\"\n";
        assert!(matches!(
            Composition::from_toml(unknown),
            Err(CompositionError::Config(ConfigError::UnknownSection(_)))
        ));

        let tempo = "timeline = \"a\"\n[tempo]\nbpm = 0\n[[sections.a.layers]]\ns = \"bd\"\n";
        assert!(matches!(
            Composition::from_toml(tempo),
            Err(CompositionError::Config(ConfigError::InvalidTempo(_)))
        ));

        assert!(matches!(
            Composition::from_toml("not toml ["),
            Err(CompositionError::Toml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Composition::load("/nonexistent/piece.toml"),
            Err(CompositionError::Io { .. })
        ));
    }
}
