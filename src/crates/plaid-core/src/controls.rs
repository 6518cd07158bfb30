//! Control parameters attached to pattern events
//!
//! Values become control maps (`{s: "bd", gain: 0.7, ...}`). A control is
//! either a constant or a modulator sampled at each event's onset.

use crate::{Modulator, Pattern, Value};

/// A parameter value attached with [`Pattern::set`]
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Value(Value),
    Modulated(Modulator),
}

impl Control {
    /// Resolve the control for an event starting at `onset`
    pub fn resolve(&self, onset: crate::Fraction) -> Value {
        match self {
            Control::Value(value) => value.clone(),
            Control::Modulated(modulator) => Value::Number(modulator.sample(onset)),
        }
    }
}

impl From<f64> for Control {
    fn from(n: f64) -> Self {
        Control::Value(Value::Number(n))
    }
}

impl From<&str> for Control {
    fn from(s: &str) -> Self {
        Control::Value(Value::from(s))
    }
}

impl From<String> for Control {
    fn from(s: String) -> Self {
        Control::Value(Value::String(s))
    }
}

impl From<Value> for Control {
    fn from(value: Value) -> Self {
        Control::Value(value)
    }
}

impl From<Modulator> for Control {
    fn from(modulator: Modulator) -> Self {
        Control::Modulated(modulator)
    }
}

/// Wrap every value of `pattern` in a control map under `key`
///
/// Values that already are maps keep their other controls.
pub fn as_control(pattern: Pattern, key: &'static str) -> Pattern {
    pattern.with_value(move |value| match value {
        Value::Map(map) => {
            let mut map = map.clone();
            if let Some(v) = map.remove("value") {
                map.insert(key.to_string(), v);
            }
            Value::Map(map)
        }
        scalar => {
            let mut map = crate::ValueMap::new();
            map.insert(key.to_string(), scalar.clone());
            Value::Map(map)
        }
    })
}

/// Sound (instrument or sample) names
pub fn s(pattern: Pattern) -> Pattern {
    as_control(pattern, "s")
}

/// Sample index or scale degree
pub fn n(pattern: Pattern) -> Pattern {
    as_control(pattern, "n")
}

/// Pitch as a MIDI note number
pub fn note(pattern: Pattern) -> Pattern {
    as_control(pattern, "note")
}

impl Pattern {
    /// Set a control on every event
    ///
    /// Scalar values are kept under `value`.
    pub fn set(self, key: &str, control: impl Into<Control>) -> Pattern {
        let key = key.to_string();
        let control = control.into();
        self.with_hap(move |hap| {
            let resolved = control.resolve(hap.onset());
            hap.with_value(|value| value.clone().with_control(&key, resolved, "value"))
        })
    }

    pub fn sound(self, name: impl Into<Control>) -> Pattern {
        self.set("s", name)
    }

    pub fn gain(self, amount: impl Into<Control>) -> Pattern {
        self.set("gain", amount)
    }

    pub fn room(self, amount: impl Into<Control>) -> Pattern {
        self.set("room", amount)
    }

    /// Low-pass filter cutoff in Hz
    pub fn lpf(self, cutoff: impl Into<Control>) -> Pattern {
        self.set("lpf", cutoff)
    }

    /// High-pass filter cutoff in Hz
    pub fn hpf(self, cutoff: impl Into<Control>) -> Pattern {
        self.set("hpf", cutoff)
    }

    pub fn bank(self, name: impl Into<Control>) -> Pattern {
        self.set("bank", name)
    }

    pub fn delay(self, amount: impl Into<Control>) -> Pattern {
        self.set("delay", amount)
    }

    pub fn delaytime(self, time: impl Into<Control>) -> Pattern {
        self.set("delaytime", time)
    }

    /// Display color for visual feedback
    pub fn color(self, color: impl Into<Control>) -> Pattern {
        self.set("color", color)
    }
}
