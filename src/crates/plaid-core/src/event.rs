use crate::{Fraction, Hap, Value, ValueMap};
use serde::{Serialize, Serializer};

/// A renderer-facing event: onset, duration and a resolved parameter map
///
/// Only haps that carry their onset become events; fragments are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(serialize_with = "fraction_as_float")]
    pub onset: Fraction,
    #[serde(serialize_with = "fraction_as_float")]
    pub duration: Fraction,
    pub params: ValueMap,
}

fn fraction_as_float<S: Serializer>(f: &Fraction, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(f.to_float())
}

impl Event {
    /// Build an event from a hap, if it has an onset
    pub fn from_hap(hap: &Hap) -> Option<Event> {
        if !hap.has_onset() {
            return None;
        }
        let whole = hap.whole?;
        Some(Event {
            onset: whole.begin,
            duration: whole.duration(),
            params: hap.value.clone().into_map(),
        })
    }

    /// Shift the onset by an offset
    pub fn shifted(mut self, offset: Fraction) -> Event {
        self.onset = self.onset + offset;
        self
    }

    /// Get a parameter by name
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Convert haps into onset-carrying events, preserving order
pub fn events_from_haps(haps: &[Hap]) -> Vec<Event> {
    haps.iter().filter_map(Event::from_hap).collect()
}
