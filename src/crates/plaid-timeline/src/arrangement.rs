//! Sections stitched into one cyclic timeline
//!
//! An [`Arrangement`] owns a table of named section patterns and an ordered
//! list of timeline entries. Every query re-derives the active entry from the
//! global cycle, so there is no playback state to drift.

use crate::{ConfigError, Result, TimelineSpec};
use plaid_core::{Event, Fraction, Pattern, RangeError, TimeSpan};
use std::collections::HashSet;
use tracing::{debug, info};

/// Index of a section in its arrangement, checked when the arrangement is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

impl SectionId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Section {
    name: String,
    pattern: Pattern,
}

/// A resolved timeline entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry {
    pub section: SectionId,
    pub weight: Fraction,
}

/// Where a global cycle falls on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub section: SectionId,
    pub name: &'a str,
    /// Position of the entry in the timeline
    pub entry: usize,
    /// How many times the timeline has looped before this entry
    pub iteration: i64,
    /// Global cycle at which this entry began
    pub entry_start: Fraction,
    /// Cycles since the entry began
    pub phase: Fraction,
}

/// Sections plus the timeline that plays them
#[derive(Debug, Clone)]
pub struct Arrangement {
    sections: Vec<Section>,
    entries: Vec<TimelineEntry>,
    /// Start of each entry within one pass of the timeline
    offsets: Vec<Fraction>,
    total: Fraction,
    looping: bool,
    seed: u64,
}

impl Arrangement {
    pub fn builder() -> ArrangementBuilder {
        ArrangementBuilder::default()
    }

    /// Find which entry is playing at `global` and how far into it we are
    ///
    /// Looping timelines resolve every cycle, negative ones included.
    /// Finite timelines return `None` outside `[0, total)`.
    pub fn resolve(&self, global: Fraction) -> Option<Resolved<'_>> {
        if !self.looping && (global.is_negative() || global >= self.total) {
            return None;
        }

        let iteration = (global / self.total).cycle();
        let pass_start = self.total * Fraction::from_int(iteration);
        let pos = global - pass_start;

        let entry = self.offsets.partition_point(|offset| *offset <= pos) - 1;
        let entry_start = pass_start + self.offsets[entry];
        let section = self.entries[entry].section;

        Some(Resolved {
            section,
            name: &self.sections[section.0].name,
            entry,
            iteration,
            entry_start,
            phase: global - entry_start,
        })
    }

    /// Events with onsets in `[begin, end)`, in global time and onset order
    ///
    /// Each entry plays its section from local cycle 0, so a section always
    /// restarts at its own beginning.
    pub fn query(&self, begin: Fraction, end: Fraction) -> plaid_core::Result<Vec<Event>> {
        if begin > end {
            return Err(RangeError::ReversedSpan { begin, end });
        }

        let (mut cursor, end) = if self.looping {
            (begin, end)
        } else {
            (begin.max(Fraction::zero()), end.min(self.total))
        };

        let mut events = Vec::new();
        while cursor < end {
            let Some(resolved) = self.resolve(cursor) else {
                break;
            };
            let entry_end = resolved.entry_start + self.entries[resolved.entry].weight;
            let window_end = entry_end.min(end);

            let local = TimeSpan::new(
                cursor - resolved.entry_start,
                window_end - resolved.entry_start,
            );
            debug!(
                section = resolved.name,
                entry = resolved.entry,
                local = %local,
                "querying section"
            );

            let pattern = &self.sections[resolved.section.0].pattern;
            let haps = pattern.query_seeded(local, self.seed)?;
            events.extend(
                haps.iter()
                    .filter_map(Event::from_hap)
                    .map(|event| event.shifted(resolved.entry_start)),
            );

            cursor = window_end;
        }

        events.sort_by(|a, b| a.onset.cmp(&b.onset));
        Ok(events)
    }

    pub fn section_id(&self, name: &str) -> Option<SectionId> {
        self.sections
            .iter()
            .position(|s| s.name == name)
            .map(SectionId)
    }

    pub fn section_name(&self, id: SectionId) -> &str {
        &self.sections[id.0].name
    }

    pub fn section_pattern(&self, id: SectionId) -> &Pattern {
        &self.sections[id.0].pattern
    }

    /// Section names in definition order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Length of one pass of the timeline, in cycles
    pub fn total_cycles(&self) -> Fraction {
        self.total
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The same arrangement under another seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Builder for [`Arrangement`]
#[derive(Debug, Default)]
pub struct ArrangementBuilder {
    sections: Vec<Section>,
    timeline: Option<TimelineSpec>,
    seed: u64,
    finite: bool,
}

impl ArrangementBuilder {
    pub fn section(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        self.sections.push(Section {
            name: name.into(),
            pattern,
        });
        self
    }

    pub fn timeline(mut self, timeline: TimelineSpec) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Play the timeline once instead of looping it
    pub fn finite(mut self, finite: bool) -> Self {
        self.finite = finite;
        self
    }

    pub fn build(self) -> Result<Arrangement> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.name.as_str()) {
                return Err(ConfigError::DuplicateSection(section.name.clone()));
            }
        }

        let timeline = self.timeline.unwrap_or_default();
        if timeline.entries.is_empty() {
            return Err(ConfigError::EmptyTimeline);
        }

        let mut entries = Vec::with_capacity(timeline.entries.len());
        let mut offsets = Vec::with_capacity(timeline.entries.len());
        let mut total = Fraction::zero();
        for spec in &timeline.entries {
            let index = self
                .sections
                .iter()
                .position(|s| s.name == spec.section)
                .ok_or_else(|| ConfigError::UnknownSection(spec.section.clone()))?;
            if spec.weight <= Fraction::zero() {
                return Err(ConfigError::NonPositiveWeight(format!(
                    "{}@{}",
                    spec.section, spec.weight
                )));
            }

            entries.push(TimelineEntry {
                section: SectionId(index),
                weight: spec.weight,
            });
            offsets.push(total);
            total = total + spec.weight;
        }

        info!(
            sections = self.sections.len(),
            entries = entries.len(),
            cycles = %total,
            seed = self.seed,
            "built arrangement"
        );

        Ok(Arrangement {
            sections: self.sections,
            entries,
            offsets,
            total,
            looping: !self.finite,
            seed: self.seed,
        })
    }
}
