//! Timeline strings: `<intro@4 verse@4 chorus@8>`

use crate::{ConfigError, Result};
use plaid_core::Fraction;
use std::fmt;
use std::str::FromStr;

/// One `name@weight` entry, not yet resolved against a section table
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySpec {
    pub section: String,
    /// Length in cycles
    pub weight: Fraction,
}

/// A parsed but unresolved timeline
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineSpec {
    pub entries: Vec<EntrySpec>,
}

impl TimelineSpec {
    /// Parse whitespace-separated `name[@weight]` entries
    ///
    /// The list may be wrapped in `< >`. Weights default to 1 and may be
    /// whole, decimal or rational (`4`, `1.5`, `3/2`).
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let body = match (trimmed.strip_prefix('<'), trimmed.ends_with('>')) {
            (Some(rest), true) => &rest[..rest.len() - 1],
            (None, false) => trimmed,
            _ => return Err(ConfigError::MalformedEntry(trimmed.to_string())),
        };

        let entries = body
            .split_whitespace()
            .map(parse_entry)
            .collect::<Result<Vec<_>>>()?;

        if entries.is_empty() {
            return Err(ConfigError::EmptyTimeline);
        }
        Ok(TimelineSpec { entries })
    }

    pub fn push(&mut self, section: impl Into<String>, weight: impl Into<Fraction>) {
        self.entries.push(EntrySpec {
            section: section.into(),
            weight: weight.into(),
        });
    }

    /// Sum of all weights, in cycles
    pub fn total(&self) -> Fraction {
        self.entries
            .iter()
            .fold(Fraction::zero(), |acc, e| acc + e.weight)
    }
}

fn parse_entry(token: &str) -> Result<EntrySpec> {
    let (name, weight) = match token.split_once('@') {
        Some((name, weight)) => {
            let weight = weight
                .parse::<Fraction>()
                .map_err(|_| ConfigError::MalformedEntry(token.to_string()))?;
            (name, weight)
        }
        None => (token, Fraction::one()),
    };

    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if !valid_name {
        return Err(ConfigError::MalformedEntry(token.to_string()));
    }
    if weight <= Fraction::zero() {
        return Err(ConfigError::NonPositiveWeight(token.to_string()));
    }

    Ok(EntrySpec {
        section: name.to_string(),
        weight,
    })
}

impl FromStr for TimelineSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        TimelineSpec::parse(s)
    }
}

impl fmt::Display for TimelineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}@{}", entry.section, entry.weight)?;
        }
        f.write_str(">")
    }
}
