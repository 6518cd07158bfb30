//! Section timeline, tempo clock and pull scheduler
//!
//! This crate turns a table of named section patterns and a weighted
//! timeline into one continuous event stream:
//! - [`TimelineSpec`] parses `<intro@4 verse@4 chorus@8>`
//! - [`Arrangement`] resolves global cycles to sections and local phase
//! - [`Clock`] maps transport time to cycles under a [`Tempo`]
//! - [`Scheduler`] hands out successive windows and supports hot swaps

pub mod arrangement;
pub mod clock;
pub mod error;
pub mod scheduler;
pub mod timeline;

pub use arrangement::{Arrangement, ArrangementBuilder, Resolved, SectionId, TimelineEntry};
pub use clock::{Clock, Tempo};
pub use error::{ConfigError, Result};
pub use scheduler::{ArrangementHandle, Scheduler};
pub use timeline::{EntrySpec, TimelineSpec};

/// Re-export common types from plaid-core
pub use plaid_core::{Event, Fraction, Pattern, RangeError};
