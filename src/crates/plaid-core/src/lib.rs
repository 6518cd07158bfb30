//! Core types for the plaid pattern engine
//!
//! This crate provides exact cycle time, the closure-based [`Pattern`] type
//! with its combinators, and the layers built on top of it: modulators,
//! conditional transforms, control maps and scales.
//!
//! # Examples
//!
//! ```
//! use plaid_core::{pure, sequence, Fraction, Value};
//!
//! let pattern = sequence(vec![
//!     pure(Value::from("bd")),
//!     pure(Value::from("sd")),
//! ]);
//! let haps = pattern.query_span(Fraction::zero(), Fraction::one()).unwrap();
//! assert_eq!(haps.len(), 2);
//! ```
//!
//! # Main Components
//!
//! - **Pattern**: a pure function from a query [`State`] to [`Hap`]s
//! - **Value**: numbers, strings and control maps carried by events
//! - **Event**: the renderer-facing form of an onset-carrying hap
//! - **Modulator**: periodic waveforms sampled at event onsets
//! - **Transform**: `every`/`sometimes` rewrites decided per cycle

pub mod combinators;
pub mod controls;
pub mod error;
pub mod euclid;
pub mod event;
pub mod fraction;
pub mod hap;
pub mod modulator;
pub mod pattern;
pub mod scale;
pub mod seed;
pub mod state;
pub mod timespan;
pub mod transform;
pub mod value;

pub use combinators::{
    bool_sequence, choose, choose_weighted, compress, fastcat, pure, sequence, silence, slowcat,
    stack, timecat,
};
pub use controls::Control;
pub use error::{RangeError, Result};
pub use euclid::bjorklund;
pub use event::{events_from_haps, Event};
pub use fraction::Fraction;
pub use hap::Hap;
pub use modulator::{Modulator, Waveform};
pub use pattern::Pattern;
pub use scale::{Scale, ScaleError};
pub use state::State;
pub use timespan::TimeSpan;
pub use transform::{Condition, Rewrite, Transform};
pub use value::{Value, ValueMap};
