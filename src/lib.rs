//! Plaid: sectioned pattern compositions
//!
//! A composition file names sections built from mini-notation layers and a
//! weighted timeline that plays them. [`Composition`] ties the pieces
//! together and answers "which events start between cycle a and b".
//!
//! ```
//! use plaid::{Composition, Fraction};
//!
//! let composition = Composition::bundled().unwrap();
//! let events = composition
//!     .query(Fraction::zero(), Fraction::one())
//!     .unwrap();
//! assert!(!events.is_empty());
//! ```

pub mod composition;
pub mod config;

pub use composition::{Composition, CompositionError};
pub use config::CompositionConfig;

pub use plaid_core::{Event, Fraction, Pattern, Value};
pub use plaid_timeline::{Arrangement, Resolved, Scheduler, Tempo};
