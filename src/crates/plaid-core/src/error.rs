use crate::Fraction;
use thiserror::Error;

/// Errors raised while querying a pattern
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("query span is reversed: begin {begin} is after end {end}")]
    ReversedSpan { begin: Fraction, end: Fraction },

    #[error("euclid hits ({hits}) exceed steps ({steps})")]
    EuclidHitsExceedSteps { hits: i64, steps: i64 },

    #[error("euclid steps ({steps}) exceed the limit of {max}")]
    EuclidTooManySteps { steps: i64, max: i64 },
}

pub type Result<T> = std::result::Result<T, RangeError>;
