use crate::span::Span;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Mini-notation errors, each carrying the offending fragment and its span
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found '{found}' at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("unclosed '{delimiter}' opened at {open_span}")]
    UnclosedDelimiter { delimiter: char, open_span: Span },

    #[error("invalid number '{value}' at {span}")]
    InvalidNumber { value: String, span: Span },

    #[error("invalid argument '{value}' for '{op}' at {span}: {reason}")]
    InvalidFactor {
        op: char,
        value: String,
        reason: &'static str,
        span: Span,
    },

    #[error("unrecognized input '{fragment}' at {span}")]
    InvalidToken { fragment: String, span: Span },
}

impl ParseError {
    pub fn unexpected_token(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
        }
    }

    pub fn unclosed_delimiter(delimiter: char, open_span: Span) -> Self {
        ParseError::UnclosedDelimiter {
            delimiter,
            open_span,
        }
    }

    pub fn invalid_number(value: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidNumber {
            value: value.into(),
            span,
        }
    }

    pub fn invalid_factor(
        op: char,
        value: impl Into<String>,
        reason: &'static str,
        span: Span,
    ) -> Self {
        ParseError::InvalidFactor {
            op,
            value: value.into(),
            reason,
            span,
        }
    }

    pub fn invalid_token(fragment: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidToken {
            fragment: fragment.into(),
            span,
        }
    }

    /// Where in the source the error happened, if known
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::InvalidFactor { span, .. }
            | ParseError::InvalidToken { span, .. } => Some(*span),
            ParseError::UnclosedDelimiter { open_span, .. } => Some(*open_span),
            ParseError::UnexpectedEof { .. } => None,
        }
    }
}
