use thiserror::Error;

/// Errors raised while building an arrangement or a tempo
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("timeline references unknown section '{0}'")]
    UnknownSection(String),

    #[error("section '{0}' is defined twice")]
    DuplicateSection(String),

    #[error("timeline entry '{0}' must have a positive weight")]
    NonPositiveWeight(String),

    #[error("malformed timeline entry '{0}'")]
    MalformedEntry(String),

    #[error("timeline is empty")]
    EmptyTimeline,

    #[error("invalid tempo: {0}")]
    InvalidTempo(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
