use std::path::PathBuf;
use thiserror::Error;

/// Malformed time-of-day or duration text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid time of day '{input}', expected HH:MM:SS or HH:MM:SS.mmm")]
    InvalidTimeOfDay { input: String },

    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: &'static str },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config field '{field}': {source}")]
    Format {
        field: &'static str,
        #[source]
        source: FormatError,
    },

    #[error("config field '{field}' must be positive")]
    NotPositive { field: &'static str },
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read events file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RaceError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, RaceError>;
