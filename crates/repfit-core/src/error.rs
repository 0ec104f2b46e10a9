//! Error types for repfit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("Unknown landmark: {0}")]
    UnknownLandmark(String),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
