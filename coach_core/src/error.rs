//! Error types for the coach_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for coach_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend rejected the presented credential
    #[error("Not authorized to access this workout")]
    Unauthorized,

    /// The requested workout does not exist
    #[error("Workout not found: {0}")]
    NotFound(String),

    /// The backend could not be reached or returned garbage
    #[error("Network error: {0}")]
    Network(String),

    /// Workout definition cannot be played
    #[error("Invalid workout: {0}")]
    InvalidWorkout(String),

    /// The day mixes a mobility block with regular blocks and no choice was made
    #[error("Workout contains both mobility and regular blocks; choose mobility, workout or both")]
    ChoiceRequired,

    /// Generic error
    #[error("{0}")]
    Other(String),
}
