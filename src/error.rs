// src/error.rs
// Error types for the goal tracker

use thiserror::Error;

/// Main error type for the squad-goals library
#[derive(Error, Debug)]
pub enum GoalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("remote API error {status}: {body}")]
    RemoteApi { status: u16, body: String },

    #[error("unexpected table layout: {0}")]
    Schema(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Result using GoalError
pub type Result<T> = std::result::Result<T, GoalError>;

impl GoalError {
    /// True when the failure comes from the storage medium (file, network,
    /// credentials, layout) rather than from what the caller asked for.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            GoalError::Io(_)
                | GoalError::Csv(_)
                | GoalError::Http(_)
                | GoalError::Json(_)
                | GoalError::Auth(_)
                | GoalError::RemoteApi { .. }
                | GoalError::Schema(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for GoalError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        GoalError::Auth(err.to_string())
    }
}
