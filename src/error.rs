//! Error types for lab-slotter.
//!
//! Infeasible or timed-out models are not errors: they are reported as
//! [`ScheduleOutcome::Failed`](crate::slotter::ScheduleOutcome::Failed).

use thiserror::Error;

/// Result type for lab-slotter operations.
pub type Result<T> = std::result::Result<T, SlotterError>;

/// Errors that can occur while ingesting input or driving a model.
#[derive(Error, Debug)]
pub enum SlotterError {
    /// Malformed roster table (empty file, missing id column, bad cells).
    #[error("Input format error in {source_name}: {message}")]
    InputFormat {
        /// File name or other label of the offending input.
        source_name: String,
        /// Description of the problem.
        message: String,
    },

    /// Configuration values violate an invariant.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O error (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation was called out of order on a model.
    #[error("Invalid model state: {0}")]
    InvalidState(String),

    /// The solver backend failed for a reason other than infeasibility.
    #[error("Solver backend error: {0}")]
    Backend(String),
}

impl SlotterError {
    pub(crate) fn input_format(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputFormat {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
