//! Error types for tiling, colocation and batch runs.

use chrono::{DateTime, Utc};
use colocate_types::window::TimeWindow;
use thiserror::Error;

/// Result type alias using ColocateError.
pub type Result<T> = std::result::Result<T, ColocateError>;

#[derive(Debug, Error)]
pub enum ColocateError {
    // === Configuration errors ===
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid tiling step: {0}")]
    InvalidStep(String),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Per-window errors ===
    #[error("Data unavailable from '{source_id}' for window {window}")]
    DataUnavailable {
        source_id: String,
        window: TimeWindow,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationErrorWithContext(String),
}

impl ColocateError {
    /// Whether a batch run can skip the affected window and carry on.
    ///
    /// Range, step, variable and configuration errors need the caller to fix
    /// its inputs and are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ColocateError::DataUnavailable { .. }
                | ColocateError::Io(_)
                | ColocateError::Csv(_)
                | ColocateError::InvalidInput(_)
                | ColocateError::SerializationErrorWithContext(_)
        )
    }
}
