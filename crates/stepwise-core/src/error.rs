//! Error types for the goal progression engine.

use std::{path::PathBuf, time::Duration};

use jiff::civil::Date;
use thiserror::Error;

/// Comprehensive error type for all engine operations.
#[derive(Error, Debug)]
pub enum ProgressError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Goal not found for the given ID
    #[error("Goal with ID {id} not found")]
    GoalNotFound { id: u64 },
    /// Step not found for the given ID
    #[error("Step with ID {id} not found")]
    StepNotFound { id: u64 },
    /// Substep not found for the given ID
    #[error("Substep with ID {id} not found")]
    SubstepNotFound { id: u64 },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// The goal starts after its due date
    #[error("Start date {start} is after due date {due}; pick a due date on or after the start date")]
    InvalidDateRange { start: Date, due: Date },
    /// No occurrence of the selected weekdays falls inside the date range
    #[error(
        "No occurrences found for selected days [{days}] between {start} and {due}; \
         widen the date range or choose other days"
    )]
    NoOccurrencesFound {
        days: String,
        start: Date,
        due: String,
    },
    /// The calendar walk did not terminate within its safety bound
    #[error("Schedule computation exceeded {iterations} days without terminating")]
    ScheduleOverflow { iterations: u32 },
    /// A generation status change that the state machine does not allow
    #[error("Cannot move generation status from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },
    /// Generation failed for the occurrence that gates all later occurrences
    #[error("Step generation failed for occurrence {index}: {message}")]
    Generation { index: usize, message: String },
    /// The whole-run watchdog fired
    #[error("Step generation timed out after {limit:?}")]
    GlobalTimeout { limit: Duration },
    /// Calendar arithmetic fell outside jiff's supported range
    #[error("Date arithmetic error: {source}")]
    Calendar {
        #[from]
        source: jiff::Error,
    },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> ProgressError {
        ProgressError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> ProgressError {
        ProgressError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl ProgressError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps a join failure from a blocking database task.
    pub(crate) fn join(err: tokio::task::JoinError) -> Self {
        Self::Configuration {
            message: format!("Task join error: {err}"),
        }
    }

    /// Whether the error was raised by validation before any state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateRange { .. }
                | Self::NoOccurrencesFound { .. }
                | Self::ScheduleOverflow { .. }
                | Self::InvalidInput { .. }
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| ProgressError::database(message).with_source(e))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ProgressError>;
