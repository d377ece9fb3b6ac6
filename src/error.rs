use thiserror::Error;

/// Failures surfaced to the user by the loading, aggregation, charting and
/// sink stages. None of them are retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InsightsError {
    #[error("Error reading file: {0}")]
    Parse(String),
    #[error("Column '{0}' is required but not present in the table")]
    MissingColumn(String),
    #[error("Column '{0}' does not exist in the table")]
    UnknownColumn(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("Division by zero: {0}")]
    DivisionByZero(String),
}

pub type Result<T, E = InsightsError> = std::result::Result<T, E>;
