// Central Error Type for the Ledger

use thiserror::Error;

/// Application-level error type
///
/// Store failures arrive here already rendered to text: the infra crate owns
/// the driver error types and folds any rollback outcome into the message.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller supplied an empty required key. Never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AppError::InvalidArgument(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::Storage(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Reject an empty identifier before any store round trip
pub fn require_key(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::InvalidArgument(format!("{} must not be empty", field)));
    }
    Ok(())
}
