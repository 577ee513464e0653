//! Error types for the prodsuite ecosystem.

use thiserror::Error;

/// Errors that can occur in prodsuite operations.
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid {0} ID")]
    InvalidId(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    /// Feature names that are not part of the permission model.
    #[error("Invalid features")]
    InvalidFeatures(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database migration failed: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SuiteError {
    pub fn validation(message: impl Into<String>) -> Self {
        SuiteError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SuiteError::NotFound(_))
    }
}

/// Result type alias for prodsuite operations.
pub type SuiteResult<T> = Result<T, SuiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_entity() {
        let err = SuiteError::NotFound("Note");
        assert_eq!(err.to_string(), "Note not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_id_message() {
        assert_eq!(SuiteError::InvalidId("folder").to_string(), "Invalid folder ID");
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = SuiteError::validation("Title is required");
        assert_eq!(err.to_string(), "Title is required");
        assert!(!err.is_not_found());
    }
}
