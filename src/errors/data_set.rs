//! Data set error types
//!
//! Errors raised while listing, describing or loading the rows of an external
//! dataset.
//!
//! # Examples
//!
//! ```rust
//! use pulse::errors::DataSetError;
//!
//! let err = DataSetError::NotFound("diputados".to_string());
//! assert!(err.is_not_found());
//!
//! let err = DataSetError::InvalidCsv("Missing header row".to_string());
//! assert_eq!(err.error_code(), "VALIDATION_FAILED");
//! ```

use thiserror::Error;

/// Data set operation errors
#[derive(Error, Debug)]
pub enum DataSetError {
    /// Data set not found by ID
    #[error("Data set {0} not found")]
    NotFound(String),

    /// The backing service could not deliver the rows
    #[error("Failed to load data set {id}: {reason}")]
    LoadFailed { id: String, reason: String },

    /// Invalid CSV format or parsing error
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataSetError {
    pub fn load_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        DataSetError::LoadFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataSetError::NotFound(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            DataSetError::NotFound(_) => "NOT_FOUND",
            DataSetError::InvalidCsv(_) => "VALIDATION_FAILED",
            DataSetError::LoadFailed { .. } => "OPERATION_FAILED",
            DataSetError::Io(_) => "IO_ERROR",
            DataSetError::Csv(_) => "CSV_ERROR",
            DataSetError::Json(_) => "JSON_ERROR",
        }
    }
}
