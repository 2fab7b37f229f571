//! Mapping error types
//!
//! Errors produced by the hemicycle engines: layout generation, seat and
//! category assignment, and dataset driven auto-assignment.
//!
//! # Examples
//!
//! ```rust
//! use pulse::errors::MappingError;
//!
//! let err = MappingError::SeatNotFound("seat-9-9".to_string());
//! assert!(err.is_client_error());
//! assert_eq!(err.error_code(), "NOT_FOUND");
//! ```

use thiserror::Error;

use super::DataSetError;

/// Mapping engine errors
#[derive(Error, Debug)]
pub enum MappingError {
    /// Seat not found by ID
    #[error("Seat {0} not found")]
    SeatNotFound(String),

    /// Category not found by ID
    #[error("Category {0} not found")]
    CategoryNotFound(String),

    /// A category with the same ID already exists
    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),

    /// Layout does not satisfy its row/seat invariants
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Custom field definition is incomplete
    #[error("Invalid custom field {field}: {reason}")]
    InvalidCustomField { field: String, reason: String },

    /// Input rejected before any state change
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Primary dataset could not be loaded
    #[error(transparent)]
    DataSet(#[from] DataSetError),
}

impl MappingError {
    pub fn invalid_custom_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError::InvalidCustomField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        !matches!(self, MappingError::DataSet(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            MappingError::SeatNotFound(_) | MappingError::CategoryNotFound(_) => "NOT_FOUND",
            MappingError::DuplicateCategory(_) => "CONFLICT",
            MappingError::InvalidLayout(_)
            | MappingError::InvalidCustomField { .. }
            | MappingError::Validation(_) => "VALIDATION_FAILED",
            MappingError::DataSet(err) => err.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes() {
        assert_eq!(
            MappingError::SeatNotFound("s".into()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            MappingError::CategoryNotFound("c".into()).error_code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_duplicate_category_message() {
        let err = MappingError::DuplicateCategory("cat-1".into());
        assert_eq!(err.to_string(), "Category 'cat-1' already exists");
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_data_set_error_passes_through() {
        let err: MappingError = DataSetError::NotFound("ds".into()).into();
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Data set ds not found");
    }
}
