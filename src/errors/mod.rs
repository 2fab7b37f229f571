//! Domain-specific error types for the mapping core
//!
//! # Error Categories
//!
//! - **MappingError**: layout, seat and category operations, auto-assignment
//! - **DataSetError**: external dataset listing and loading
//! - **CoreError**: service boundary error with a coarse kind, used by the
//!   persistence layer and anything presenting messages to a user
//!
//! # Examples
//!
//! ```rust
//! use pulse::errors::{CoreError, CoreErrorKind, MappingError};
//!
//! fn find_seat(id: &str) -> Result<(), MappingError> {
//!     Err(MappingError::SeatNotFound(id.to_string()))
//! }
//!
//! let err: CoreError = find_seat("seat-0-0").unwrap_err().into();
//! assert_eq!(err.kind(), CoreErrorKind::NotFound);
//! ```

pub mod core_error;
pub mod data_set;
pub mod mapping;

pub use core_error::{CoreError, CoreErrorKind};
pub use data_set::DataSetError;
pub use mapping::MappingError;

/// Result type alias for mapping engine operations
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type alias for data set operations
pub type DataSetResult<T> = Result<T, DataSetError>;

/// Result type alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;
