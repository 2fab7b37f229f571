use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use super::{DataSetError, MappingError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Forbidden,
    Unavailable,
    Internal,
}

/// Error surfaced by the service layer to whatever presents it to the user.
#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity.into());
        fields.insert("id".to_string(), id.into());

        Self {
            kind: CoreErrorKind::NotFound,
            message: "Resource not found".to_string(),
            fields: Some(fields),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Forbidden, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        let mut core = CoreError::internal("Unhandled error");
        core.source = Some(err.into());
        core
    }
}

impl From<DataSetError> for CoreError {
    fn from(err: DataSetError) -> Self {
        let kind = match &err {
            DataSetError::NotFound(_) => CoreErrorKind::NotFound,
            DataSetError::InvalidCsv(_) => CoreErrorKind::Validation,
            DataSetError::LoadFailed { .. } => CoreErrorKind::Unavailable,
            DataSetError::Io(_) | DataSetError::Csv(_) | DataSetError::Json(_) => {
                CoreErrorKind::Internal
            }
        };
        CoreError::new(kind, err.to_string()).with_source(err)
    }
}

impl From<MappingError> for CoreError {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::DataSet(inner) => inner.into(),
            other => {
                let kind = match &other {
                    MappingError::SeatNotFound(_) | MappingError::CategoryNotFound(_) => {
                        CoreErrorKind::NotFound
                    }
                    MappingError::DuplicateCategory(_) => CoreErrorKind::Conflict,
                    _ => CoreErrorKind::Validation,
                };
                CoreError::new(kind, other.to_string()).with_source(other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_entity_fields() {
        let err = CoreError::not_found("Mapping", "abc");
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        let fields = err.fields().unwrap();
        assert_eq!(fields.get("entity").map(String::as_str), Some("Mapping"));
        assert_eq!(fields.get("id").map(String::as_str), Some("abc"));
    }

    #[test]
    fn mapping_errors_map_to_kinds() {
        let err: CoreError = MappingError::DuplicateCategory("cat-1".into()).into();
        assert_eq!(err.kind(), CoreErrorKind::Conflict);

        let err: CoreError = MappingError::Validation("empty name".into()).into();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
        assert!(err.source().is_some());

        let err: CoreError =
            MappingError::DataSet(DataSetError::load_failed("ds", "timeout")).into();
        assert_eq!(err.kind(), CoreErrorKind::Unavailable);
    }

    #[test]
    fn display_includes_kind() {
        let err = CoreError::forbidden("not your mapping");
        assert_eq!(err.to_string(), "Forbidden: not your mapping");
    }
}
