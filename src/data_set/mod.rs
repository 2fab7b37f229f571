//! External tabular datasets.
//!
//! The mapping core only reads datasets. Where the rows live is the concern
//! of a [`DatasetProvider`]; this crate ships an in-memory provider and one
//! backed by a directory of CSV files.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DataSetResult;

pub mod csv_provider;
pub mod memory;

pub use csv_provider::CsvDatasetProvider;
pub use memory::InMemoryDatasetProvider;

/// One dataset row, column name to cell value, in column order.
pub type DatasetRow = IndexMap<String, Value>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
    /// Filter value matching both private and public datasets.
    All,
}

impl Visibility {
    pub fn admits(&self, other: Visibility) -> bool {
        matches!(self, Visibility::All) || *self == other
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Boolean,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Listing entry for a dataset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    pub row_count: usize,
    pub schema_definition: Vec<ColumnSchema>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub visibility: Visibility,
    pub row_count: usize,
    pub schema: Vec<ColumnSchema>,
}

impl Dataset {
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            row_count: self.row_count,
            schema_definition: self.schema.clone(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.iter().any(|c| c.name == name)
    }
}

#[async_trait]
pub trait DatasetProvider: Send + Sync {
    async fn list_datasets(
        &self,
        project_id: &str,
        visibility: Visibility,
    ) -> DataSetResult<Vec<DatasetSummary>>;

    async fn get_dataset(&self, id: &str) -> DataSetResult<Dataset>;

    async fn get_dataset_data(&self, id: &str) -> DataSetResult<Vec<DatasetRow>>;
}

/// Text form of a cell: strings trimmed, numbers and booleans rendered,
/// null and blank treated as absent.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Builds a row from `(column, value)` pairs, keeping their order.
pub fn row_of<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> DatasetRow {
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

/// Reads `column` from `row` as text.
pub fn cell_text(row: &DatasetRow, column: &str) -> Option<String> {
    row.get(column).and_then(value_to_text)
}

/// Infers a column type from the non-null cells of `column`.
pub fn infer_column_type<'a>(cells: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let mut seen = None;
    for cell in cells {
        let current = match cell {
            Value::Null => continue,
            Value::Number(_) => ColumnType::Number,
            Value::Bool(_) => ColumnType::Boolean,
            _ => return ColumnType::Text,
        };
        match seen {
            None => seen = Some(current),
            Some(previous) if previous != current => return ColumnType::Text,
            Some(_) => {}
        }
    }
    seen.unwrap_or(ColumnType::Text)
}

/// Schema for a set of rows, columns in first-seen order.
pub fn infer_schema(rows: &[DatasetRow]) -> Vec<ColumnSchema> {
    let mut columns: IndexMap<&str, Vec<&Value>> = IndexMap::new();
    for row in rows {
        for (name, value) in row {
            columns.entry(name.as_str()).or_default().push(value);
        }
    }
    columns
        .into_iter()
        .map(|(name, cells)| ColumnSchema::new(name, infer_column_type(cells)))
        .collect()
}
