use async_trait::async_trait;
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{infer_schema, ColumnSchema, Dataset, DatasetProvider, DatasetRow, DatasetSummary, Visibility};
use crate::errors::{DataSetError, DataSetResult};

/// Serves every `<id>.csv` file of a directory as a dataset of one project.
///
/// The first line is the header. Cells keep their text exactly as written and
/// blank cells become null, so keys like `007` survive joins. Column types in
/// the schema are still detected from the text.
pub struct CsvDatasetProvider {
    root: PathBuf,
    project_id: String,
    visibility: Visibility,
}

impl CsvDatasetProvider {
    pub fn new(root: impl Into<PathBuf>, project_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            project_id: project_id.into(),
            visibility: Visibility::Private,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    fn path_for(&self, id: &str) -> DataSetResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(DataSetError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{}.csv", id)))
    }

    async fn read_rows(&self, id: &str) -> DataSetResult<Vec<DatasetRow>> {
        let path = self.path_for(id)?;
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataSetError::NotFound(id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let rows = parse_csv(&content)?;
        debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    fn dataset_from_rows(&self, id: &str, rows: &[DatasetRow]) -> Dataset {
        Dataset {
            id: id.to_string(),
            project_id: self.project_id.clone(),
            name: id.to_string(),
            visibility: self.visibility,
            row_count: rows.len(),
            schema: infer_csv_schema(rows),
        }
    }
}

/// Parses CSV bytes into text rows keyed by header.
pub fn parse_csv(content: &[u8]) -> DataSetResult<Vec<DatasetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(DataSetError::InvalidCsv("Missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: DatasetRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), parse_cell(record.get(i).unwrap_or(""))))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

fn infer_csv_schema(rows: &[DatasetRow]) -> Vec<ColumnSchema> {
    let typed: Vec<DatasetRow> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(name, value)| (name.clone(), typed_cell(value)))
                .collect()
        })
        .collect();
    infer_schema(&typed)
}

/// Reads a text cell as the JSON value it looks like. Only used for the schema.
fn typed_cell(value: &Value) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };
    match raw.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    value.clone()
}

fn dataset_id_of(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

#[async_trait]
impl DatasetProvider for CsvDatasetProvider {
    async fn list_datasets(
        &self,
        project_id: &str,
        visibility: Visibility,
    ) -> DataSetResult<Vec<DatasetSummary>> {
        if project_id != self.project_id || !visibility.admits(self.visibility) {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = dataset_id_of(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort();

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read_rows(&id).await {
                Ok(rows) => summaries.push(self.dataset_from_rows(&id, &rows).summary()),
                Err(err) => warn!("Skipping unreadable dataset {}: {}", id, err),
            }
        }
        Ok(summaries)
    }

    async fn get_dataset(&self, id: &str) -> DataSetResult<Dataset> {
        let rows = self.read_rows(id).await?;
        Ok(self.dataset_from_rows(id, &rows))
    }

    async fn get_dataset_data(&self, id: &str) -> DataSetResult<Vec<DatasetRow>> {
        self.read_rows(id).await
    }
}
