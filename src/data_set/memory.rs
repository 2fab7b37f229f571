use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

use super::{infer_schema, Dataset, DatasetProvider, DatasetRow, DatasetSummary, Visibility};
use crate::errors::{DataSetError, DataSetResult};

struct StoredDataset {
    dataset: Dataset,
    rows: Vec<DatasetRow>,
}

/// Datasets held in memory, in insertion order.
#[derive(Default)]
pub struct InMemoryDatasetProvider {
    datasets: RwLock<IndexMap<String, StoredDataset>>,
    unavailable: RwLock<HashSet<String>>,
}

impl InMemoryDatasetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `rows` under `id`, replacing any dataset with the same id.
    pub async fn insert(
        &self,
        project_id: &str,
        id: &str,
        name: &str,
        visibility: Visibility,
        rows: Vec<DatasetRow>,
    ) -> Dataset {
        let dataset = Dataset {
            id: id.to_string(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            visibility,
            row_count: rows.len(),
            schema: infer_schema(&rows),
        };
        debug!("Storing dataset {} with {} rows", id, rows.len());
        self.datasets.write().await.insert(
            id.to_string(),
            StoredDataset {
                dataset: dataset.clone(),
                rows,
            },
        );
        dataset
    }

    /// Makes every later load of `id` fail, as a broken backend would.
    pub async fn mark_unavailable(&self, id: &str) {
        self.unavailable.write().await.insert(id.to_string());
    }

    async fn check_available(&self, id: &str) -> DataSetResult<()> {
        if self.unavailable.read().await.contains(id) {
            return Err(DataSetError::load_failed(id, "service unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl DatasetProvider for InMemoryDatasetProvider {
    async fn list_datasets(
        &self,
        project_id: &str,
        visibility: Visibility,
    ) -> DataSetResult<Vec<DatasetSummary>> {
        Ok(self
            .datasets
            .read()
            .await
            .values()
            .filter(|stored| stored.dataset.project_id == project_id)
            .filter(|stored| visibility.admits(stored.dataset.visibility))
            .map(|stored| stored.dataset.summary())
            .collect())
    }

    async fn get_dataset(&self, id: &str) -> DataSetResult<Dataset> {
        self.check_available(id).await?;
        self.datasets
            .read()
            .await
            .get(id)
            .map(|stored| stored.dataset.clone())
            .ok_or_else(|| DataSetError::NotFound(id.to_string()))
    }

    async fn get_dataset_data(&self, id: &str) -> DataSetResult<Vec<DatasetRow>> {
        self.check_available(id).await?;
        self.datasets
            .read()
            .await
            .get(id)
            .map(|stored| stored.rows.clone())
            .ok_or_else(|| DataSetError::NotFound(id.to_string()))
    }
}
