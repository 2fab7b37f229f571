use std::sync::Arc;

use tracing::{debug, error, info};

use super::mapping_store::MappingStore;
use super::validation::ValidationService;
use crate::data_set::{DatasetProvider, DatasetSummary, Visibility};
use crate::errors::{CoreError, CoreResult};
use crate::mapping::{
    initial_data, regenerate_layout, AutoAssignOutcome, AutoAssigner, HemicicloDataSource,
    HemicicloLayout, Mapping, MappingConfig, MappingFilter, MappingPatch, MappingType, NewMapping,
};

/// Input for creating a fresh hemicycle.
#[derive(Clone, Debug)]
pub struct CreateHemicycle {
    pub project_id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub seats: u32,
}

/// Coordinates the mapping store with the dataset provider. All writes send a
/// full snapshot of the edited mapping.
#[derive(Clone)]
pub struct MappingService {
    store: Arc<dyn MappingStore>,
    datasets: Arc<dyn DatasetProvider>,
}

impl MappingService {
    pub fn new(store: Arc<dyn MappingStore>, datasets: Arc<dyn DatasetProvider>) -> Self {
        Self { store, datasets }
    }

    pub async fn list(&self, filter: &MappingFilter) -> CoreResult<Vec<Mapping>> {
        self.store.list(filter).await
    }

    pub async fn get(&self, id: &str) -> CoreResult<Mapping> {
        self.store.get_by_id(id).await
    }

    /// Datasets of the project that can be linked to a mapping.
    pub async fn available_datasets(&self, project_id: &str) -> CoreResult<Vec<DatasetSummary>> {
        Ok(self
            .datasets
            .list_datasets(project_id, Visibility::All)
            .await?)
    }

    pub async fn create_hemicycle(&self, input: CreateHemicycle) -> CoreResult<Mapping> {
        let name = ValidationService::validate_mapping_name(&input.name)?;
        let description = ValidationService::validate_description(input.description.as_deref())?;
        let seats = ValidationService::validate_seat_count(input.seats)?;

        let layout = HemicicloLayout::for_seat_count(seats)?;
        let data = initial_data(&layout);

        let mapping = self
            .store
            .create(NewMapping {
                project_id: input.project_id,
                user_id: input.user_id,
                name,
                description,
                mapping_type: MappingType::Hemicycle,
                config: MappingConfig {
                    layout,
                    data_source: None,
                },
                data,
            })
            .await?;

        info!(
            "Created hemicycle {} with {} seats in {} rows",
            mapping.id, mapping.config.layout.total_seats, mapping.config.layout.rows
        );
        Ok(mapping)
    }

    /// Persists the whole mapping. On failure the caller keeps its local copy;
    /// nothing is rolled back.
    pub async fn save(&self, mapping: &Mapping) -> CoreResult<Mapping> {
        ValidationService::validate_mapping_name(&mapping.name)?;
        mapping.config.layout.validate()?;
        mapping.data.check_invariants(&mapping.config.layout)?;
        for category in &mapping.data.categories {
            ValidationService::validate_category(category)?;
        }
        if let Some(source) = &mapping.config.data_source {
            ValidationService::validate_data_source(source)?;
        }

        match self
            .store
            .update(&mapping.id, MappingPatch::snapshot(mapping))
            .await
        {
            Ok(saved) => {
                debug!("Saved mapping {}", saved.id);
                Ok(saved)
            }
            Err(err) => {
                error!("Failed to save mapping {}: {}", mapping.id, err);
                Err(err)
            }
        }
    }

    /// Binds a data source; seat assignments are left untouched until the
    /// next auto-assign.
    pub async fn set_data_source(
        &self,
        mapping_id: &str,
        source: Option<HemicicloDataSource>,
    ) -> CoreResult<Mapping> {
        let mut mapping = self.store.get_by_id(mapping_id).await?;
        if let Some(source) = &source {
            ValidationService::validate_data_source(source)?;
        }
        mapping.config.data_source = source;
        self.save(&mapping).await
    }

    /// Replaces the layout with a default one for `seats`, keeping the
    /// assignments of seats present in both layouts.
    pub async fn resize(&self, mapping_id: &str, seats: u32) -> CoreResult<Mapping> {
        let seats = ValidationService::validate_seat_count(seats)?;
        let mut mapping = self.store.get_by_id(mapping_id).await?;

        let layout = HemicicloLayout::for_seat_count(seats)?;
        mapping.data = regenerate_layout(&mapping.data, &layout)?;
        mapping.config.layout = layout;

        info!(
            "Resized mapping {} to {} seats",
            mapping.id, mapping.config.layout.total_seats
        );
        self.save(&mapping).await
    }

    /// Runs auto-assign against the stored mapping and persists the result.
    /// A skipped run leaves the stored mapping as it was.
    pub async fn auto_assign(&self, mapping_id: &str) -> CoreResult<(Mapping, AutoAssignOutcome)> {
        let mapping = self.store.get_by_id(mapping_id).await?;
        let Some(source) = mapping.config.data_source.clone() else {
            return Err(CoreError::validation(format!(
                "Mapping {} has no data source",
                mapping.id
            )));
        };

        let outcome = AutoAssigner::new(self.datasets.as_ref())
            .run(&mapping.data, &source)
            .await?;
        if outcome.skipped {
            return Ok((mapping, outcome));
        }

        let mut next = mapping;
        next.data = outcome.data.clone();
        let saved = self.save(&next).await?;
        info!(
            "Auto-assigned mapping {}: {} seats filled, {} empty",
            saved.id, outcome.assigned_rows, outcome.empty_seats
        );
        Ok((saved, outcome))
    }

    pub async fn delete(&self, mapping_id: &str, user_id: &str) -> CoreResult<()> {
        self.store.delete(mapping_id, user_id).await?;
        info!("Deleted mapping {}", mapping_id);
        Ok(())
    }
}
