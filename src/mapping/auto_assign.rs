//! Dataset driven seat assignment.
//!
//! Rows of every linked dataset are pooled in dataset order, grouped by the
//! value of the category column (first-seen order), and poured into the seats
//! category by category. Re-running on unchanged inputs produces an identical
//! snapshot.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use super::assignment::recompute_seat_counts;
use super::custom_fields::{prepare_fields, resolve_metadata, FieldResolution};
use super::model::{ActorData, HemicicloCategory, HemicicloData, HemicicloDataSource};
use super::palette::color_for_index;
use crate::data_set::{cell_text, DatasetProvider, DatasetRow};
use crate::errors::MappingResult;

/// Category name for rows whose category cell is blank or missing.
pub const UNCATEGORIZED_LABEL: &str = "Sin categoría";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignOutcome {
    pub data: HemicicloData,
    /// Set when nothing ran because no actor column is mapped.
    pub skipped: bool,
    pub assigned_rows: usize,
    /// Rows without an actor name.
    pub skipped_rows: usize,
    /// Rows left over once every seat was taken.
    pub dropped_rows: usize,
    pub empty_seats: usize,
    pub fields: Vec<FieldResolution>,
}

impl AutoAssignOutcome {
    fn unchanged(data: &HemicicloData) -> Self {
        Self {
            data: data.clone(),
            skipped: true,
            assigned_rows: 0,
            skipped_rows: 0,
            dropped_rows: 0,
            empty_seats: data.seats.iter().filter(|s| s.actor_data.is_none()).count(),
            fields: Vec::new(),
        }
    }
}

pub struct AutoAssigner<'a> {
    provider: &'a dyn DatasetProvider,
}

impl<'a> AutoAssigner<'a> {
    pub fn new(provider: &'a dyn DatasetProvider) -> Self {
        Self { provider }
    }

    /// Rebuilds categories and seat assignments of `data` from the datasets
    /// linked in `source`. A primary dataset that fails to load aborts the
    /// run; related datasets of custom fields only empty their own field.
    pub async fn run(
        &self,
        data: &HemicicloData,
        source: &HemicicloDataSource,
    ) -> MappingResult<AutoAssignOutcome> {
        let Some(actor_column) = source.column_mappings.actor() else {
            info!("No actor column mapped, auto-assign skipped");
            return Ok(AutoAssignOutcome::unchanged(data));
        };

        let rows = self.load_rows(source).await?;
        info!(
            "Auto-assigning {} rows from {} datasets into {} seats",
            rows.len(),
            source.dataset_ids.len(),
            data.seats.len()
        );

        let (categories, partitions) = partition_rows(&rows, source.column_mappings.category());

        let mut next = HemicicloData {
            categories,
            seats: data.seats.clone(),
        };
        for seat in &mut next.seats {
            seat.category_id = None;
            seat.actor_data = None;
        }

        let mut placed: Vec<(usize, &DatasetRow)> = Vec::new();
        let mut skipped_rows = 0;
        let mut dropped_rows = 0;
        for (category_id, row_indices) in &partitions {
            for &row_index in row_indices {
                if placed.len() >= next.seats.len() {
                    dropped_rows += 1;
                    continue;
                }
                let row = &rows[row_index];
                let Some(name) = cell_text(row, actor_column) else {
                    skipped_rows += 1;
                    continue;
                };

                let seat_index = placed.len();
                let seat = &mut next.seats[seat_index];
                seat.category_id = category_id.clone();
                seat.actor_data = Some(ActorData {
                    name,
                    photo: source
                        .column_mappings
                        .photo()
                        .and_then(|column| cell_text(row, column)),
                    metadata: IndexMap::new(),
                });
                placed.push((seat_index, row));
            }
        }
        if dropped_rows > 0 {
            debug!("{} rows did not fit and were dropped", dropped_rows);
        }

        let prepared = prepare_fields(self.provider, &source.custom_fields).await;
        let mut matched = vec![0usize; prepared.len()];
        for &(seat_index, row) in &placed {
            let metadata = resolve_metadata(&prepared, row);
            for (i, field) in prepared.iter().enumerate() {
                if let Ok(field) = field {
                    if metadata.contains_key(&field.field().id) {
                        matched[i] += 1;
                    }
                }
            }
            if let Some(actor) = next.seats[seat_index].actor_data.as_mut() {
                actor.metadata = metadata;
            }
        }
        let fields = prepared
            .iter()
            .zip(matched)
            .map(|(field, matched_actors)| match field {
                Ok(field) => FieldResolution::Resolved {
                    field_id: field.field().id.clone(),
                    matched_actors,
                },
                Err(failure) => FieldResolution::Failed {
                    field_id: failure.field_id.clone(),
                    reason: failure.reason.clone(),
                },
            })
            .collect();

        recompute_seat_counts(&mut next);

        let assigned_rows = placed.len();
        let empty_seats = next.seats.len() - assigned_rows;
        Ok(AutoAssignOutcome {
            data: next,
            skipped: false,
            assigned_rows,
            skipped_rows,
            dropped_rows,
            empty_seats,
            fields,
        })
    }

    async fn load_rows(&self, source: &HemicicloDataSource) -> MappingResult<Vec<DatasetRow>> {
        let mut rows = Vec::new();
        for dataset_id in &source.dataset_ids {
            let dataset_rows = self.provider.get_dataset_data(dataset_id).await?;
            debug!("Dataset {} contributed {} rows", dataset_id, dataset_rows.len());
            rows.extend(dataset_rows);
        }
        Ok(rows)
    }
}

/// Generated categories plus the row indices of each, both in first-seen
/// order. Without a category column there is a single uncategorised group.
fn partition_rows(
    rows: &[DatasetRow],
    category_column: Option<&str>,
) -> (Vec<HemicicloCategory>, Vec<(Option<String>, Vec<usize>)>) {
    let Some(column) = category_column else {
        return (Vec::new(), vec![(None, (0..rows.len()).collect())]);
    };

    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (index, row) in rows.iter().enumerate() {
        let label = cell_text(row, column).unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string());
        groups.entry(label).or_default().push(index);
    }

    let mut categories = Vec::with_capacity(groups.len());
    let mut partitions = Vec::with_capacity(groups.len());
    for (position, (label, indices)) in groups.into_iter().enumerate() {
        let id = format!("cat-{}", position + 1);
        categories.push(
            HemicicloCategory::new(id.clone(), label, color_for_index(position))
                .with_order(position as u32 + 1),
        );
        partitions.push((Some(id), indices));
    }
    (categories, partitions)
}
