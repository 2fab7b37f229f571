use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::errors::{MappingError, MappingResult};

/// Row structure of a hemicycle.
///
/// `seats_per_row[0]` is the innermost row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HemicicloLayout {
    pub rows: u32,
    pub seats_per_row: Vec<u32>,
    pub total_seats: u32,
}

impl HemicicloLayout {
    pub fn from_rows(seats_per_row: Vec<u32>) -> MappingResult<Self> {
        let layout = Self {
            rows: seats_per_row.len() as u32,
            total_seats: row_sum(&seats_per_row)?,
            seats_per_row,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> MappingResult<()> {
        if self.rows == 0 || self.seats_per_row.is_empty() {
            return Err(MappingError::InvalidLayout(
                "layout needs at least one row".to_string(),
            ));
        }
        if self.seats_per_row.len() != self.rows as usize {
            return Err(MappingError::InvalidLayout(format!(
                "{} rows declared but {} row sizes given",
                self.rows,
                self.seats_per_row.len()
            )));
        }
        if let Some(row) = self.seats_per_row.iter().position(|&seats| seats == 0) {
            return Err(MappingError::InvalidLayout(format!("row {} has no seats", row)));
        }
        let sum = row_sum(&self.seats_per_row)?;
        if sum != self.total_seats {
            return Err(MappingError::InvalidLayout(format!(
                "total seats {} does not match row sum {}",
                self.total_seats, sum
            )));
        }
        Ok(())
    }

    /// Maps a global seat index to `(row, position_in_row)`.
    pub fn locate(&self, seat_index: u32) -> Option<(u32, u32)> {
        let mut cumulative = 0u64;
        for (row, &seats) in self.seats_per_row.iter().enumerate() {
            if u64::from(seat_index) < cumulative + u64::from(seats) {
                return Some((row as u32, (u64::from(seat_index) - cumulative) as u32));
            }
            cumulative += u64::from(seats);
        }
        None
    }
}

fn row_sum(seats_per_row: &[u32]) -> MappingResult<u32> {
    seats_per_row
        .iter()
        .try_fold(0u32, |total, &seats| total.checked_add(seats))
        .ok_or_else(|| MappingError::InvalidLayout("seat total overflows".to_string()))
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HemicicloCategory {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub color: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_count: Option<u32>,
}

impl HemicicloCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            short_name: None,
            color: color.into(),
            order: 0,
            seat_count: None,
        }
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Label used where space is tight.
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActorData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

impl ActorData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HemicicloSeat {
    pub id: String,
    pub row: u32,
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_data: Option<ActorData>,
}

impl HemicicloSeat {
    pub fn empty(row: u32, position: u32) -> Self {
        Self {
            id: seat_id(row, position),
            row,
            position,
            category_id: None,
            actor_data: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category_id.is_none() && self.actor_data.is_none()
    }
}

pub fn seat_id(row: u32, position: u32) -> String {
    format!("seat-{}-{}", row, position)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct HemicicloData {
    pub categories: Vec<HemicicloCategory>,
    pub seats: Vec<HemicicloSeat>,
}

impl HemicicloData {
    pub fn get_category(&self, id: &str) -> Option<&HemicicloCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn get_seat(&self, id: &str) -> Option<&HemicicloSeat> {
        self.seats.iter().find(|s| s.id == id)
    }

    /// Categories sorted by their `order`, ties kept in storage order.
    pub fn ordered_categories(&self) -> Vec<&HemicicloCategory> {
        let mut categories: Vec<&HemicicloCategory> = self.categories.iter().collect();
        categories.sort_by_key(|c| c.order);
        categories
    }

    pub fn assigned_seat_count(&self) -> usize {
        self.seats.iter().filter(|s| s.category_id.is_some()).count()
    }

    /// Verifies every structural invariant of a snapshot against its layout.
    pub fn check_invariants(&self, layout: &HemicicloLayout) -> MappingResult<()> {
        layout.validate()?;

        if self.seats.len() != layout.total_seats as usize {
            return Err(MappingError::InvalidLayout(format!(
                "{} seats stored for a layout of {}",
                self.seats.len(),
                layout.total_seats
            )));
        }

        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id.as_str()) {
                return Err(MappingError::DuplicateCategory(category.id.clone()));
            }
        }

        let mut positions = HashSet::new();
        let mut seat_ids = HashSet::new();
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for seat in &self.seats {
            let row_size = layout
                .seats_per_row
                .get(seat.row as usize)
                .copied()
                .ok_or_else(|| {
                    MappingError::InvalidLayout(format!("seat {} is outside the layout", seat.id))
                })?;
            if seat.position >= row_size {
                return Err(MappingError::InvalidLayout(format!(
                    "seat {} position {} exceeds row size {}",
                    seat.id, seat.position, row_size
                )));
            }
            if !positions.insert((seat.row, seat.position)) || !seat_ids.insert(seat.id.as_str())
            {
                return Err(MappingError::InvalidLayout(format!(
                    "seat {} is duplicated",
                    seat.id
                )));
            }
            if let Some(category_id) = seat.category_id.as_deref() {
                if !category_ids.contains(category_id) {
                    return Err(MappingError::CategoryNotFound(category_id.to_string()));
                }
                *counts.entry(category_id).or_insert(0) += 1;
            }
        }

        for category in &self.categories {
            let actual = counts.get(category.id.as_str()).copied().unwrap_or(0);
            if category.seat_count != Some(actual) {
                return Err(MappingError::Validation(format!(
                    "category {} caches {:?} seats but holds {}",
                    category.id, category.seat_count, actual
                )));
            }
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    #[default]
    Dataset,
}

/// Column names read from each dataset row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct ColumnMappings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl ColumnMappings {
    pub fn actor(&self) -> Option<&str> {
        non_blank(self.actor.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn photo(&self) -> Option<&str> {
        non_blank(self.photo.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    #[default]
    Text,
    Number,
    Url,
    Image,
    List,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "sourceType")]
pub enum CustomFieldSource {
    /// Value copied straight from a column of the primary row.
    #[serde(rename = "column", rename_all = "camelCase")]
    Column { column_name: String },
    /// Value joined in from another dataset.
    #[serde(rename = "dataset", rename_all = "camelCase")]
    Dataset {
        related_dataset_id: String,
        key_column_local: String,
        key_column_related: String,
        value_column: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub source: CustomFieldSource,
    #[serde(default)]
    pub display_type: DisplayType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl CustomField {
    pub fn column(
        id: impl Into<String>,
        label: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source: CustomFieldSource::Column {
                column_name: column_name.into(),
            },
            display_type: DisplayType::Text,
            icon: None,
            order: None,
        }
    }

    pub fn joined(
        id: impl Into<String>,
        label: impl Into<String>,
        related_dataset_id: impl Into<String>,
        key_column_local: impl Into<String>,
        key_column_related: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source: CustomFieldSource::Dataset {
                related_dataset_id: related_dataset_id.into(),
                key_column_local: key_column_local.into(),
                key_column_related: key_column_related.into(),
                value_column: value_column.into(),
            },
            display_type: DisplayType::Text,
            icon: None,
            order: None,
        }
    }

    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = display_type;
        self
    }

    /// Rejects blank identifiers and column names.
    pub fn validate(&self) -> MappingResult<()> {
        if self.id.trim().is_empty() {
            return Err(MappingError::invalid_custom_field(
                &self.label,
                "field id cannot be empty",
            ));
        }
        let required: Vec<(&str, &str)> = match &self.source {
            CustomFieldSource::Column { column_name } => vec![("columnName", column_name.as_str())],
            CustomFieldSource::Dataset {
                related_dataset_id,
                key_column_local,
                key_column_related,
                value_column,
            } => vec![
                ("relatedDatasetId", related_dataset_id.as_str()),
                ("keyColumnLocal", key_column_local.as_str()),
                ("keyColumnRelated", key_column_related.as_str()),
                ("valueColumn", value_column.as_str()),
            ],
        };
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(MappingError::invalid_custom_field(
                    &self.id,
                    format!("{} is required", name),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HemicicloDataSource {
    #[serde(rename = "type", default)]
    pub source_type: DataSourceType,
    pub dataset_ids: Vec<String>,
    #[serde(default)]
    pub column_mappings: ColumnMappings,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl HemicicloDataSource {
    pub fn new(dataset_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut source = Self::default();
        for id in dataset_ids {
            source.link_dataset(id);
        }
        source
    }

    /// Adds a dataset id, ignoring ids already linked.
    pub fn link_dataset(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.dataset_ids.contains(&id) {
            return false;
        }
        self.dataset_ids.push(id);
        true
    }

    pub fn unlink_dataset(&mut self, id: &str) -> bool {
        let before = self.dataset_ids.len();
        self.dataset_ids.retain(|existing| existing != id);
        before != self.dataset_ids.len()
    }

    pub fn with_actor_column(mut self, column: impl Into<String>) -> Self {
        self.column_mappings.actor = Some(column.into());
        self
    }

    pub fn with_category_column(mut self, column: impl Into<String>) -> Self {
        self.column_mappings.category = Some(column.into());
        self
    }

    pub fn with_photo_column(mut self, column: impl Into<String>) -> Self {
        self.column_mappings.photo = Some(column.into());
        self
    }

    pub fn with_custom_field(mut self, field: CustomField) -> Self {
        self.custom_fields.push(field);
        self
    }

    /// Custom fields in display order; fields without an order go last.
    pub fn ordered_custom_fields(&self) -> Vec<&CustomField> {
        let mut fields: Vec<&CustomField> = self.custom_fields.iter().collect();
        fields.sort_by_key(|f| f.order.unwrap_or(u32::MAX));
        fields
    }
}
