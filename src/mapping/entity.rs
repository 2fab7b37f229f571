use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{HemicicloData, HemicicloDataSource, HemicicloLayout};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MappingType {
    #[default]
    #[serde(rename = "hemiciclo")]
    Hemicycle,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    pub layout: HemicicloLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<HemicicloDataSource>,
}

/// A persisted visualisation: configuration plus the current seat snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    pub config: MappingConfig,
    pub data: HemicicloData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewMapping {
    pub project_id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub mapping_type: MappingType,
    pub config: MappingConfig,
    pub data: HemicicloData,
}

/// Fields replaced by an update; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct MappingPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub config: Option<MappingConfig>,
    pub data: Option<HemicicloData>,
}

impl MappingPatch {
    /// Full replacement of everything a user can edit.
    pub fn snapshot(mapping: &Mapping) -> Self {
        Self {
            name: Some(mapping.name.clone()),
            description: Some(mapping.description.clone()),
            config: Some(mapping.config.clone()),
            data: Some(mapping.data.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.config.is_none()
            && self.data.is_none()
    }

    /// An empty patch leaves the mapping, `updated_at` included, as it was.
    pub fn apply_to(self, mapping: &mut Mapping) {
        if self.is_empty() {
            return;
        }
        if let Some(name) = self.name {
            mapping.name = name;
        }
        if let Some(description) = self.description {
            mapping.description = description;
        }
        if let Some(config) = self.config {
            mapping.config = config;
        }
        if let Some(data) = self.data {
            mapping.data = data;
        }
        mapping.updated_at = Utc::now();
    }
}

#[derive(Clone, Debug, Default)]
pub struct MappingFilter {
    pub project_id: Option<String>,
    pub mapping_type: Option<MappingType>,
}

impl MappingFilter {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            mapping_type: None,
        }
    }

    pub fn matches(&self, mapping: &Mapping) -> bool {
        self.project_id
            .as_deref()
            .map_or(true, |project| mapping.project_id == project)
            && self
                .mapping_type
                .map_or(true, |mapping_type| mapping.mapping_type == mapping_type)
    }
}
