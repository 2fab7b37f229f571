use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::mapping::{CustomField, DisplayType, HemicicloDataSource};

/// ## Structure
/// YAML plan driving one auto-assign run from the command line.
///
/// ```text
/// MappingPlan
///   ├── meta: PlanMeta (optional)
///   ├── project_id, user_id
///   ├── data_dir: directory of <dataset id>.csv files
///   ├── store_dir: directory of <mapping id>.json files
///   ├── mapping: MappingSettings
///   │   ├── id (optional, reuse an existing mapping)
///   │   ├── name, description
///   │   └── seats
///   ├── data_source: HemicicloDataSource
///   └── output: OutputSettings (optional)
///       ├── filename
///       └── format: svg | json | csv
/// ```

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PlanMeta {
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MappingPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PlanMeta>,
    pub project_id: String,
    pub user_id: String,
    pub data_dir: String,
    pub store_dir: String,
    pub mapping: MappingSettings,
    pub data_source: HemicicloDataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSettings>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MappingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub seats: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub filename: String,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Svg,
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        };
        write!(f, "{}", name)
    }
}

impl Default for MappingPlan {
    /// Sample plan written by `init`.
    fn default() -> Self {
        Self {
            meta: Some(PlanMeta {
                name: Some("Congreso".to_string()),
            }),
            project_id: "default".to_string(),
            user_id: "local".to_string(),
            data_dir: "data".to_string(),
            store_dir: "mappings".to_string(),
            mapping: MappingSettings {
                id: None,
                name: "Congreso de los Diputados".to_string(),
                description: None,
                seats: 350,
            },
            data_source: HemicicloDataSource::new(["deputies"])
                .with_actor_column("name")
                .with_category_column("party")
                .with_photo_column("photo")
                .with_custom_field(CustomField::column("region", "Region", "region"))
                .with_custom_field(
                    CustomField::joined(
                        "committees",
                        "Committees",
                        "committees",
                        "name",
                        "members",
                        "committee",
                    )
                    .with_display_type(DisplayType::List),
                ),
            output: Some(OutputSettings {
                filename: "congreso.svg".to_string(),
                format: ExportFormat::Svg,
            }),
        }
    }
}

impl MappingPlan {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse plan {}", path.display()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Paths in a plan are relative to the plan file.
pub fn resolve_relative(plan_path: impl AsRef<Path>, relative: &str) -> PathBuf {
    match plan_path.as_ref().parent() {
        Some(parent) => parent.join(relative),
        None => PathBuf::from(relative),
    }
}
