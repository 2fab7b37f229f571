use regex::Regex;

use crate::errors::{MappingError, MappingResult};
use crate::mapping::{HemicicloCategory, HemicicloDataSource};

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_SEATS: u32 = 1000;

const COLOR_PATTERN: &str = r"^(#[0-9a-fA-F]{3}|#[0-9a-fA-F]{6}|rgba?\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*(,\s*(0|1|0?\.\d+)\s*)?\))$";

/// Service for input validation ahead of any state change
pub struct ValidationService;

impl ValidationService {
    /// Validate and trim a mapping name
    pub fn validate_mapping_name(name: &str) -> MappingResult<String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(MappingError::Validation(
                "Mapping name cannot be empty".to_string(),
            ));
        }

        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(MappingError::Validation(format!(
                "Mapping name is too long (max {} characters)",
                MAX_NAME_LENGTH
            )));
        }

        Ok(trimmed.to_string())
    }

    /// Validate mapping description; blank descriptions become `None`
    pub fn validate_description(description: Option<&str>) -> MappingResult<Option<String>> {
        let Some(trimmed) = description.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(None);
        };

        if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(MappingError::Validation(format!(
                "Mapping description is too long (max {} characters)",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        Ok(Some(trimmed.to_string()))
    }

    /// Validate a requested seat count
    pub fn validate_seat_count(seats: u32) -> MappingResult<u32> {
        if seats < 1 {
            return Err(MappingError::Validation(
                "Seat count must be at least 1".to_string(),
            ));
        }
        if seats > MAX_SEATS {
            return Err(MappingError::Validation(format!(
                "Seat count is too large (max {})",
                MAX_SEATS
            )));
        }
        Ok(seats)
    }

    /// Validate a colour value (`#rgb`, `#rrggbb`, `rgb()` or `rgba()`)
    pub fn validate_color(color: &str) -> MappingResult<String> {
        let trimmed = color.trim();
        let regex = Regex::new(COLOR_PATTERN).map_err(|e| {
            MappingError::Validation(format!("Failed to compile colour regex: {}", e))
        })?;
        if !regex.is_match(trimmed) {
            return Err(MappingError::Validation(format!(
                "Invalid colour: {}",
                color
            )));
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_category(category: &HemicicloCategory) -> MappingResult<()> {
        if category.name.trim().is_empty() {
            return Err(MappingError::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }
        Self::validate_color(&category.color)?;
        Ok(())
    }

    /// Validate a data source binding: custom field ids unique, definitions complete
    pub fn validate_data_source(source: &HemicicloDataSource) -> MappingResult<()> {
        let mut ids = std::collections::HashSet::new();
        for field in &source.custom_fields {
            field.validate()?;
            if !ids.insert(field.id.as_str()) {
                return Err(MappingError::invalid_custom_field(
                    &field.id,
                    "field id is used twice",
                ));
            }
        }
        if source.dataset_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(MappingError::Validation(
                "Dataset id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
