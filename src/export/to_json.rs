use crate::mapping::{positions_for_layout, Mapping};
use std::error::Error;

/// Pretty JSON snapshot of the mapping, with the computed seat positions
/// alongside so consumers do not need the geometry.
pub fn render(mapping: &Mapping) -> Result<String, Box<dyn Error>> {
    use serde_json::json;

    let res = json!({
        "mapping": mapping,
        "positions": positions_for_layout(&mapping.config.layout),
    });
    Ok(serde_json::to_string_pretty(&res)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{initial_data, HemicicloLayout, MappingConfig, MappingType};
    use chrono::Utc;
    use serde_json::Value;

    #[test]
    fn includes_positions_per_seat() {
        let layout = HemicicloLayout::from_rows(vec![3, 5]).unwrap();
        let mapping = Mapping {
            id: "m1".into(),
            project_id: "p1".into(),
            user_id: "u1".into(),
            name: "Senado".into(),
            description: None,
            mapping_type: MappingType::Hemicycle,
            data: initial_data(&layout),
            config: MappingConfig {
                layout,
                data_source: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value: Value = serde_json::from_str(&render(&mapping).unwrap()).unwrap();
        assert_eq!(value["mapping"]["name"], "Senado");
        assert_eq!(value["positions"].as_array().unwrap().len(), 8);
    }
}
