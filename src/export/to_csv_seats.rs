use crate::data_set::value_to_text;
use crate::mapping::{HemicicloData, HemicicloDataSource};
use csv::Writer;
use serde_json::Value;
use std::error::Error;

/// One line per seat. Custom field values are written in field order, lists
/// joined with `; `.
pub fn render(
    data: &HemicicloData,
    source: Option<&HemicicloDataSource>,
) -> Result<String, Box<dyn Error>> {
    let mut wtr = Writer::from_writer(vec![]);

    let field_ids: Vec<&str> = source
        .map(|s| {
            s.ordered_custom_fields()
                .into_iter()
                .map(|f| f.id.as_str())
                .collect()
        })
        .unwrap_or_default();

    let mut header = vec![
        "seat_id", "row", "position", "category", "actor", "photo",
    ];
    header.extend(field_ids.iter().copied());
    wtr.write_record(&header)?;

    for seat in &data.seats {
        let category = seat
            .category_id
            .as_deref()
            .and_then(|id| data.get_category(id))
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let actor = seat.actor_data.as_ref();

        let mut record = vec![
            seat.id.clone(),
            seat.row.to_string(),
            seat.position.to_string(),
            category,
            actor.map(|a| a.name.clone()).unwrap_or_default(),
            actor.and_then(|a| a.photo.clone()).unwrap_or_default(),
        ];
        for id in &field_ids {
            record.push(
                actor
                    .and_then(|a| a.metadata.get(*id))
                    .map(cell)
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner()?;
    let csv_string = String::from_utf8(data)?;

    Ok(csv_string)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => value_to_text(other).unwrap_or_default(),
    }
}
