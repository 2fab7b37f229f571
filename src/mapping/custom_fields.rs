//! Per-actor custom field resolution.
//!
//! Column fields copy a cell of the actor's own row. Dataset fields join a
//! related dataset: its key column may hold several keys per row (a JSON
//! array, or text separated by `,` or `;`), and every key points back at the
//! row. A local key matching one related row yields that row's value; several
//! matches yield an array of values in related-row order.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::model::{CustomField, CustomFieldSource};
use crate::data_set::{cell_text, value_to_text, DatasetProvider, DatasetRow};

/// Outcome of resolving one custom field over all assigned actors.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FieldResolution {
    #[serde(rename_all = "camelCase")]
    Resolved {
        field_id: String,
        matched_actors: usize,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        field_id: String,
        reason: String,
    },
}

impl FieldResolution {
    pub fn field_id(&self) -> &str {
        match self {
            FieldResolution::Resolved { field_id, .. } | FieldResolution::Failed { field_id, .. } => {
                field_id
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FieldResolution::Failed { .. })
    }
}

/// Lookup from decomposed key to the values of every related row carrying it.
#[derive(Debug, Default)]
pub struct JoinIndex {
    entries: HashMap<String, Vec<Value>>,
}

impl JoinIndex {
    pub fn build(rows: &[DatasetRow], key_column: &str, value_column: &str) -> Self {
        let mut entries: HashMap<String, Vec<Value>> = HashMap::new();
        for row in rows {
            // Null values still count as matches.
            let value = row.get(value_column).unwrap_or(&Value::Null);
            let Some(raw_keys) = row.get(key_column) else {
                continue;
            };
            let keys = parse_key_list(raw_keys);
            let mut seen = Vec::with_capacity(keys.len());
            for key in keys {
                if seen.contains(&key) {
                    continue;
                }
                entries.entry(key.clone()).or_default().push(value.clone());
                seen.push(key);
            }
        }
        Self { entries }
    }

    /// `None` without a match or for a single null match, the value itself for
    /// one match, an array for several.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        match self.entries.get(key.trim())?.as_slice() {
            [] | [Value::Null] => None,
            [single] => Some(single.clone()),
            many => Some(Value::Array(many.to_vec())),
        }
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}

/// Splits a key cell into its individual keys.
pub fn parse_key_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                    return items.iter().filter_map(value_to_text).collect();
                }
            }
            trimmed
                .split([',', ';'])
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect()
        }
        other => value_to_text(other).into_iter().collect(),
    }
}

/// A custom field ready to be evaluated against primary rows.
#[derive(Debug)]
pub enum PreparedField<'a> {
    Column {
        field: &'a CustomField,
        column: &'a str,
    },
    Joined {
        field: &'a CustomField,
        local_column: &'a str,
        index: JoinIndex,
    },
}

impl PreparedField<'_> {
    pub fn field(&self) -> &CustomField {
        match self {
            PreparedField::Column { field, .. } | PreparedField::Joined { field, .. } => field,
        }
    }

    pub fn resolve(&self, row: &DatasetRow) -> Option<Value> {
        match self {
            PreparedField::Column { column, .. } => match row.get(*column) {
                Some(Value::Null) | None => None,
                Some(value) => Some(value.clone()),
            },
            PreparedField::Joined {
                local_column,
                index,
                ..
            } => cell_text(row, local_column).and_then(|key| index.lookup(&key)),
        }
    }
}

/// A field that could not be prepared; it stays unset for every actor.
#[derive(Debug, Clone)]
pub struct FieldFailure {
    pub field_id: String,
    pub reason: String,
}

/// Prepares every field, loading each related dataset once. A failure only
/// affects the fields that depend on it.
pub async fn prepare_fields<'a>(
    provider: &dyn DatasetProvider,
    fields: &'a [CustomField],
) -> Vec<Result<PreparedField<'a>, FieldFailure>> {
    let mut loaded: HashMap<&'a str, Result<Vec<DatasetRow>, String>> = HashMap::new();
    let mut prepared = Vec::with_capacity(fields.len());

    for field in fields {
        if let Err(err) = field.validate() {
            warn!("Skipping custom field {}: {}", field.id, err);
            prepared.push(Err(FieldFailure {
                field_id: field.id.clone(),
                reason: err.to_string(),
            }));
            continue;
        }

        let result = match &field.source {
            CustomFieldSource::Column { column_name } => Ok(PreparedField::Column {
                field,
                column: column_name.as_str(),
            }),
            CustomFieldSource::Dataset {
                related_dataset_id,
                key_column_local,
                key_column_related,
                value_column,
            } => {
                if !loaded.contains_key(related_dataset_id.as_str()) {
                    let rows = provider
                        .get_dataset_data(related_dataset_id)
                        .await
                        .map_err(|err| err.to_string());
                    loaded.insert(related_dataset_id.as_str(), rows);
                }

                match &loaded[related_dataset_id.as_str()] {
                    Ok(rows) => {
                        let index = JoinIndex::build(rows, key_column_related, value_column);
                        debug!(
                            "Custom field {} indexed {} keys from {}",
                            field.id,
                            index.key_count(),
                            related_dataset_id
                        );
                        Ok(PreparedField::Joined {
                            field,
                            local_column: key_column_local.as_str(),
                            index,
                        })
                    }
                    Err(reason) => {
                        warn!(
                            "Custom field {} left empty, related dataset {} failed to load: {}",
                            field.id, related_dataset_id, reason
                        );
                        Err(FieldFailure {
                            field_id: field.id.clone(),
                            reason: reason.clone(),
                        })
                    }
                }
            }
        };
        prepared.push(result);
    }

    prepared
}

/// Metadata for one primary row, in field order, skipping unset fields.
pub fn resolve_metadata(
    prepared: &[Result<PreparedField<'_>, FieldFailure>],
    row: &DatasetRow,
) -> IndexMap<String, Value> {
    prepared
        .iter()
        .filter_map(|field| field.as_ref().ok())
        .filter_map(|field| {
            field
                .resolve(row)
                .map(|value| (field.field().id.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_set::{row_of, InMemoryDatasetProvider, Visibility};
    use serde_json::json;

    #[test]
    fn parse_key_list_handles_common_encodings() {
        assert_eq!(parse_key_list(&json!("K1, K2 ;K3")), vec!["K1", "K2", "K3"]);
        assert_eq!(parse_key_list(&json!(["K1", 2])), vec!["K1", "2"]);
        assert_eq!(parse_key_list(&json!("[\"K1\",\"K2\"]")), vec!["K1", "K2"]);
        assert_eq!(parse_key_list(&json!(7)), vec!["7"]);
        assert!(parse_key_list(&json!(" , ")).is_empty());
        assert!(parse_key_list(&json!(null)).is_empty());
    }

    #[test]
    fn join_index_fans_out_multi_key_rows() {
        let rows = vec![row_of([("members", json!("K1,K2")), ("vote", json!("yes"))])];
        let index = JoinIndex::build(&rows, "members", "vote");
        assert_eq!(index.lookup("K1"), Some(json!("yes")));
        assert_eq!(index.lookup("K2"), Some(json!("yes")));
        assert_eq!(index.lookup("K3"), None);
    }

    #[test]
    fn join_index_collects_multiple_matches_in_order() {
        let rows = vec![
            row_of([("members", json!("K1")), ("vote", json!("yes"))]),
            row_of([("members", json!("K2")), ("vote", json!("abstain"))]),
            row_of([("members", json!("K1;K1")), ("vote", json!("no"))]),
        ];
        let index = JoinIndex::build(&rows, "members", "vote");
        assert_eq!(index.lookup("K1"), Some(json!(["yes", "no"])));
        assert_eq!(index.lookup("K2"), Some(json!("abstain")));
    }

    #[test]
    fn join_index_keeps_null_matches_in_lists() {
        let rows = vec![
            row_of([("members", json!("K1,K2")), ("vote", json!(null))]),
            row_of([("members", json!("K1")), ("vote", json!("yes"))]),
        ];
        let index = JoinIndex::build(&rows, "members", "vote");
        assert_eq!(index.lookup("K1"), Some(json!([null, "yes"])));
        assert_eq!(index.lookup("K2"), None);
    }

    #[tokio::test]
    async fn failed_related_dataset_only_affects_its_fields() {
        let provider = InMemoryDatasetProvider::new();
        provider
            .insert(
                "p1",
                "votes",
                "Votes",
                Visibility::Private,
                vec![row_of([("member", json!("Ana")), ("vote", json!("yes"))])],
            )
            .await;
        provider
            .insert("p1", "broken", "Broken", Visibility::Private, vec![])
            .await;
        provider.mark_unavailable("broken").await;

        let fields = vec![
            CustomField::column("party", "Party", "partido"),
            CustomField::joined("vote", "Vote", "votes", "nombre", "member", "vote"),
            CustomField::joined("gone", "Gone", "broken", "nombre", "member", "x"),
        ];
        let prepared = prepare_fields(&provider, &fields).await;
        assert!(prepared[0].is_ok());
        assert!(prepared[1].is_ok());
        assert!(prepared[2].is_err());

        let row = row_of([("nombre", json!("Ana")), ("partido", json!("A"))]);
        let metadata = resolve_metadata(&prepared, &row);
        assert_eq!(metadata.get("party"), Some(&json!("A")));
        assert_eq!(metadata.get("vote"), Some(&json!("yes")));
        assert!(!metadata.contains_key("gone"));
    }

    #[test]
    fn column_field_skips_null_cells() {
        let field = CustomField::column("party", "Party", "partido");
        let prepared = PreparedField::Column {
            field: &field,
            column: "partido",
        };
        assert_eq!(prepared.resolve(&row_of([("partido", json!(null))])), None);
        assert_eq!(prepared.resolve(&row_of([("otro", json!("x"))])), None);
    }
}
