//! Filter expressions and their resolution against a backend's record set.
//!
//! Every backend resolves filters the same way: load (and, for the remote
//! store, decode) the full record set, then hand it to [`resolve`]. The
//! filter language itself is backend-agnostic.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_json_path::JsonPath;

use crate::error::{StoreError, StoreResult};
use crate::types::StoreEntry;

/// A tagged filter expression selecting a subset of one backend's records.
///
/// Wire shape: `{"kind": "...", "parameter": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "parameter", rename_all = "camelCase")]
pub enum Filter {
    /// Match every record.
    #[default]
    None,
    /// Match the single record whose id equals the parameter; a missing id
    /// yields an empty result, never an error.
    ById(String),
    /// Match records whose credential `type` field contains the parameter:
    /// element equality when `type` is an array, substring match when it is
    /// a plain string.
    ByType(String),
    /// Evaluate a JSONPath expression over the full `[{metadata, data}]`
    /// array. The expression alone determines the result shape, so callers
    /// must treat the output as best-effort and re-validate before use.
    ByPath(String),
}

/// Resolves `filter` against a backend's full decoded record set.
///
/// # Errors
///
/// Only `ByPath` can fail, with [`StoreError::InvalidFilter`] when the
/// expression does not parse; the failure is scoped to the backend that was
/// evaluating it.
pub fn resolve(filter: &Filter, entries: Vec<StoreEntry>) -> StoreResult<Vec<StoreEntry>> {
    match filter {
        Filter::None => Ok(entries),
        Filter::ById(id) => Ok(entries.into_iter().filter(|e| &e.id == id).collect()),
        Filter::ByType(wanted) => Ok(entries
            .into_iter()
            .filter(|e| type_matches(&e.data, wanted))
            .collect()),
        Filter::ByPath(expression) => by_path(expression, &entries),
    }
}

fn type_matches(data: &Value, wanted: &str) -> bool {
    match data.get("type") {
        Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(wanted)),
        Some(Value::String(single)) => single.contains(wanted),
        _ => false,
    }
}

/// Shape of one element of the array a `ByPath` expression runs over.
#[derive(Deserialize)]
struct PathEntry {
    metadata: PathMetadata,
    data: Value,
}

#[derive(Deserialize)]
struct PathMetadata {
    id: String,
}

fn by_path(expression: &str, entries: &[StoreEntry]) -> StoreResult<Vec<StoreEntry>> {
    let path = JsonPath::parse(expression).map_err(|err| StoreError::InvalidFilter {
        expression: expression.to_string(),
        reason: err.to_string(),
    })?;

    let haystack = Value::Array(
        entries
            .iter()
            .map(|entry| json!({ "metadata": { "id": entry.id }, "data": entry.data }))
            .collect(),
    );

    // Selected nodes that are not entry-shaped (the expression may project
    // arbitrary sub-values) come back with an empty id.
    Ok(path
        .query(&haystack)
        .all()
        .into_iter()
        .map(|node| {
            serde_json::from_value::<PathEntry>(node.clone()).map_or_else(
                |_| StoreEntry {
                    id: String::new(),
                    data: node.clone(),
                },
                |entry| StoreEntry {
                    id: entry.metadata.id,
                    data: entry.data,
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn entries() -> Vec<StoreEntry> {
        vec![
            StoreEntry {
                id: "vc-1".to_string(),
                data: json!({ "type": ["VerifiableCredential", "DriverLicense"] }),
            },
            StoreEntry {
                id: "vc-2".to_string(),
                data: json!({ "type": ["DriverLicense"] }),
            },
            StoreEntry {
                id: "vc-3".to_string(),
                data: json!({ "type": ["Passport"] }),
            },
        ]
    }

    #[test]
    fn filter_serde_shape_is_kind_and_parameter() {
        let filter: Filter =
            serde_json::from_value(json!({ "kind": "byId", "parameter": "vc-1" })).unwrap();
        assert_eq!(filter, Filter::ById("vc-1".to_string()));

        let none: Filter = serde_json::from_value(json!({ "kind": "none" })).unwrap();
        assert_eq!(none, Filter::None);

        assert_eq!(
            serde_json::to_value(Filter::ByPath("$[*].data".to_string())).unwrap(),
            json!({ "kind": "byPath", "parameter": "$[*].data" })
        );
    }

    #[test]
    fn none_returns_the_full_record_set() {
        let resolved = resolve(&Filter::None, entries()).unwrap();
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn by_id_returns_the_single_match_or_nothing() {
        let hit = resolve(&Filter::ById("vc-2".to_string()), entries()).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].id, "vc-2");

        let miss = resolve(&Filter::ById("vc-9".to_string()), entries()).unwrap();
        assert!(miss.is_empty());
    }

    #[test_case("DriverLicense", &["vc-1", "vc-2"]; "shared element")]
    #[test_case("Passport", &["vc-3"]; "single element")]
    #[test_case("Diploma", &[]; "absent element")]
    fn by_type_matches_array_elements(wanted: &str, expected: &[&str]) {
        let resolved = resolve(&Filter::ByType(wanted.to_string()), entries()).unwrap();
        let ids: Vec<&str> = resolved.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn by_type_substring_matches_plain_string_types() {
        let entries = vec![StoreEntry {
            id: "vc-s".to_string(),
            data: json!({ "type": "VerifiableCredential" }),
        }];
        let hit = resolve(&Filter::ByType("Credential".to_string()), entries.clone()).unwrap();
        assert_eq!(hit.len(), 1);
        let miss = resolve(&Filter::ByType("Passport".to_string()), entries).unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn by_type_ignores_records_without_a_type_field() {
        let entries = vec![StoreEntry {
            id: "vc-n".to_string(),
            data: json!({ "issuer": "did:example:123" }),
        }];
        let resolved = resolve(&Filter::ByType("Passport".to_string()), entries).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn by_path_selects_whole_entries() {
        let filter = Filter::ByPath(
            "$[?(@.data.type[0] == 'VerifiableCredential')]".to_string(),
        );
        let resolved = resolve(&filter, entries()).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "vc-1");
    }

    #[test]
    fn by_path_projections_come_back_with_an_empty_id() {
        let filter = Filter::ByPath("$[*].data.type".to_string());
        let resolved = resolve(&filter, entries()).unwrap();
        assert_eq!(resolved.len(), 3);
        assert!(resolved.iter().all(|e| e.id.is_empty()));
        assert_eq!(resolved[0].data, json!(["VerifiableCredential", "DriverLicense"]));
    }

    #[test]
    fn by_path_rejects_a_malformed_expression() {
        let err = resolve(&Filter::ByPath("$[".to_string()), entries()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter { .. }));
    }
}
