// SPDX-License-Identifier: Apache-2.0

use crate::row::{Row, RESERVED_ROW_KEY};
use crate::TableConfig;
use serde_json::Value;
use std::collections::BTreeMap;

/// Identity value of `row` under `config`.
///
/// `None` when the identity column is missing or null; such a row can be shown
/// but not edited or deleted.
#[must_use]
pub fn identify<'a>(row: &'a Row, config: &TableConfig) -> Option<&'a Value> {
    match row.get(config.id_field()) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v),
    }
}

/// Canonical text of an identity value, used for URL segments, search and
/// equality (`5` and `"5"` address the same row).
#[must_use]
pub fn identity_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[must_use]
pub fn same_identity(row: &Row, config: &TableConfig, identifier: &Value) -> bool {
    identify(row, config).is_some_and(|id| identity_key(id) == identity_key(identifier))
}

/// Prepends `id = "row-<index>"` to every row that lacks `natural_key`.
///
/// Rows that carry the natural key are left untouched, so the synthetic key
/// only exists where nothing else can keep rendering stable.
pub fn assign_synthetic_ids(rows: Vec<Row>, natural_key: &str) -> Vec<Row> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let has_natural = row
                .get(natural_key)
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
            if has_natural {
                return row;
            }
            let mut out = Row::new();
            out.insert(RESERVED_ROW_KEY, Value::String(format!("row-{index}")));
            for (k, v) in row.into_map() {
                if k != RESERVED_ROW_KEY {
                    out.insert(k, v);
                }
            }
            out
        })
        .collect()
}

/// Identity keys that occur more than once, sorted.
#[must_use]
pub fn duplicate_identities(rows: &[Row], config: &TableConfig) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for id in rows.iter().filter_map(|r| identify(r, config)) {
        *counts.entry(identity_key(id)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, _)| k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableRegistry;
    use serde_json::json;

    fn row(v: Value) -> Row {
        serde_json::from_value(v).expect("row")
    }

    #[test]
    fn identify_reads_configured_id_field() {
        let registry = TableRegistry::builtin();
        let r = row(json!({"name": "Alice", "age": 30}));
        assert_eq!(identify(&r, registry.lookup("persons")), Some(&json!("Alice")));
    }

    #[test]
    fn identify_missing_or_null_is_none() {
        let registry = TableRegistry::builtin();
        let cfg = registry.lookup("critical_dags");
        assert_eq!(identify(&row(json!({"other": 1})), cfg), None);
        assert_eq!(identify(&row(json!({"bundle_name": null})), cfg), None);
    }

    #[test]
    fn synthetic_ids_only_fill_rows_without_natural_key() {
        let rows = vec![
            row(json!({"bundle_name": "a"})),
            row(json!({"owner": "x"})),
        ];
        let out = assign_synthetic_ids(rows, "bundle_name");
        assert!(!out[0].contains(RESERVED_ROW_KEY));
        assert_eq!(out[1].get(RESERVED_ROW_KEY), Some(&json!("row-1")));
        assert_eq!(out[1].columns().next(), Some(RESERVED_ROW_KEY));
    }

    #[test]
    fn numeric_and_string_identities_compare_by_key() {
        let cfg = TableConfig {
            id_field: Some("n".to_string()),
            fields: Vec::new(),
        };
        assert!(same_identity(&row(json!({"n": 5})), &cfg, &json!("5")));
        assert!(!same_identity(&row(json!({"n": 6})), &cfg, &json!("5")));
    }

    #[test]
    fn duplicates_are_reported() {
        let registry = TableRegistry::builtin();
        let cfg = registry.lookup("critical_dags");
        let rows = vec![
            row(json!({"bundle_name": "a"})),
            row(json!({"bundle_name": "b"})),
            row(json!({"bundle_name": "a"})),
        ];
        assert_eq!(duplicate_identities(&rows, cfg), vec!["a".to_string()]);
    }
}
