// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use serde_json::{json, Value};
use tabledash_model::{Row, TableRegistry};
use tabledash_query::{translate, QueryCatalog, QueryOp};

fn catalog() -> QueryCatalog {
    QueryCatalog::from_registry(&TableRegistry::builtin(), None).expect("catalog")
}

fn ops_for(value: &str) -> Vec<(&'static str, QueryOp)> {
    let mut person = Row::new();
    person.insert("name", Value::String(value.to_string()));
    person.insert("location", Value::String(value.to_string()));
    let mut dag = Row::new();
    dag.insert("bundle_name", Value::String(value.to_string()));
    vec![
        ("persons", QueryOp::Insert(person.clone())),
        (
            "persons",
            QueryOp::UpdateByIdentity {
                identity: Value::String(value.to_string()),
                payload: person,
            },
        ),
        (
            "critical_dags",
            QueryOp::UpdateByIdentity {
                identity: json!("old"),
                payload: dag,
            },
        ),
        (
            "critical_dags",
            QueryOp::DeleteByIdentity(Value::String(value.to_string())),
        ),
    ]
}

#[test]
fn classic_injection_payload_stays_in_parameters() {
    let hostile = "'; DROP TABLE x; --";
    for (table, op) in ops_for(hostile) {
        let q = translate(&catalog(), table, &op).expect("translate");
        assert!(!q.sql.contains("DROP"), "query text leaked input: {}", q.sql);
        assert!(
            q.params.iter().any(|p| p.value == json!(hostile)),
            "value must be bound: {:?}",
            q.params
        );
    }
}

proptest! {
    #[test]
    fn query_text_does_not_depend_on_user_values(value in "[ -~]{1,40}") {
        let templates: Vec<String> = ops_for("sentinel")
            .into_iter()
            .map(|(table, op)| translate(&catalog(), table, &op).expect("template").sql)
            .collect();
        for ((table, op), template) in ops_for(&value).into_iter().zip(&templates) {
            let q = translate(&catalog(), table, &op).expect("translate");
            prop_assert_eq!(&q.sql, template);
        }
    }
}
