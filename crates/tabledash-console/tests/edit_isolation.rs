// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use serde_json::{json, Value};
use tabledash_console::{render_table, transition, Cell, EditEvent, EditState};
use tabledash_model::{Row, TableRegistry};

fn dataset(names: &[String]) -> Vec<Row> {
    names
        .iter()
        .map(|name| serde_json::from_value(json!({"name": name, "age": 1, "location": "x"})).expect("row"))
        .collect()
}

proptest! {
    #[test]
    fn edits_touch_only_the_session_row_and_never_the_dataset(
        names in prop::collection::btree_set("[a-z]{1,8}", 2..6),
        pick in any::<prop::sample::Index>(),
        edits in prop::collection::vec(("(name|age|location)", "[ -~]{0,12}"), 0..8),
    ) {
        let registry = TableRegistry::builtin();
        let config = registry.lookup("persons");
        let names: Vec<String> = names.into_iter().collect();
        let rows = dataset(&names);
        let before = rows.clone();
        let target = pick.get(&rows).clone();

        let mut state = transition(EditState::Viewing, EditEvent::BeginEdit(target.clone()), config);
        for (column, value) in edits {
            state = transition(state, EditEvent::EditField { column, value }, config);
        }

        let rendered = render_table("persons", config, &rows, "", &state);
        let target_id = target.get("name").cloned();
        for row in &rendered.rows {
            let editing = row.cells.iter().any(|c| matches!(c, Cell::Input { .. }));
            prop_assert_eq!(editing, row.identifier == target_id);
        }
        prop_assert_eq!(rows, before);

        let state = transition(state, EditEvent::Cancel, config);
        prop_assert_eq!(state, EditState::Viewing);
    }

    #[test]
    fn beginning_an_edit_replaces_any_previous_session(
        first in "[a-z]{1,8}",
        second in "[a-z]{1,8}",
    ) {
        let registry = TableRegistry::builtin();
        let config = registry.lookup("persons");
        let rows = dataset(&[first.clone(), second.clone()]);
        let state = transition(EditState::Viewing, EditEvent::BeginEdit(rows[0].clone()), config);
        let state = transition(state, EditEvent::EditField { column: "age".into(), value: "9".into() }, config);
        let state = transition(state, EditEvent::BeginEdit(rows[1].clone()), config);
        let session = state.session().expect("editing");
        prop_assert_eq!(&session.identifier, &Value::String(second));
        prop_assert_eq!(session.draft.get("age").map(String::as_str), Some("1"));
    }
}
