// SPDX-License-Identifier: Apache-2.0

mod support;

use serde_json::json;
use std::sync::Arc;
use support::{FakeTableApi, TransportFailure};
use tabledash_console::{
    render_text, Cell, EditState, HttpMethod, RowAction, Severity, TableListView, TableView,
    NO_DATA_MESSAGE,
};
use tabledash_model::TableRegistry;

fn persons() -> (Arc<FakeTableApi>, TableView) {
    let api = Arc::new(FakeTableApi::new(
        "name",
        vec![
            json!({"name": "Alice", "age": 30, "location": "NYC"}),
            json!({"name": "Bob", "age": null, "location": "LA"}),
        ],
    ));
    let view = TableView::new("persons", &TableRegistry::builtin(), api.clone());
    (api, view)
}

#[tokio::test]
async fn search_matches_identity_only() {
    let (_, mut view) = persons();
    assert!(view.load().await);

    view.set_search("nyc");
    let rendered = view.render();
    assert!(rendered.rows.is_empty());
    assert_eq!(rendered.empty_message, Some(NO_DATA_MESSAGE));

    view.set_search("ALI");
    let rendered = view.render();
    assert_eq!(rendered.rows.len(), 1);
    assert_eq!(rendered.rows[0].identifier, Some(json!("Alice")));
    assert_eq!(rendered.search_placeholder, "Search by name...");
}

#[tokio::test]
async fn reload_clears_the_search_term() {
    let (_, mut view) = persons();
    view.set_search("bob");
    assert!(view.load().await);
    assert_eq!(view.search(), "");
    assert_eq!(view.render().rows.len(), 2);
}

#[tokio::test]
async fn only_the_edited_row_renders_as_inputs() {
    let (_, mut view) = persons();
    view.load().await;
    assert!(view.begin_edit(&json!("Bob")));
    view.edit_field("location", "SF");

    let rendered = view.render();
    let alice = &rendered.rows[0];
    let bob = &rendered.rows[1];
    assert_eq!(alice.actions, vec![RowAction::Edit, RowAction::Delete]);
    assert!(alice.cells.iter().all(|c| matches!(c, Cell::Text(_))));
    assert_eq!(bob.actions, vec![RowAction::Save, RowAction::Cancel]);
    assert_eq!(
        bob.cells[2],
        Cell::Input {
            column: "location".to_string(),
            value: "SF".to_string()
        }
    );
    assert_eq!(view.rows()[1].get("location"), Some(&json!("LA")));
    assert!(render_text(&rendered).contains("Save"));
}

#[tokio::test]
async fn save_sends_changed_columns_and_keeps_null_cells() {
    let (api, mut view) = persons();
    view.load().await;
    view.begin_edit(&json!("Bob"));
    view.edit_field("location", "SF");
    assert!(view.save_edit().await);

    let put = api.requests().pop().expect("put");
    assert_eq!(put.method, HttpMethod::Put);
    assert_eq!(put.body, Some(json!({"location": "SF"})));
    assert_eq!(view.edit_state(), &EditState::Viewing);
    assert_eq!(
        view.rows()[1],
        support::row(json!({"name": "Bob", "age": null, "location": "SF"}))
    );
}

#[tokio::test]
async fn unchanged_save_makes_no_request() {
    let (api, mut view) = persons();
    view.load().await;
    view.begin_edit(&json!("Alice"));
    assert!(view.save_edit().await);
    assert_eq!(api.methods(), vec![HttpMethod::Get]);
    assert_eq!(view.edit_state(), &EditState::Viewing);
    assert_eq!(
        view.notifications().last().map(|n| n.message.as_str()),
        Some("No changes to save")
    );
}

#[tokio::test]
async fn failed_save_still_leaves_edit_mode() {
    let (api, mut view) = persons();
    view.load().await;
    view.begin_edit(&json!("Alice"));
    view.edit_field("age", "31");
    api.fail_next(TransportFailure::Status(500, "boom".to_string()));
    assert!(!view.save_edit().await);

    assert_eq!(view.edit_state(), &EditState::Viewing);
    assert_eq!(view.rows()[0].get("age"), Some(&json!(30)));
    let last = view.notifications().last().expect("notification");
    assert_eq!(last.severity, Severity::Error);
    assert_eq!(
        last.message,
        "Error updating data: ResponseError: status 500: boom"
    );
}

#[tokio::test]
async fn failures_are_reported_with_operation_context() {
    let (api, mut view) = persons();
    api.fail_next(TransportFailure::Unreachable);
    assert!(!view.load().await);
    assert!(view.rows().is_empty());

    view.load().await;
    api.fail_next(TransportFailure::Status(500, "nope".to_string()));
    assert!(!view.delete_row(&json!("Alice")).await);
    assert_eq!(view.rows().len(), 2);

    let messages: Vec<String> = view
        .take_notifications()
        .drain()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Error fetching table data: TransportError: "));
    assert_eq!(messages[1], "Error deleting data: ResponseError: status 500: nope");
    assert!(view.notifications().is_empty());
}

#[tokio::test]
async fn invalid_form_warns_and_keeps_its_values() {
    let (api, mut view) = persons();
    assert!(view.set_form_value("name", "Carol"));
    assert!(view.set_form_value("age", "old"));
    assert!(view.set_form_value("location", "SF"));
    assert!(!view.set_form_value("salary", "1"));

    assert!(!view.add_row().await);
    assert!(api.requests().is_empty());
    let last = view.notifications().last().expect("warning");
    assert_eq!(last.severity, Severity::Warning);
    assert_eq!(last.message, "Please enter a valid Age");
    assert_eq!(view.form().draft().get("name").map(String::as_str), Some("Carol"));

    view.set_form_value("age", "25");
    assert!(view.add_row().await);
    assert_eq!(view.form().draft().get("name").map(String::as_str), Some(""));
    assert_eq!(view.rows().len(), 3);
}

#[tokio::test]
async fn deleting_reports_the_server_message() {
    let (_, mut view) = persons();
    view.load().await;
    assert!(view.delete_row(&json!("Alice")).await);
    assert_eq!(
        view.notifications().last().map(|n| n.message.as_str()),
        Some("Deleted 1 row(s)")
    );
    assert_eq!(view.render().rows.len(), 1);
}

#[tokio::test]
async fn editing_an_unknown_row_warns() {
    let (_, mut view) = persons();
    view.load().await;
    assert!(!view.begin_edit(&json!("Nobody")));
    assert!(!view.edit_state().is_editing());
    assert_eq!(
        view.notifications().last().map(|n| n.severity),
        Some(Severity::Warning)
    );
}

#[tokio::test]
async fn table_list_filters_names() {
    let api = Arc::new(FakeTableApi::new("name", vec![]));
    let mut list = TableListView::new(api.clone());
    assert!(list.load().await);
    list.set_search("DAG");
    assert_eq!(list.visible(), vec!["critical_dags"]);

    api.fail_next(TransportFailure::Unreachable);
    assert!(!list.load().await);
    assert!(list.notifications().has_errors());
    assert_eq!(list.visible(), vec!["critical_dags"]);
}
