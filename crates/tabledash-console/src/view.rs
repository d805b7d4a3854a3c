// SPDX-License-Identifier: Apache-2.0

use crate::client::{ClientError, CrudClient, MutationPolicy, TableTransport};
use crate::edit::{changed_fields, transition, EditEvent, EditState};
use crate::notify::Notifications;
use crate::render::{render_table, CreateForm, RenderedTable};
use serde_json::Value;
use std::sync::Arc;
use tabledash_model::{identity_key, same_identity, Row, TableConfig, TableRegistry};

/// One table page: dataset, edit session, search term, new-row form and the
/// notifications its operations produced.
///
/// Operations take `&mut self`, so a view runs at most one request at a time
/// and holds at most one edit session.
pub struct TableView {
    client: CrudClient,
    edit: EditState,
    search: String,
    form: CreateForm,
    notifications: Notifications,
}

impl TableView {
    #[must_use]
    pub fn new(table: &str, registry: &TableRegistry, transport: Arc<dyn TableTransport>) -> Self {
        let config = registry.lookup(table).clone();
        Self {
            form: CreateForm::for_config(&config),
            client: CrudClient::new(transport, table, config),
            edit: EditState::Viewing,
            search: String::new(),
            notifications: Notifications::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MutationPolicy) -> Self {
        self.client = self.client.with_policy(policy);
        self
    }

    fn report(&mut self, context: &str, err: &ClientError) {
        match err {
            ClientError::Validation(message) => self.notifications.warn(message.clone()),
            other => self.notifications.error(format!("{context}: {other}")),
        }
    }

    fn config(&self) -> &TableConfig {
        self.client.config()
    }

    /// Fetches the table and clears the search term.
    pub async fn load(&mut self) -> bool {
        self.search.clear();
        match self.client.list().await {
            Ok(_) => true,
            Err(err) => {
                self.report("Error fetching table data", &err);
                false
            }
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_form_value(&mut self, name: &str, value: &str) -> bool {
        self.form.set(name, value)
    }

    #[must_use]
    pub fn form(&self) -> &CreateForm {
        &self.form
    }

    /// Submits the new-row form; the form is cleared only on success.
    pub async fn add_row(&mut self) -> bool {
        match self.client.create(&self.form.draft()).await {
            Ok(()) => {
                self.form.reset();
                true
            }
            Err(err) => {
                self.report("Error adding data", &err);
                false
            }
        }
    }

    /// Starts editing the loaded row with this identity.
    pub fn begin_edit(&mut self, identifier: &Value) -> bool {
        let row: Option<Row> = self
            .client
            .rows()
            .iter()
            .find(|row| same_identity(row, self.config(), identifier))
            .cloned();
        match row {
            Some(row) => {
                self.dispatch(EditEvent::BeginEdit(row));
                self.edit.is_editing()
            }
            None => {
                self.notifications
                    .warn(format!("No editable row for {}", identity_key(identifier)));
                false
            }
        }
    }

    pub fn edit_field(&mut self, column: &str, value: &str) {
        self.dispatch(EditEvent::EditField {
            column: column.to_string(),
            value: value.to_string(),
        });
    }

    pub fn cancel_edit(&mut self) {
        self.dispatch(EditEvent::Cancel);
    }

    /// Sends the edited columns, then leaves edit mode whatever the outcome.
    /// Untouched columns are not sent, so empty cells stay null.
    pub async fn save_edit(&mut self) -> bool {
        let Some(session) = self.edit.session().cloned() else {
            self.notifications.warn("No row is being edited");
            return false;
        };
        let original = self
            .client
            .rows()
            .iter()
            .find(|row| same_identity(row, self.config(), &session.identifier))
            .cloned();
        let draft = match &original {
            Some(row) => changed_fields(&session, row),
            None => session.draft.clone(),
        };
        if draft.is_empty() {
            self.notifications.info("No changes to save");
            self.dispatch(EditEvent::SaveCompleted { succeeded: true });
            return true;
        }
        let succeeded = match self.client.update(&session.identifier, &draft).await {
            Ok(_) => true,
            Err(err) => {
                self.report("Error updating data", &err);
                false
            }
        };
        self.dispatch(EditEvent::SaveCompleted { succeeded });
        succeeded
    }

    pub async fn delete_row(&mut self, identifier: &Value) -> bool {
        match self.client.delete(identifier).await {
            Ok(message) => {
                self.notifications.info(message);
                true
            }
            Err(err) => {
                self.report("Error deleting data", &err);
                false
            }
        }
    }

    fn dispatch(&mut self, event: EditEvent) {
        let state = std::mem::take(&mut self.edit);
        self.edit = transition(state, event, self.client.config());
    }

    #[must_use]
    pub fn render(&self) -> RenderedTable {
        render_table(
            self.client.table(),
            self.config(),
            self.client.rows(),
            &self.search,
            &self.edit,
        )
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        self.client.rows()
    }

    #[must_use]
    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Notifications {
        std::mem::take(&mut self.notifications)
    }
}
