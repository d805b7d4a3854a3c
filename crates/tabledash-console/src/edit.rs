// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;
use std::collections::BTreeMap;
use tabledash_model::{cell_text, identify, identity_key, Row, TableConfig, RESERVED_ROW_KEY};

/// In-progress cell text keyed by column.
pub type Draft = BTreeMap<String, String>;

/// The one row being edited in a table view.
///
/// `identifier` is captured when editing begins and never changes for the
/// session, even when the draft renames the identity column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub identifier: Value,
    pub draft: Draft,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing(EditSession),
}

impl EditState {
    #[must_use]
    pub fn session(&self) -> Option<&EditSession> {
        match self {
            Self::Viewing => None,
            Self::Editing(session) => Some(session),
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    /// Whether `row` is the row under edit.
    #[must_use]
    pub fn is_editing_row(&self, row: &Row, config: &TableConfig) -> bool {
        match (self.session(), identify(row, config)) {
            (Some(session), Some(id)) => identity_key(id) == identity_key(&session.identifier),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    BeginEdit(Row),
    EditField { column: String, value: String },
    Cancel,
    SaveCompleted { succeeded: bool },
}

fn draft_from_row(row: &Row) -> Draft {
    row.iter()
        .filter(|(column, _)| *column != RESERVED_ROW_KEY)
        .map(|(column, value)| (column.to_string(), cell_text(Some(value))))
        .collect()
}

/// Draft columns whose text differs from the row the session started from.
#[must_use]
pub fn changed_fields(session: &EditSession, original: &Row) -> Draft {
    session
        .draft
        .iter()
        .filter(|(column, text)| cell_text(original.get(column)) != **text)
        .map(|(column, text)| (column.clone(), text.clone()))
        .collect()
}

/// Next edit state for `event`. Pure: no I/O and no access to the dataset.
///
/// Beginning an edit silently abandons any other draft; rows without an
/// identity cannot be edited and leave the state unchanged. Saving exits edit
/// mode whatever the outcome.
#[must_use]
pub fn transition(state: EditState, event: EditEvent, config: &TableConfig) -> EditState {
    match event {
        EditEvent::BeginEdit(row) => match identify(&row, config) {
            Some(identifier) => EditState::Editing(EditSession {
                identifier: identifier.clone(),
                draft: draft_from_row(&row),
            }),
            None => state,
        },
        EditEvent::EditField { column, value } => match state {
            EditState::Editing(mut session) => {
                session.draft.insert(column, value);
                EditState::Editing(session)
            }
            EditState::Viewing => EditState::Viewing,
        },
        EditEvent::Cancel | EditEvent::SaveCompleted { .. } => EditState::Viewing,
    }
}
