// SPDX-License-Identifier: Apache-2.0

use crate::client::required_fields;
use crate::edit::{Draft, EditState};
use serde_json::Value;
use tabledash_model::{cell_text, identify, identity_key, FieldType, Row, TableConfig, RESERVED_ROW_KEY};

pub const NO_DATA_MESSAGE: &str = "No data available for this table.";

/// Columns to show: the declared fields, else the first row's keys minus `id`.
#[must_use]
pub fn columns(config: &TableConfig, dataset: &[Row]) -> Vec<String> {
    if config.declares_fields() {
        return config.fields.iter().map(|f| f.name.clone()).collect();
    }
    dataset
        .first()
        .map(|row| {
            row.columns()
                .filter(|c| *c != RESERVED_ROW_KEY)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Rows whose identity text contains `term`, ignoring case. Rows without an
/// identity never match, even for an empty term.
#[must_use]
pub fn filter_rows<'a>(dataset: &'a [Row], config: &TableConfig, term: &str) -> Vec<&'a Row> {
    let needle = term.to_lowercase();
    dataset
        .iter()
        .filter(|row| {
            identify(row, config)
                .map(identity_key)
                .is_some_and(|key| !key.is_empty() && key.to_lowercase().contains(&needle))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Input { column: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
    Save,
    Cancel,
}

impl RowAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::Save => "Save",
            Self::Cancel => "Cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub identifier: Option<Value>,
    pub cells: Vec<Cell>,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub title: String,
    pub search_placeholder: String,
    pub headers: Vec<String>,
    pub rows: Vec<RenderedRow>,
    pub empty_message: Option<&'static str>,
}

fn render_row(row: &Row, columns: &[String], config: &TableConfig, edit: &EditState) -> RenderedRow {
    let identifier = identify(row, config).cloned();
    let draft: Option<&Draft> = edit
        .session()
        .filter(|_| edit.is_editing_row(row, config))
        .map(|s| &s.draft);
    let cells = columns
        .iter()
        .map(|column| match draft {
            Some(draft) => Cell::Input {
                column: column.clone(),
                value: draft.get(column).cloned().unwrap_or_default(),
            },
            None => Cell::Text(cell_text(row.get(column))),
        })
        .collect();
    let actions = match (&identifier, draft) {
        (None, _) => Vec::new(),
        (Some(_), Some(_)) => vec![RowAction::Save, RowAction::Cancel],
        (Some(_), None) => vec![RowAction::Edit, RowAction::Delete],
    };
    RenderedRow {
        identifier,
        cells,
        actions,
    }
}

/// View model of one table: filtered rows, with the row under edit rendered
/// as inputs bound to its draft.
#[must_use]
pub fn render_table(
    table: &str,
    config: &TableConfig,
    dataset: &[Row],
    term: &str,
    edit: &EditState,
) -> RenderedTable {
    let filtered = filter_rows(dataset, config, term);
    let headers = columns(config, dataset);
    let rows: Vec<RenderedRow> = filtered
        .into_iter()
        .map(|row| render_row(row, &headers, config, edit))
        .collect();
    RenderedTable {
        title: format!("Table: {table}"),
        search_placeholder: format!("Search by {}...", config.id_field()),
        empty_message: rows.is_empty().then_some(NO_DATA_MESSAGE),
        headers,
        rows,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub label: String,
    pub kind: InputKind,
    pub placeholder: String,
    pub value: String,
}

/// New-row form seeded from the table configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateForm {
    inputs: Vec<FormInput>,
}

impl CreateForm {
    #[must_use]
    pub fn for_config(config: &TableConfig) -> Self {
        let inputs = required_fields(config)
            .into_iter()
            .map(|field| FormInput {
                kind: match field.field_type {
                    FieldType::Number => InputKind::Number,
                    FieldType::String => InputKind::Text,
                },
                placeholder: format!("Enter {}", field.label),
                name: field.name,
                label: field.label,
                value: String::new(),
            })
            .collect();
        Self { inputs }
    }

    #[must_use]
    pub fn inputs(&self) -> &[FormInput] {
        &self.inputs
    }

    /// Sets one input; `false` when the form has no such input.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        match self.inputs.iter_mut().find(|i| i.name == name) {
            Some(input) => {
                input.value = value.to_string();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn draft(&self) -> Draft {
        self.inputs
            .iter()
            .map(|i| (i.name.clone(), i.value.clone()))
            .collect()
    }

    pub fn reset(&mut self) {
        for input in &mut self.inputs {
            input.value.clear();
        }
    }
}

fn cell_display(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => text.clone(),
        Cell::Input { value, .. } => format!("[{value}]"),
    }
}

/// Fixed-width text grid of a rendered table; inputs show as `[value]`.
#[must_use]
pub fn render_text(table: &RenderedTable) -> String {
    let mut out = format!("{}\n", table.title);
    if let Some(message) = table.empty_message {
        out.push_str(message);
        out.push('\n');
        return out;
    }
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 1);
    let mut header = table.headers.clone();
    header.push("Actions".to_string());
    grid.push(header);
    for row in &table.rows {
        let mut line: Vec<String> = row.cells.iter().map(cell_display).collect();
        line.push(
            row.actions
                .iter()
                .map(|a| a.label())
                .collect::<Vec<_>>()
                .join(" "),
        );
        grid.push(line);
    }
    let widths: Vec<usize> = (0..grid[0].len())
        .map(|col| {
            grid.iter()
                .map(|line| line.get(col).map_or(0, |c| c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    for line in &grid {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join(" | ").trim_end());
        out.push('\n');
    }
    out
}
