#![forbid(unsafe_code)]
//! Table console: per-row edit state, the CRUD client that keeps a local copy
//! of a table in step with the server, and the renderer that turns both into
//! a table view model.

pub mod client;
pub mod edit;
pub mod notify;
pub mod render;
pub mod tables;
pub mod view;

pub use client::{
    path_key, ClientError, CrudClient, HttpMethod, HttpTransport, MutationPolicy, SyncPolicy, TableRequest,
    TableTransport, TransportResponse,
};
pub use edit::{changed_fields, transition, Draft, EditEvent, EditSession, EditState};
pub use notify::{Notification, Notifications, Severity};
pub use render::{
    columns, filter_rows, render_table, render_text, Cell, CreateForm, RenderedRow, RenderedTable,
    RowAction, NO_DATA_MESSAGE,
};
pub use tables::{fetch_table_names, filter_table_names, TableListView};
pub use view::TableView;

pub const CRATE_NAME: &str = "tabledash-console";

/// API base used when neither `--api-url` nor `TABLEDASH_API_URL` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
