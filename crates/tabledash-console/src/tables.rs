// SPDX-License-Identifier: Apache-2.0

use crate::client::{ClientError, HttpMethod, TableRequest, TableTransport};
use crate::notify::Notifications;
use std::sync::Arc;

pub async fn fetch_table_names(transport: &dyn TableTransport) -> Result<Vec<String>, ClientError> {
    transport
        .send(TableRequest::new(HttpMethod::Get, &["tables"], None))
        .await?
        .decode()
}

/// Names containing `term`, ignoring case, in their original order.
#[must_use]
pub fn filter_table_names<'a>(names: &'a [String], term: &str) -> Vec<&'a str> {
    let needle = term.to_lowercase();
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

/// Table picker: the store's table names filtered by a search term.
pub struct TableListView {
    transport: Arc<dyn TableTransport>,
    names: Vec<String>,
    search: String,
    notifications: Notifications,
}

impl TableListView {
    #[must_use]
    pub fn new(transport: Arc<dyn TableTransport>) -> Self {
        Self {
            transport,
            names: Vec::new(),
            search: String::new(),
            notifications: Notifications::default(),
        }
    }

    pub async fn load(&mut self) -> bool {
        match fetch_table_names(self.transport.as_ref()).await {
            Ok(names) => {
                self.names = names;
                true
            }
            Err(err) => {
                self.notifications
                    .error(format!("Error fetching tables: {err}"));
                false
            }
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    #[must_use]
    pub fn visible(&self) -> Vec<&str> {
        filter_table_names(&self.names, &self.search)
    }

    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }
}
