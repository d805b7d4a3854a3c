#![forbid(unsafe_code)]
//! Table resource endpoint: list/create/update/delete per registered table,
//! delegating to the query translator and a tabular store.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, put};
use axum::Router;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tabledash_model::TableRegistry;
use tabledash_query::QueryCatalog;
use tabledash_store::TabularStore;

mod config;
mod http;
mod middleware;

pub use config::{
    validate_startup_config_contract, ServerConfig, StoreSpec, DEFAULT_DATASET, DEFAULT_PORT,
};

pub const CRATE_NAME: &str = "tabledash-server";

/// Shared, immutable per-process state. Handlers hold no other state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TableRegistry>,
    pub catalog: Arc<QueryCatalog>,
    pub store: Arc<dyn TabularStore>,
    pub config: Arc<ServerConfig>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    /// Allow-lists every declared registry table under the configured dataset.
    pub fn new(
        registry: TableRegistry,
        store: Arc<dyn TabularStore>,
        config: ServerConfig,
    ) -> Result<Self, String> {
        let catalog = QueryCatalog::from_registry(&registry, config.dataset.as_deref())
            .map_err(|e| format!("table catalog rejected: {e}"))?;
        Ok(Self {
            registry: Arc::new(registry),
            catalog: Arc::new(catalog),
            store,
            config: Arc::new(config),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/api/test", get(http::handlers::test_handler))
        .route("/api/tables", get(http::handlers::tables_handler))
        .route(
            "/api/:table",
            get(http::tables::list_rows_handler).post(http::tables::create_row_handler),
        )
        .route(
            "/api/:table/:identifier",
            put(http::tables::update_row_handler).delete(http::tables::delete_row_handler),
        )
        .layer(from_fn_with_state(state.clone(), middleware::cors::cors_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}
