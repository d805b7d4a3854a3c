#![forbid(unsafe_code)]

use std::sync::Arc;
use tabledash_model::TableRegistry;
use tabledash_server::{
    build_router, validate_startup_config_contract, AppState, ServerConfig, StoreSpec,
};
use tabledash_store::{HttpQueryStore, SqliteStore, TabularStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn load_registry(cfg: &ServerConfig) -> Result<TableRegistry, String> {
    match &cfg.tables_config {
        Some(path) => TableRegistry::from_path(path).map_err(|e| e.to_string()),
        None => Ok(TableRegistry::builtin()),
    }
}

async fn open_store(cfg: &ServerConfig) -> Result<Arc<dyn TabularStore>, String> {
    let sqlite = match &cfg.store {
        StoreSpec::Http(url) => {
            let store = HttpQueryStore::new(url, cfg.store_bearer.clone(), cfg.store_timeout)
                .map_err(|e| e.to_string())?;
            return Ok(Arc::new(store));
        }
        StoreSpec::Memory => SqliteStore::in_memory(cfg.dataset.clone()),
        StoreSpec::Sqlite(path) => SqliteStore::open(path, cfg.dataset.clone()),
    }
    .map_err(|e| e.to_string())?;
    if let Some(script) = &cfg.sqlite_init_script {
        let sql = std::fs::read_to_string(script)
            .map_err(|e| format!("read {} failed: {e}", script.display()))?;
        sqlite.execute_batch(&sql).await.map_err(|e| e.to_string())?;
        info!(script = %script.display(), "sqlite store seeded");
    }
    Ok(Arc::new(sqlite))
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cfg = ServerConfig::from_env()?;
    init_tracing(cfg.log_json);
    validate_startup_config_contract(&cfg)?;

    let registry = load_registry(&cfg)?;
    let store = open_store(&cfg).await?;
    info!(
        backend = store.backend_tag(),
        dataset = cfg.dataset.as_deref().unwrap_or(""),
        tables = ?registry.table_names().collect::<Vec<_>>(),
        "table registry loaded"
    );

    let bind_addr = cfg.bind_addr.clone();
    let state = AppState::new(registry, store, cfg)?;
    let app = build_router(state);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("tabledash-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
