// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATASET: &str = "infra_audit";

/// Where table rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSpec {
    Memory,
    Sqlite(PathBuf),
    Http(String),
}

impl StoreSpec {
    /// Parses `memory`, `sqlite:<path>` or `http:<url>`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw == "memory" {
            return Ok(Self::Memory);
        }
        if let Some(path) = raw.strip_prefix("sqlite:") {
            if path.trim().is_empty() {
                return Err("sqlite store requires a path: sqlite:<path>".to_string());
            }
            return Ok(Self::Sqlite(PathBuf::from(path.trim())));
        }
        if let Some(url) = raw.strip_prefix("http:") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!(
                    "http store requires an absolute url: http:https://..., got {raw}"
                ));
            }
            return Ok(Self::Http(url.to_string()));
        }
        Err(format!(
            "unsupported store {raw}; use memory, sqlite:/path or http:https://..."
        ))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub store: StoreSpec,
    pub store_bearer: Option<String>,
    pub store_timeout: Duration,
    pub sqlite_init_script: Option<PathBuf>,
    pub dataset: Option<String>,
    pub tables_config: Option<PathBuf>,
    pub cors_allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            store: StoreSpec::Memory,
            store_bearer: None,
            store_timeout: Duration::from_secs(30),
            sqlite_init_script: None,
            dataset: Some(DEFAULT_DATASET.to_string()),
            tables_config: None,
            cors_allowed_origins: vec!["*".to_string()],
            max_body_bytes: 64 * 1024,
            log_json: false,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(bind) = var("TABLEDASH_BIND") {
            cfg.bind_addr = bind;
        } else if let Some(port) = var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| format!("invalid PORT {port}: {e}"))?;
            cfg.bind_addr = format!("0.0.0.0:{port}");
        }
        if let Some(store) = var("TABLEDASH_STORE") {
            cfg.store = StoreSpec::parse(&store)?;
        }
        cfg.store_bearer = var("TABLEDASH_STORE_BEARER");
        if let Some(ms) = var("TABLEDASH_STORE_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|e| format!("invalid TABLEDASH_STORE_TIMEOUT_MS {ms}: {e}"))?;
            cfg.store_timeout = Duration::from_millis(ms);
        }
        cfg.sqlite_init_script = var("TABLEDASH_SQLITE_INIT").map(PathBuf::from);
        if let Some(dataset) = lookup("TABLEDASH_DATASET") {
            let dataset = dataset.trim();
            cfg.dataset = (!dataset.is_empty()).then(|| dataset.to_string());
        }
        cfg.tables_config = var("TABLEDASH_TABLES_CONFIG").map(PathBuf::from);
        if let Some(origins) = var("TABLEDASH_CORS_ORIGINS") {
            cfg.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(bytes) = var("TABLEDASH_MAX_BODY_BYTES") {
            cfg.max_body_bytes = bytes
                .trim()
                .parse()
                .map_err(|e| format!("invalid TABLEDASH_MAX_BODY_BYTES {bytes}: {e}"))?;
        }
        if let Some(raw) = var("TABLEDASH_LOG_JSON") {
            cfg.log_json = parse_bool(raw.trim())
                .ok_or_else(|| format!("invalid TABLEDASH_LOG_JSON {raw}"))?;
        }
        Ok(cfg)
    }

    #[must_use]
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_allowed_origins
            .iter()
            .any(|o| o == "*" || o == origin)
    }
}

pub fn validate_startup_config_contract(cfg: &ServerConfig) -> Result<(), String> {
    if cfg.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if cfg.store_timeout.is_zero() {
        return Err("store timeout must be > 0".to_string());
    }
    cfg.bind_addr
        .parse::<std::net::SocketAddr>()
        .map_err(|e| format!("invalid bind addr {}: {e}", cfg.bind_addr))?;
    if cfg.sqlite_init_script.is_some() && matches!(cfg.store, StoreSpec::Http(_)) {
        return Err("TABLEDASH_SQLITE_INIT requires a memory or sqlite store".to_string());
    }
    if cfg.store_bearer.is_some() && !matches!(cfg.store, StoreSpec::Http(_)) {
        return Err("TABLEDASH_STORE_BEARER requires an http store".to_string());
    }
    Ok(())
}
