//! Server configuration, resolved once at startup.
//!
//! Handlers never read the environment; everything they need is carried
//! in [`ServerConfig`] through the application state.

use pacientes_core::db::{Database, DbResult};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DB_PATH: &str = "pacientes.db";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Database path that selects an in-memory store.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (`PACIENTES_ADDR`, or `0.0.0.0:$PORT`)
    pub addr: String,
    /// SQLite file (`PACIENTES_DB_PATH`)
    pub db_path: String,
    /// Deployment environment (`APP_ENV`)
    pub environment: String,
}

impl ServerConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = non_empty("PACIENTES_ADDR")
            .or_else(|| non_empty("PORT").map(|port| format!("0.0.0.0:{}", port.trim())))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        Self {
            addr,
            db_path: non_empty("PACIENTES_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            environment: non_empty("APP_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
        }
    }

    /// In-memory store, development environment. Used by tests.
    pub fn in_memory() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            db_path: IN_MEMORY.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }

    /// Error details are only exposed to clients in development.
    pub fn is_development(&self) -> bool {
        self.environment == DEFAULT_ENVIRONMENT
    }

    pub fn open_database(&self) -> DbResult<Database> {
        if self.db_path == IN_MEMORY {
            Database::open_in_memory()
        } else {
            Database::open(&self.db_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert!(config.is_development());
    }

    #[test]
    fn test_port_fallback() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "9090")]));
        assert_eq!(config.addr, "0.0.0.0:9090");

        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("PACIENTES_ADDR", "127.0.0.1:7000"),
        ]));
        assert_eq!(config.addr, "127.0.0.1:7000");
    }

    #[test]
    fn test_production_environment() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("PACIENTES_DB_PATH", ":memory:"),
        ]));
        assert!(!config.is_development());
        assert!(config.open_database().is_ok());
    }
}
