//! Startup selection of the [`FarmStore`] implementation.
//!
//! This is the only place that names concrete stores. Everything else
//! holds an `Arc<dyn FarmStore>`.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::DbError;
use crate::memory::MemoryStore;
use crate::pg_store::PgStore;
use crate::postgres::PostgresPool;
use crate::store::FarmStore;

/// Which store backs the farm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Non-durable in-process maps.
    #[default]
    Memory,
    /// `PostgreSQL` via [`PgStore`].
    Postgres,
}

impl std::str::FromStr for StoreBackend {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, DbError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(DbError::Config(format!("unknown store backend: {other}"))),
        }
    }
}

/// Store section of the farm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreSettings {
    /// Selected backend.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Connection URL, required for [`StoreBackend::Postgres`].
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// Pool size for [`StoreBackend::Postgres`].
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Apply pending migrations on connect.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_run_migrations() -> bool {
    true
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            postgres_url: None,
            max_connections: default_max_connections(),
            run_migrations: default_run_migrations(),
        }
    }
}

/// Build the configured store.
///
/// # Errors
///
/// Returns [`DbError::Config`] when `PostgreSQL` is selected without a URL,
/// or any connection or migration error.
pub async fn connect_store(settings: &StoreSettings) -> Result<Arc<dyn FarmStore>, DbError> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory farm store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = settings
                .postgres_url
                .as_deref()
                .ok_or_else(|| DbError::Config("store.postgres-url is required".to_owned()))?;
            let pool = PostgresPool::connect(url, settings.max_connections).await?;
            if settings.run_migrations {
                pool.migrate().await?;
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_types::PlayerId;

    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[tokio::test]
    async fn postgres_without_url_is_a_config_error() {
        let settings = StoreSettings {
            backend: StoreBackend::Postgres,
            ..StoreSettings::default()
        };
        let err = connect_store(&settings).await.err().unwrap();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[tokio::test]
    async fn memory_backend_starts_empty() {
        let store = connect_store(&StoreSettings::default()).await.unwrap();
        assert!(store.list_plots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closing_a_memory_store_keeps_its_state() {
        let store = connect_store(&StoreSettings::default()).await.unwrap();
        let player = PlayerId::new();
        store.set_farm_level(player, 2).await.unwrap();
        store.close().await;
        assert_eq!(store.farm_level(player).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn malformed_postgres_url_is_a_config_error() {
        let settings = StoreSettings {
            backend: StoreBackend::Postgres,
            postgres_url: Some("not a url".to_owned()),
            ..StoreSettings::default()
        };
        let err = connect_store(&settings).await.err().unwrap();
        assert!(matches!(err, DbError::Config(_)));
    }
}
