//! Pool setup for the `PostgreSQL` farm store.
//!
//! Queries are built at runtime (not compile-time checked) so the
//! workspace builds without a live database. The schema ships embedded
//! from `migrations/`.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::DbError;

/// Farm schema, embedded at build time.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// How long a request waits for a free connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle connections are dropped after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection pool behind [`crate::PgStore`].
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open a pool of at most `max_connections` against `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed and
    /// [`DbError::Postgres`] if no connection can be made.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("invalid store.postgres-url: {e}")))?;
        let host = options.get_host().to_owned();
        let database = options.get_database().unwrap_or_default().to_owned();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!(host = %host, database = %database, max_connections, "Farm store pool open");
        Ok(Self { pool })
    }

    /// Bring the farm schema up to date. Returns the number of known
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if any migration fails.
    pub async fn migrate(&self) -> Result<usize, DbError> {
        MIGRATOR.run(&self.pool).await?;
        let known = MIGRATOR.iter().count();
        tracing::info!(migrations = known, "Farm schema up to date");
        Ok(known)
    }

    pub(crate) const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections to return, then close them all.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Farm store pool closed");
    }
}
