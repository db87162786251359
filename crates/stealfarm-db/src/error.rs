//! Error types for the persistence gateway.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors and distinguishes uniqueness conflicts so callers can
//! retry them.

/// Errors that can occur in the persistence gateway.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The row to update does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored value could not be mapped back into the domain model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// The store refused the operation (in-memory store with writes disabled).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// `true` for uniqueness conflicts that a caller may retry.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Map a `sqlx` error, turning unique violations into [`DbError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what}: {}", db.message()))
            }
            _ => Self::Postgres(err),
        }
    }
}
