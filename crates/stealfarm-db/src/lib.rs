//! Persistence gateway for the Stealfarm simulation core.
//!
//! The services depend only on the [`FarmStore`] trait. Two
//! implementations ship with the crate and one is chosen at startup from
//! configuration:
//!
//! ```text
//! connect_store(&StoreSettings)
//!     |
//!     +-- backend: memory   --> MemoryStore (hash maps behind a RwLock)
//!     |
//!     +-- backend: postgres --> PgStore (sqlx pool, migrations/)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`FarmStore`] trait and theft commit types
//! - [`memory`] -- In-process store for tests and non-durable runs
//! - [`postgres`] -- `PostgreSQL` pool setup and embedded migrations
//! - [`pg_store`] -- `PostgreSQL` implementation of the trait
//! - [`factory`] -- Backend selection from configuration
//! - [`error`] -- Shared error types

pub mod error;
pub mod factory;
pub mod memory;
pub mod pg_store;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use factory::{StoreBackend, StoreSettings, connect_store};
pub use memory::MemoryStore;
pub use pg_store::PgStore;
pub use postgres::PostgresPool;
pub use store::{FarmStore, TheftCommit, TheftCommitOutcome};
