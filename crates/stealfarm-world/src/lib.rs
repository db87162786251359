//! Pure farm-world logic for the Stealfarm simulation core.
//!
//! Nothing in this crate performs I/O or holds shared state. Services in
//! `stealfarm-core` own the locks and the persistence calls and delegate
//! the arithmetic here.
//!
//! # Modules
//!
//! - [`plot`] -- Spiral grid walk, plot bounds, containment, and the
//!   occupancy index.
//! - [`growth`] -- Time-derived crop stages, maturity, yield, and
//!   acceleration.
//! - [`catalog`] -- Validated crop, trap, and farm level definitions.
//! - [`error`] -- Error types for geometry and catalog validation.

pub mod catalog;
pub mod error;
pub mod growth;
pub mod plot;

// Re-export primary types at crate root.
pub use catalog::{CropCatalog, LevelCatalog, TrapCatalog};
pub use error::WorldError;
pub use plot::{Bounds, OccupancyIndex, PlotGeometry, SpiralWalk, contains, spiral_point};
