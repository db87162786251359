//! Error types for the `stealfarm-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use stealfarm_types::{GridCell, PlayerId, PlotId};

/// Errors from plot geometry, the occupancy index, and catalog validation.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,

    /// A plot was asked to grow by a negative amount.
    #[error("plot size increase must not be negative, got {0}")]
    NegativeExpansion(i32),

    /// A plot would grow into its neighbours' cells.
    #[error("plot half-width {size} exceeds the grid limit {max}")]
    PlotTooLarge {
        /// Requested half-width.
        size: i32,
        /// Largest half-width the grid spacing allows.
        max: i32,
    },

    /// The spiral search gave up before finding a free cell.
    #[error("no free grid cell within {probes} spiral steps")]
    GridExhausted {
        /// Number of cells examined.
        probes: usize,
    },

    /// A grid cell is already held by another plot.
    #[error("grid cell ({}, {}) is already occupied", .0.x, .0.z)]
    CellOccupied(GridCell),

    /// The owner already has a plot in the index.
    #[error("player {0} already owns a plot")]
    OwnerAlreadyIndexed(PlayerId),

    /// The plot is not present in the index.
    #[error("plot not found: {0}")]
    PlotNotFound(PlotId),

    /// A crop definition declares no stages.
    #[error("crop definition {crop} has no growth stages")]
    EmptyStages {
        /// The offending crop type.
        crop: String,
    },

    /// Stage indices are not contiguous from zero.
    #[error("crop definition {crop}: expected stage index {expected}, found {found}")]
    NonContiguousStage {
        /// The offending crop type.
        crop: String,
        /// Index the stage should have had.
        expected: u32,
        /// Index it actually had.
        found: u32,
    },

    /// A stage has a negative duration.
    #[error("crop definition {crop}: stage {index} has negative duration")]
    NegativeDuration {
        /// The offending crop type.
        crop: String,
        /// The offending stage.
        index: u32,
    },

    /// A trap trigger chance lies outside `[0, 1]`.
    #[error("trap definition {trap}: trigger chance must be within [0, 1]")]
    InvalidTriggerChance {
        /// The offending trap type.
        trap: String,
    },

    /// Two definitions share the same identifier.
    #[error("duplicate {kind} definition: {id}")]
    DuplicateDefinition {
        /// Catalog kind (`crop`, `trap`, `level`).
        kind: &'static str,
        /// The repeated identifier.
        id: String,
    },
}
