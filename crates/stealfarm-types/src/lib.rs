//! Shared type definitions for the Stealfarm simulation core.
//!
//! This crate is the single source of truth for the records, identifiers
//! and events exchanged between the world logic, the persistence layer
//! and the services.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Trap penalties, statistics and acceleration reasons
//! - [`structs`] -- Plots, crops, traps, cooldowns, enemies, notices, levels,
//!   stats
//! - [`events`] -- Domain events published to the event sink

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AccelerateReason, StatisticKind, TrapPenalty};
pub use events::FarmEvent;
pub use ids::{CropId, PlayerId, PlotId, StealRecordId, TrapId};
pub use structs::{
    CropDefinition, CropInstance, CropStage, DeployedTrap, EnemyRecord, FarmLevelDefinition,
    GridCell, PendingNotice, PlayerStats, Plot, Region, StealCooldown, StealRecord,
    TrapDefinition, WaterCooldown,
};
