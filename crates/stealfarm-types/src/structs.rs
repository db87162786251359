//! Core record structs for the Stealfarm simulation core.
//!
//! Records have value semantics: services hand out snapshots and every
//! mutation produces a new record plus an explicit store write. All
//! timestamps are Unix epoch milliseconds; all durations are milliseconds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{StatisticKind, TrapPenalty};
use crate::ids::{CropId, PlayerId, PlotId, StealRecordId, TrapId};

// ---------------------------------------------------------------------------
// Plots
// ---------------------------------------------------------------------------

/// A square region of the farm world owned by exactly one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    /// Durable identity.
    pub id: PlotId,
    /// The owning player.
    pub owner_id: PlayerId,
    /// Grid cell X coordinate.
    pub grid_x: i32,
    /// Grid cell Z coordinate.
    pub grid_z: i32,
    /// World the plot lives in.
    pub world_id: String,
    /// Inclusive lower X bound in world coordinates.
    pub min_x: i32,
    /// Inclusive lower Z bound in world coordinates.
    pub min_z: i32,
    /// Inclusive upper X bound in world coordinates.
    pub max_x: i32,
    /// Inclusive upper Z bound in world coordinates.
    pub max_z: i32,
    /// Half-width of the plot around its grid center.
    pub size: i32,
}

impl Plot {
    /// The grid cell this plot occupies.
    pub const fn grid_cell(&self) -> GridCell {
        GridCell {
            x: self.grid_x,
            z: self.grid_z,
        }
    }

    /// The world-space region covered by this plot.
    pub fn region(&self) -> Region {
        Region {
            world_id: self.world_id.clone(),
            min_x: self.min_x,
            min_z: self.min_z,
            max_x: self.max_x,
            max_z: self.max_z,
        }
    }
}

/// An integer coordinate in plot-allocation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    /// Grid X.
    pub x: i32,
    /// Grid Z.
    pub z: i32,
}

impl GridCell {
    /// Construct a grid cell.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// An inclusive rectangle of world coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// World the region lives in.
    pub world_id: String,
    /// Inclusive lower X bound.
    pub min_x: i32,
    /// Inclusive lower Z bound.
    pub min_z: i32,
    /// Inclusive upper X bound.
    pub max_x: i32,
    /// Inclusive upper Z bound.
    pub max_z: i32,
}

// ---------------------------------------------------------------------------
// Crops
// ---------------------------------------------------------------------------

/// One growth phase of a crop type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CropStage {
    /// Zero-based position in the stage list.
    pub index: u32,
    /// How long the crop stays in this stage.
    pub duration_ms: i64,
    /// Visual marker shown while the crop is in this stage.
    #[serde(default)]
    pub marker: String,
}

/// Static definition of a crop type, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CropDefinition {
    /// Crop type identifier (e.g. `"wheat"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Ordered growth stages, contiguous from index 0.
    pub stages: Vec<CropStage>,
    /// Minimum harvest yield.
    pub harvest_min: u32,
    /// Maximum harvest yield.
    pub harvest_max: u32,
    /// Item consumed when planting.
    pub seed_item: String,
    /// Item granted on harvest or theft.
    pub harvest_item: String,
}

impl CropDefinition {
    /// Sum of all stage durations.
    pub fn total_growth_ms(&self) -> i64 {
        self.stages
            .iter()
            .fold(0_i64, |acc, s| acc.saturating_add(s.duration_ms))
    }

    /// Index of the final (mature) stage.
    pub fn last_stage_index(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }
}

/// A crop planted at a fixed position on a plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropInstance {
    /// Durable identity.
    pub id: CropId,
    /// The [`CropDefinition`] this crop follows.
    pub crop_type: String,
    /// Plot the crop was planted on.
    pub plot_id: PlotId,
    /// Owner of that plot.
    pub owner_id: PlayerId,
    /// World the crop lives in.
    pub world_id: String,
    /// Block X coordinate.
    pub x: i32,
    /// Block Y coordinate.
    pub y: i32,
    /// Block Z coordinate.
    pub z: i32,
    /// Planting time. Moved backwards by growth acceleration.
    pub planted_at: i64,
}

// ---------------------------------------------------------------------------
// Traps
// ---------------------------------------------------------------------------

/// Static definition of a trap type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrapDefinition {
    /// Trap type identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Effect applied when the trap fires.
    pub penalty: TrapPenalty,
    /// Probability in `[0, 1]` that the trap fires on a theft.
    pub trigger_chance: Decimal,
    /// Currency withdrawn from the owner when deploying.
    pub deploy_cost: Decimal,
    /// Magnitude of the penalty (seconds, currency, or unused).
    #[serde(default)]
    pub penalty_value: Decimal,
}

/// A trap placed in one of a plot's slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedTrap {
    /// Durable identity.
    pub id: TrapId,
    /// Plot the trap guards.
    pub plot_id: PlotId,
    /// The [`TrapDefinition`] this trap follows.
    pub trap_type: String,
    /// Slot position, unique per plot.
    pub slot_index: u32,
}

// ---------------------------------------------------------------------------
// Steal economy
// ---------------------------------------------------------------------------

/// A period during which a thief may not steal from a given victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealCooldown {
    /// The thief.
    pub thief_id: PlayerId,
    /// The victim.
    pub victim_id: PlayerId,
    /// When the cooldown started.
    pub start_time: i64,
    /// Cooldown length.
    pub duration_ms: i64,
}

impl StealCooldown {
    /// The instant the cooldown ends.
    pub const fn end_time(&self) -> i64 {
        self.start_time.saturating_add(self.duration_ms)
    }

    /// `true` once `now` has reached the end time.
    pub const fn is_expired(&self, now: i64) -> bool {
        now >= self.end_time()
    }

    /// Milliseconds left, never negative.
    pub const fn remaining_ms(&self, now: i64) -> i64 {
        let left = self.end_time().saturating_sub(now);
        if left > 0 { left } else { 0 }
    }
}

/// Records that `thief_id` is an enemy of `victim_id`. One-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyRecord {
    /// The player who was stolen from.
    pub victim_id: PlayerId,
    /// The player who stole.
    pub thief_id: PlayerId,
    /// When the mark was first set.
    pub marked_at: i64,
}

/// Durable log entry for one successful theft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealRecord {
    /// Durable identity.
    pub id: StealRecordId,
    /// The thief.
    pub thief_id: PlayerId,
    /// The victim.
    pub victim_id: PlayerId,
    /// Crop type taken.
    pub crop_type: String,
    /// Yield granted to the thief.
    pub amount: u32,
    /// When the theft happened.
    pub timestamp: i64,
}

/// Per-pair cooldown between two watering actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterCooldown {
    /// The player doing the watering.
    pub waterer_id: PlayerId,
    /// The owner of the watered plot.
    pub owner_id: PlayerId,
    /// When the waterer may water this owner's crops again.
    pub ends_at: i64,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A message kept for a player who was offline when it was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotice {
    /// Who should see it.
    pub recipient: PlayerId,
    /// Short human-readable text.
    pub message: String,
    /// When it was queued.
    pub created_at: i64,
}

// ---------------------------------------------------------------------------
// Farm levels
// ---------------------------------------------------------------------------

/// Static definition of one farm level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FarmLevelDefinition {
    /// Level number, starting at 1.
    pub level: u32,
    /// Size added to the plot half-width when reaching this level.
    pub plot_size_increase: i32,
    /// Number of trap slots available at this level.
    pub trap_slots: u32,
    /// Informational protection tier.
    pub protection_level: u32,
    /// Amount subtracted from the base steal ratio for this owner.
    pub steal_ratio_reduction: Decimal,
    /// Whether automatic harvesting is unlocked.
    #[serde(default)]
    pub auto_harvest_unlocked: bool,
    /// Currency needed to reach this level.
    pub upgrade_cost: Decimal,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Cumulative counters for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Crops harvested from the player's own plot.
    pub total_harvest: u64,
    /// Crops taken from other players.
    pub total_steal: u64,
    /// Crops lost to other players.
    pub total_stolen: u64,
    /// Traps the player has set off.
    pub trap_triggered_count: u64,
}

impl PlayerStats {
    /// Read one counter.
    pub const fn get(&self, kind: StatisticKind) -> u64 {
        match kind {
            StatisticKind::TotalHarvest => self.total_harvest,
            StatisticKind::TotalSteal => self.total_steal,
            StatisticKind::TotalStolen => self.total_stolen,
            StatisticKind::TrapTriggeredCount => self.trap_triggered_count,
        }
    }

    /// Add to one counter, saturating at `u64::MAX`.
    pub const fn add(&mut self, kind: StatisticKind, amount: u64) {
        let slot = match kind {
            StatisticKind::TotalHarvest => &mut self.total_harvest,
            StatisticKind::TotalSteal => &mut self.total_steal,
            StatisticKind::TotalStolen => &mut self.total_stolen,
            StatisticKind::TrapTriggeredCount => &mut self.trap_triggered_count,
        };
        *slot = slot.saturating_add(amount);
    }
}
