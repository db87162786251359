//! The persistence gateway contract.
//!
//! Services only ever see `Arc<dyn FarmStore>`. Which implementation sits
//! behind it is decided once at startup by [`crate::connect_store`].
//!
//! Every method reports failure through [`DbError`]; callers treat an error
//! as "the operation did not happen". Writes that collide with a uniqueness
//! rule (grid cell, owner, crop position, trap slot) fail with
//! [`DbError::Conflict`].

use async_trait::async_trait;
use stealfarm_types::{
    CropId, CropInstance, DeployedTrap, EnemyRecord, PendingNotice, PlayerId, PlayerStats, Plot,
    PlotId, StatisticKind, StealCooldown, StealRecord, WaterCooldown,
};

use crate::error::DbError;

/// Everything written by one successful theft.
#[derive(Debug, Clone)]
pub struct TheftCommit {
    /// The crop being taken. Removed only if it still exists.
    pub crop_id: CropId,
    /// The durable log entry. Its amount feeds both players' statistics.
    pub record: StealRecord,
}

/// Result of [`FarmStore::commit_theft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TheftCommitOutcome {
    /// All writes were applied.
    Committed {
        /// `true` when the thief was not yet the victim's enemy.
        newly_marked_enemy: bool,
    },
    /// The crop was already gone. Nothing was written.
    CropGone,
}

/// Durable storage for plots, crops, the steal economy, and player progress.
#[async_trait]
pub trait FarmStore: Send + Sync {
    // -- plots --------------------------------------------------------------

    /// The plot owned by `owner`, if any.
    async fn plot_by_owner(&self, owner: PlayerId) -> Result<Option<Plot>, DbError>;

    /// Look up a plot by id.
    async fn plot_by_id(&self, id: PlotId) -> Result<Option<Plot>, DbError>;

    /// Insert a new plot.
    async fn insert_plot(&self, plot: &Plot) -> Result<PlotId, DbError>;

    /// Overwrite a plot's bounds and size.
    async fn update_plot_bounds(&self, plot: &Plot) -> Result<(), DbError>;

    /// Delete a plot together with its crops and traps.
    async fn delete_plot(&self, id: PlotId) -> Result<(), DbError>;

    /// Every plot.
    async fn list_plots(&self) -> Result<Vec<Plot>, DbError>;

    // -- crops --------------------------------------------------------------

    /// Insert a new crop.
    async fn insert_crop(&self, crop: &CropInstance) -> Result<CropId, DbError>;

    /// Crops planted on `plot`.
    async fn crops_on_plot(&self, plot: PlotId) -> Result<Vec<CropInstance>, DbError>;

    /// Look up a crop by id.
    async fn crop_by_id(&self, id: CropId) -> Result<Option<CropInstance>, DbError>;

    /// The crop at a block position, if any.
    async fn crop_at(
        &self,
        world_id: &str,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Option<CropInstance>, DbError>;

    /// Delete a crop. Returns `false` if it was already gone.
    async fn delete_crop(&self, id: CropId) -> Result<bool, DbError>;

    /// Overwrite a crop's planting timestamp.
    async fn update_planted_at(&self, id: CropId, planted_at: i64) -> Result<(), DbError>;

    // -- steal cooldowns ----------------------------------------------------

    /// The cooldown row for a pair, expired or not.
    async fn cooldown(
        &self,
        thief: PlayerId,
        victim: PlayerId,
    ) -> Result<Option<StealCooldown>, DbError>;

    /// Insert or replace the cooldown row for a pair.
    async fn set_cooldown(&self, cooldown: &StealCooldown) -> Result<(), DbError>;

    /// Remove the cooldown row for a pair.
    async fn remove_cooldown(&self, thief: PlayerId, victim: PlayerId) -> Result<(), DbError>;

    // -- traps --------------------------------------------------------------

    /// Traps on `plot`, ordered by slot index ascending.
    async fn deployed_traps(&self, plot: PlotId) -> Result<Vec<DeployedTrap>, DbError>;

    /// Place a trap. Fails with a conflict if the slot is taken.
    async fn deploy_trap(&self, trap: &DeployedTrap) -> Result<(), DbError>;

    /// Remove the trap in `slot`. Returns `false` if the slot was empty.
    async fn remove_trap(&self, plot: PlotId, slot: u32) -> Result<bool, DbError>;

    // -- steal records ------------------------------------------------------

    /// Append a steal record.
    async fn insert_steal_record(&self, record: &StealRecord) -> Result<(), DbError>;

    /// Most recent thefts suffered by `victim`, newest first.
    async fn steals_against(&self, victim: PlayerId, limit: u32)
    -> Result<Vec<StealRecord>, DbError>;

    /// Most recent thefts committed by `thief`, newest first.
    async fn steals_by(&self, thief: PlayerId, limit: u32) -> Result<Vec<StealRecord>, DbError>;

    // -- enemies ------------------------------------------------------------

    /// `true` if `thief` is marked as an enemy of `victim`.
    async fn is_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, DbError>;

    /// Mark `thief` as an enemy of `victim`. Returns `false` if already marked.
    async fn mark_enemy(
        &self,
        victim: PlayerId,
        thief: PlayerId,
        marked_at: i64,
    ) -> Result<bool, DbError>;

    /// Every enemy of `victim`.
    async fn enemies_of(&self, victim: PlayerId) -> Result<Vec<EnemyRecord>, DbError>;

    /// Clear an enemy mark. Returns `false` if there was none.
    async fn remove_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, DbError>;

    // -- progress -----------------------------------------------------------

    /// Stored farm level, `None` for players who never upgraded.
    async fn farm_level(&self, player: PlayerId) -> Result<Option<u32>, DbError>;

    /// Store a farm level.
    async fn set_farm_level(&self, player: PlayerId, level: u32) -> Result<(), DbError>;

    /// Cumulative statistics. Zero for unknown players.
    async fn stats(&self, player: PlayerId) -> Result<PlayerStats, DbError>;

    /// Add to one statistic.
    async fn add_stat(
        &self,
        player: PlayerId,
        kind: StatisticKind,
        amount: u64,
    ) -> Result<(), DbError>;

    // -- friends and watering -----------------------------------------------

    /// Record a mutual friendship.
    async fn add_friend(&self, a: PlayerId, b: PlayerId) -> Result<(), DbError>;

    /// Dissolve a friendship. Returns `false` if there was none.
    async fn remove_friend(&self, a: PlayerId, b: PlayerId) -> Result<bool, DbError>;

    /// `true` if the two players are friends.
    async fn are_friends(&self, a: PlayerId, b: PlayerId) -> Result<bool, DbError>;

    /// The watering cooldown for a pair, if any.
    async fn water_cooldown(
        &self,
        waterer: PlayerId,
        owner: PlayerId,
    ) -> Result<Option<WaterCooldown>, DbError>;

    /// Insert or replace the watering cooldown for a pair.
    async fn set_water_cooldown(&self, cooldown: &WaterCooldown) -> Result<(), DbError>;

    // -- offline notices ----------------------------------------------------

    /// Keep a notice until its recipient next connects.
    async fn queue_notice(&self, notice: &PendingNotice) -> Result<(), DbError>;

    /// Remove and return every notice queued for `recipient`, oldest first.
    async fn take_notices(&self, recipient: PlayerId) -> Result<Vec<PendingNotice>, DbError>;

    // -- composite ----------------------------------------------------------

    /// Apply every durable effect of a theft in one transaction.
    ///
    /// Deletes the crop only if it still exists, appends the steal record,
    /// adds the amount to the thief's [`StatisticKind::TotalSteal`] and the
    /// victim's [`StatisticKind::TotalStolen`], and marks the thief as the
    /// victim's enemy. Either all of it happens or none of it does.
    async fn commit_theft(&self, theft: &TheftCommit) -> Result<TheftCommitOutcome, DbError>;

    // -- lifecycle ----------------------------------------------------------

    /// Release held connections at shutdown. Nothing to do for stores
    /// without any.
    async fn close(&self) {}
}
