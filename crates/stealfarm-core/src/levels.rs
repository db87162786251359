//! Farm levels and upgrades.
//!
//! A player's level decides their plot size, trap capacity and how much of
//! their harvest thieves may take. Players who never upgraded are level 1.

use std::sync::Arc;

use stealfarm_types::{FarmEvent, PlayerId};
use tracing::{info, warn};

use crate::allocator::PlotAllocator;
use crate::context::FarmContext;
use crate::error::FarmError;
use crate::locks::KeyedLocks;

/// Level every player starts at.
pub const BASE_LEVEL: u32 = 1;

/// Reads and changes farm levels.
#[derive(Debug)]
pub struct LevelService {
    ctx: FarmContext,
    allocator: Arc<PlotAllocator>,
    player_locks: KeyedLocks<PlayerId>,
}

impl LevelService {
    /// Create the service.
    pub fn new(ctx: FarmContext, allocator: Arc<PlotAllocator>) -> Self {
        Self {
            ctx,
            allocator,
            player_locks: KeyedLocks::new(),
        }
    }

    /// Current level of `player`.
    pub async fn level_of(&self, player: PlayerId) -> Result<u32, FarmError> {
        Ok(self
            .ctx
            .store
            .farm_level(player)
            .await?
            .unwrap_or(BASE_LEVEL))
    }

    /// Buy the next level.
    ///
    /// Checks the ceiling, withdraws the upgrade cost, stores the new level
    /// and grows the owner's plot. A failed level write refunds the cost.
    pub async fn upgrade(&self, owner: PlayerId) -> Result<u32, FarmError> {
        let _guard = self.player_locks.lock(&owner).await;
        let current = self.level_of(owner).await?;
        if current >= self.ctx.levels.max_level() {
            return Err(FarmError::MaxLevel(current));
        }
        let next = current.saturating_add(1);
        let def = self
            .ctx
            .levels
            .get(next)
            .cloned()
            .ok_or(FarmError::MaxLevel(current))?;

        if !self.ctx.economy.withdraw(owner, def.upgrade_cost).await? {
            return Err(FarmError::InsufficientFunds {
                needed: def.upgrade_cost,
            });
        }
        if let Err(e) = self.ctx.store.set_farm_level(owner, next).await {
            warn!(owner = %owner, error = %e, "Level write failed, refunding upgrade");
            self.ctx.economy.deposit(owner, def.upgrade_cost).await?;
            return Err(e.into());
        }

        if def.plot_size_increase > 0 {
            if let Some(plot) = self.allocator.plot_of(owner).await {
                self.allocator.expand(plot.id, def.plot_size_increase).await?;
            }
        }

        info!(owner = %owner, old_level = current, new_level = next, "Farm upgraded");
        self.ctx.emit(FarmEvent::FarmUpgraded {
            owner_id: owner,
            old_level: current,
            new_level: next,
        });
        Ok(next)
    }

    /// Administrative level change, without payment.
    ///
    /// The owner's plot is resized to the initial size plus every increase
    /// up to `level`. Shrinking goes through a reset, which clears crops.
    pub async fn set_level(&self, player: PlayerId, level: u32) -> Result<(), FarmError> {
        let max = self.ctx.levels.max_level();
        if !(BASE_LEVEL..=max).contains(&level) {
            return Err(FarmError::MaxLevel(max));
        }
        let _guard = self.player_locks.lock(&player).await;
        self.ctx.store.set_farm_level(player, level).await?;

        let Some(plot) = self.allocator.plot_of(player).await else {
            return Ok(());
        };
        let increase = self.cumulative_increase(level);
        let expected = self
            .ctx
            .config
            .plot
            .initial_plot_size
            .saturating_add(increase);
        if plot.size < expected {
            self.allocator
                .expand(plot.id, expected.saturating_sub(plot.size))
                .await?;
        } else if plot.size > expected {
            self.allocator.reset(plot.id).await?;
            self.allocator.expand(plot.id, increase).await?;
        }
        info!(player = %player, level, plot_size = expected, "Farm level set");
        Ok(())
    }

    /// Sum of plot increases from level 2 through `level`.
    fn cumulative_increase(&self, level: u32) -> i32 {
        (BASE_LEVEL.saturating_add(1)..=level)
            .filter_map(|l| self.ctx.levels.get(l))
            .fold(0_i32, |acc, d| acc.saturating_add(d.plot_size_increase))
    }
}
