//! The steal economy.
//!
//! A thief may take a bounded share of a victim's mature crops per visit.
//! Once the share is used up the pair goes on cooldown. Cooldowns are
//! durable and expire lazily; the visit counter is process-local.
//!
//! One attempt runs under the `(thief, victim)` pair lock and then the crop
//! lock, so two attempts by the same thief never both pass the ceiling and
//! an owner's harvest never interleaves with a theft of the same crop.
//!
//! Durable effects are committed in one store transaction before the thief
//! receives anything. A failed commit leaves the attempt without yield.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use stealfarm_db::{TheftCommit, TheftCommitOutcome};
use stealfarm_types::{
    CropId, FarmEvent, PlayerId, Plot, StatisticKind, StealCooldown, StealRecord,
    StealRecordId, TrapPenalty,
};
use stealfarm_world::growth;
use tracing::{debug, info, warn};

use crate::allocator::PlotAllocator;
use crate::context::FarmContext;
use crate::error::FarmError;
use crate::levels::LevelService;
use crate::locks::KeyedLocks;

/// Trap rolls are drawn at this many decimal places.
const ROLL_SCALE: u32 = 6;

/// Exclusive upper bound of a raw roll, `10^ROLL_SCALE`.
const ROLL_RANGE: i64 = 1_000_000;

type Pair = (PlayerId, PlayerId);

/// The player attempting a theft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Player identity.
    pub id: PlayerId,
    /// Whether the host grants this player the steal permission.
    pub can_steal: bool,
}

impl Actor {
    /// A player allowed to steal.
    pub const fn new(id: PlayerId) -> Self {
        Self {
            id,
            can_steal: true,
        }
    }

    /// A player without the steal permission.
    pub const fn without_permission(id: PlayerId) -> Self {
        Self {
            id,
            can_steal: false,
        }
    }
}

/// A trap that fired during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapHit {
    /// Trap type id.
    pub trap_type: String,
    /// Penalty kind.
    pub penalty: TrapPenalty,
    /// Magnitude from the trap definition.
    pub penalty_value: Decimal,
    /// `true` when a money penalty was actually withdrawn.
    pub charged: bool,
}

/// How a steal attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StealOutcome {
    /// Missing permission, own crop, or the crop is not on the victim's plot.
    Denied,
    /// The crop has not reached its last stage.
    NotMature,
    /// The pair is cooling down.
    OnCooldown {
        /// Time left.
        remaining_ms: i64,
    },
    /// The visit already took its share. A cooldown has started.
    LimitReached,
    /// The crop disappeared before the theft was committed.
    CropGone,
    /// The crop was taken.
    Success {
        /// Yield delivered to the thief.
        amount: u32,
        /// Crop type taken.
        crop_type: String,
        /// The trap that fired, if any. Firing does not stop the theft.
        trap: Option<TrapHit>,
    },
}

/// Ceiling on thefts per visit.
///
/// `floor(mature_count * ratio)`, raised to one when the ratio is positive
/// and there is at least one mature crop. A zero ratio always yields zero.
pub fn compute_steal_limit(mature_count: usize, ratio: Decimal) -> u32 {
    if mature_count == 0 || ratio <= Decimal::ZERO {
        return 0;
    }
    let limit = Decimal::from(mature_count)
        .checked_mul(ratio)
        .unwrap_or(Decimal::MAX)
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX);
    limit.max(1)
}

/// Runs theft attempts and owns the per-pair visit counters.
#[derive(Debug)]
pub struct StealEconomy {
    ctx: FarmContext,
    allocator: Arc<PlotAllocator>,
    levels: Arc<LevelService>,
    pair_locks: KeyedLocks<Pair>,
    visits: Mutex<HashMap<Pair, u32>>,
}

impl StealEconomy {
    /// Create the economy with empty visit counters.
    pub fn new(ctx: FarmContext, allocator: Arc<PlotAllocator>, levels: Arc<LevelService>) -> Self {
        Self {
            ctx,
            allocator,
            levels,
            pair_locks: KeyedLocks::new(),
            visits: Mutex::new(HashMap::new()),
        }
    }

    /// Try to take `crop_id` from `victim`.
    ///
    /// Checks run in order and the first failing one decides the outcome:
    /// permission, maturity, cooldown, ceiling. A trap may then fire before
    /// the theft is committed. Errors mean nothing was granted.
    pub async fn attempt_steal(
        &self,
        thief: &Actor,
        victim: PlayerId,
        crop_id: CropId,
    ) -> Result<StealOutcome, FarmError> {
        if !thief.can_steal || thief.id == victim {
            debug!(thief = %thief.id, victim = %victim, "Steal denied");
            return Ok(StealOutcome::Denied);
        }
        let pair = (thief.id, victim);
        let _pair_guard = self.pair_locks.lock(&pair).await;
        let _crop_guard = self.ctx.crop_locks.lock(&crop_id).await;

        let Some(plot) = self.allocator.plot_of(victim).await else {
            return Ok(StealOutcome::Denied);
        };
        let Some(crop) = self.ctx.store.crop_by_id(crop_id).await? else {
            return Ok(StealOutcome::CropGone);
        };
        if crop.plot_id != plot.id || crop.owner_id != victim {
            return Ok(StealOutcome::Denied);
        }

        let def = self.ctx.crop_def(&crop.crop_type)?;
        let now = self.ctx.now();
        if !growth::is_mature(&crop, def, now) {
            return Ok(StealOutcome::NotMature);
        }

        if let Some(remaining_ms) = self.active_cooldown(thief.id, victim, now).await {
            debug!(thief = %thief.id, victim = %victim, remaining_ms, "Steal on cooldown");
            return Ok(StealOutcome::OnCooldown { remaining_ms });
        }

        let limit = self.limit_for(thief.id, victim, &plot, now).await?;
        let visits = self.visits_of(pair);
        if visits >= limit {
            self.start_cooldown(thief.id, victim, now, limit).await?;
            return Ok(StealOutcome::LimitReached);
        }

        let trap = self.roll_traps(thief.id, victim, &plot).await?;

        let amount = self.ctx.with_rng(|rng| growth::harvest_amount(def, rng));
        let record = StealRecord {
            id: StealRecordId::new(),
            thief_id: thief.id,
            victim_id: victim,
            crop_type: crop.crop_type.clone(),
            amount,
            timestamp: now,
        };
        let newly_marked_enemy = match self
            .ctx
            .store
            .commit_theft(&TheftCommit { crop_id, record })
            .await?
        {
            TheftCommitOutcome::Committed { newly_marked_enemy } => newly_marked_enemy,
            TheftCommitOutcome::CropGone => return Ok(StealOutcome::CropGone),
        };

        self.ctx.inventory.deliver(thief.id, &def.harvest_item, amount);
        let visits = self.bump_visits(pair);
        info!(
            thief = %thief.id,
            victim = %victim,
            crop_type = %crop.crop_type,
            amount,
            visits,
            limit,
            "Crop stolen"
        );
        if newly_marked_enemy {
            self.ctx.emit(FarmEvent::EnemyMarked {
                victim_id: victim,
                thief_id: thief.id,
            });
        }
        self.ctx.emit(FarmEvent::CropStolen {
            thief_id: thief.id,
            victim_id: victim,
            crop_type: crop.crop_type.clone(),
            amount,
        });

        Ok(StealOutcome::Success {
            amount,
            crop_type: crop.crop_type,
            trap,
        })
    }

    // -----------------------------------------------------------------------
    // Queries and administration
    // -----------------------------------------------------------------------

    /// Milliseconds before `thief` may steal from `victim` again.
    pub async fn cooldown_remaining(
        &self,
        thief: PlayerId,
        victim: PlayerId,
    ) -> Result<i64, FarmError> {
        let now = self.ctx.now();
        Ok(self
            .ctx
            .store
            .cooldown(thief, victim)
            .await?
            .map_or(0, |c| c.remaining_ms(now)))
    }

    /// Thefts since the pair's last cooldown.
    pub fn visit_count(&self, thief: PlayerId, victim: PlayerId) -> u32 {
        self.visits_of((thief, victim))
    }

    /// The current per-visit ceiling for the pair.
    pub async fn steal_limit(&self, thief: PlayerId, victim: PlayerId) -> Result<u32, FarmError> {
        let Some(plot) = self.allocator.plot_of(victim).await else {
            return Ok(0);
        };
        self.limit_for(thief, victim, &plot, self.ctx.now()).await
    }

    /// Newest thefts suffered by `victim`, capped by the configured maximum.
    pub async fn recent_steals_against(
        &self,
        victim: PlayerId,
        limit: u32,
    ) -> Result<Vec<StealRecord>, FarmError> {
        Ok(self
            .ctx
            .store
            .steals_against(victim, self.record_cap(limit))
            .await?)
    }

    /// Newest thefts committed by `thief`, capped by the configured maximum.
    pub async fn recent_steals_by(
        &self,
        thief: PlayerId,
        limit: u32,
    ) -> Result<Vec<StealRecord>, FarmError> {
        Ok(self
            .ctx
            .store
            .steals_by(thief, self.record_cap(limit))
            .await?)
    }

    /// Administrative clear. The pair returns to idle with a fresh count.
    pub async fn clear_cooldown(&self, thief: PlayerId, victim: PlayerId) -> Result<(), FarmError> {
        let pair = (thief, victim);
        let _guard = self.pair_locks.lock(&pair).await;
        self.ctx.store.remove_cooldown(thief, victim).await?;
        self.reset_visits(pair);
        info!(thief = %thief, victim = %victim, "Steal cooldown cleared");
        Ok(())
    }

    /// Forget every visit counter where `player` is the thief.
    pub fn on_disconnect(&self, player: PlayerId) {
        let mut visits = self.visits.lock().unwrap_or_else(PoisonError::into_inner);
        visits.retain(|(thief, _), _| *thief != player);
    }

    // -----------------------------------------------------------------------
    // Steps. Callers hold the pair lock.
    // -----------------------------------------------------------------------

    /// Remaining cooldown, or `None` when idle.
    ///
    /// An expired row is removed on sight. A failed read counts as idle.
    async fn active_cooldown(&self, thief: PlayerId, victim: PlayerId, now: i64) -> Option<i64> {
        match self.ctx.store.cooldown(thief, victim).await {
            Ok(Some(c)) if !c.is_expired(now) => Some(c.remaining_ms(now)),
            Ok(Some(_)) => {
                if let Err(e) = self.ctx.store.remove_cooldown(thief, victim).await {
                    warn!(thief = %thief, victim = %victim, error = %e, "Expired cooldown not removed");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(thief = %thief, victim = %victim, error = %e, "Cooldown lookup failed, assuming none");
                None
            }
        }
    }

    async fn limit_for(
        &self,
        thief: PlayerId,
        victim: PlayerId,
        plot: &Plot,
        now: i64,
    ) -> Result<u32, FarmError> {
        let mature = self
            .ctx
            .store
            .crops_on_plot(plot.id)
            .await?
            .iter()
            .filter(|c| {
                self.ctx
                    .crops
                    .get(&c.crop_type)
                    .is_some_and(|d| growth::is_mature(c, d, now))
            })
            .count();
        let ratio = self.ratio_for(thief, victim).await?;
        let limit = compute_steal_limit(mature, ratio);
        debug!(thief = %thief, victim = %victim, mature, %ratio, limit, "Steal limit computed");
        Ok(limit)
    }

    /// `max(0, base - protection + enemy bonus)`.
    ///
    /// The bonus is revenge: it applies when the victim is already marked
    /// as the thief's enemy, i.e. the victim stole from the thief first.
    async fn ratio_for(&self, thief: PlayerId, victim: PlayerId) -> Result<Decimal, FarmError> {
        let steal = &self.ctx.config.steal;
        let level = self.levels.level_of(victim).await?;
        let bonus = if self.ctx.store.is_enemy(thief, victim).await? {
            steal.enemy_bonus_ratio
        } else {
            Decimal::ZERO
        };
        let ratio = steal
            .base_steal_ratio
            .checked_sub(self.ctx.levels.steal_ratio_reduction(level))
            .and_then(|r| r.checked_add(bonus))
            .unwrap_or(Decimal::ZERO);
        Ok(ratio.max(Decimal::ZERO))
    }

    async fn start_cooldown(
        &self,
        thief: PlayerId,
        victim: PlayerId,
        now: i64,
        limit: u32,
    ) -> Result<(), FarmError> {
        let cooldown = StealCooldown {
            thief_id: thief,
            victim_id: victim,
            start_time: now,
            duration_ms: self.ctx.config.steal.steal_cooldown_duration_ms,
        };
        self.ctx.store.set_cooldown(&cooldown).await?;
        self.reset_visits((thief, victim));
        info!(thief = %thief, victim = %victim, limit, cooldown_end = cooldown.end_time(), "Steal limit reached");
        self.ctx.emit(FarmEvent::StealCooldownStarted {
            thief_id: thief,
            victim_id: victim,
            cooldown_end: cooldown.end_time(),
        });
        Ok(())
    }

    /// Roll every trap on the plot in slot order. The first success fires.
    async fn roll_traps(
        &self,
        thief: PlayerId,
        victim: PlayerId,
        plot: &Plot,
    ) -> Result<Option<TrapHit>, FarmError> {
        let traps = self.ctx.store.deployed_traps(plot.id).await?;
        for trap in traps {
            let Some(def) = self.ctx.traps.get(&trap.trap_type) else {
                warn!(trap_type = %trap.trap_type, slot = trap.slot_index, "Deployed trap has no definition");
                continue;
            };
            let roll = Decimal::new(
                self.ctx.with_rng(|rng| rng.random_range(0..ROLL_RANGE)),
                ROLL_SCALE,
            );
            if roll >= def.trigger_chance {
                continue;
            }

            let charged = match def.penalty {
                TrapPenalty::MoneyDeduction if def.penalty_value > Decimal::ZERO => {
                    self.ctx.economy.withdraw(thief, def.penalty_value).await?
                }
                _ => false,
            };
            self.ctx
                .store
                .add_stat(thief, StatisticKind::TrapTriggeredCount, 1)
                .await?;
            info!(
                thief = %thief,
                victim = %victim,
                trap_type = %def.id,
                slot = trap.slot_index,
                penalty = ?def.penalty,
                charged,
                "Trap triggered"
            );
            self.ctx.emit(FarmEvent::TrapTriggered {
                thief_id: thief,
                victim_id: victim,
                trap_type: def.id.clone(),
                penalty: def.penalty,
                penalty_value: def.penalty_value,
            });
            return Ok(Some(TrapHit {
                trap_type: def.id.clone(),
                penalty: def.penalty,
                penalty_value: def.penalty_value,
                charged,
            }));
        }
        Ok(None)
    }

    fn record_cap(&self, requested: u32) -> u32 {
        requested.min(self.ctx.config.steal.max_records_per_query)
    }

    fn visits_of(&self, pair: Pair) -> u32 {
        let visits = self.visits.lock().unwrap_or_else(PoisonError::into_inner);
        visits.get(&pair).copied().unwrap_or(0)
    }

    fn bump_visits(&self, pair: Pair) -> u32 {
        let mut visits = self.visits.lock().unwrap_or_else(PoisonError::into_inner);
        let count = visits.entry(pair).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    fn reset_visits(&self, pair: Pair) {
        let mut visits = self.visits.lock().unwrap_or_else(PoisonError::into_inner);
        visits.remove(&pair);
    }
}
