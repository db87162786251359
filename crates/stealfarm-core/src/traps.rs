//! Trap deployment.
//!
//! Owners buy traps into numbered slots on their plot. The number of slots
//! comes from the owner's farm level. The steal economy reads the deployed
//! traps when it rolls for penalties.

use std::sync::Arc;

use rust_decimal::Decimal;
use stealfarm_types::{DeployedTrap, FarmEvent, PlayerId, PlotId, TrapId};
use tracing::{info, warn};

use crate::allocator::PlotAllocator;
use crate::context::FarmContext;
use crate::error::FarmError;
use crate::levels::LevelService;

/// Store writes attempted for one deployment.
const DEPLOY_ATTEMPTS: usize = 2;

/// Places and removes traps.
#[derive(Debug)]
pub struct TrapService {
    ctx: FarmContext,
    allocator: Arc<PlotAllocator>,
    levels: Arc<LevelService>,
}

impl TrapService {
    /// Create the service.
    pub const fn new(
        ctx: FarmContext,
        allocator: Arc<PlotAllocator>,
        levels: Arc<LevelService>,
    ) -> Self {
        Self {
            ctx,
            allocator,
            levels,
        }
    }

    /// Buy a `trap_type` trap into `slot` on the owner's plot.
    ///
    /// The slot must be below the owner's capacity and free. The deploy cost
    /// is withdrawn first and refunded if the trap cannot be stored.
    pub async fn deploy(
        &self,
        owner: PlayerId,
        trap_type: &str,
        slot: u32,
    ) -> Result<DeployedTrap, FarmError> {
        let plot = self
            .allocator
            .plot_of(owner)
            .await
            .ok_or(FarmError::NoPlot(owner))?;
        let level = self.levels.level_of(owner).await?;
        let capacity = self.ctx.levels.trap_slots(level);
        if slot >= capacity {
            return Err(FarmError::SlotOutOfRange { slot, capacity });
        }
        let cost = self.ctx.trap_def(trap_type)?.deploy_cost;
        if self.slot_taken(plot.id, slot).await? {
            return Err(FarmError::SlotOccupied(slot));
        }

        if cost > Decimal::ZERO && !self.ctx.economy.withdraw(owner, cost).await? {
            return Err(FarmError::InsufficientFunds { needed: cost });
        }

        let trap = DeployedTrap {
            id: TrapId::new(),
            plot_id: plot.id,
            trap_type: trap_type.to_owned(),
            slot_index: slot,
        };
        match self.store_trap(&trap).await {
            Ok(()) => {
                info!(owner = %owner, trap_type, slot, "Trap deployed");
                self.ctx.emit(FarmEvent::TrapDeployed {
                    owner_id: owner,
                    trap_type: trap.trap_type.clone(),
                    slot_index: slot,
                });
                Ok(trap)
            }
            Err(e) => {
                if cost > Decimal::ZERO {
                    self.ctx.economy.deposit(owner, cost).await?;
                }
                Err(e)
            }
        }
    }

    /// Clear the trap in `slot` on the owner's plot.
    pub async fn remove(&self, owner: PlayerId, slot: u32) -> Result<(), FarmError> {
        let plot = self
            .allocator
            .plot_of(owner)
            .await
            .ok_or(FarmError::NoPlot(owner))?;
        if !self.ctx.store.remove_trap(plot.id, slot).await? {
            return Err(FarmError::SlotEmpty(slot));
        }
        info!(owner = %owner, slot, "Trap removed");
        Ok(())
    }

    /// Traps on a plot, by slot index ascending.
    pub async fn deployed(&self, plot_id: PlotId) -> Result<Vec<DeployedTrap>, FarmError> {
        Ok(self.ctx.store.deployed_traps(plot_id).await?)
    }

    async fn slot_taken(&self, plot_id: PlotId, slot: u32) -> Result<bool, FarmError> {
        Ok(self
            .ctx
            .store
            .deployed_traps(plot_id)
            .await?
            .iter()
            .any(|t| t.slot_index == slot))
    }

    /// Write the trap, re-reading the slot once after a conflict.
    async fn store_trap(&self, trap: &DeployedTrap) -> Result<(), FarmError> {
        for attempt in 1..=DEPLOY_ATTEMPTS {
            match self.ctx.store.deploy_trap(trap).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_conflict() => {
                    warn!(attempt, slot = trap.slot_index, error = %e, "Trap slot conflicted");
                    if self.slot_taken(trap.plot_id, trap.slot_index).await? {
                        return Err(FarmError::SlotOccupied(trap.slot_index));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(FarmError::ResourceExhausted(format!(
            "trap slot {} kept conflicting",
            trap.slot_index
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use stealfarm_db::FarmStore;

    use super::*;
    use crate::context::testing::{Harness, harness};
    use crate::economy::Economy;
    use crate::error::ErrorKind;

    fn service(h: &Harness) -> (Arc<PlotAllocator>, TrapService) {
        let allocator = Arc::new(PlotAllocator::new(h.ctx.clone()));
        let levels = Arc::new(LevelService::new(h.ctx.clone(), Arc::clone(&allocator)));
        let traps = TrapService::new(h.ctx.clone(), Arc::clone(&allocator), levels);
        (allocator, traps)
    }

    async fn owner_at_level(h: &Harness, allocator: &PlotAllocator, level: u32) -> PlayerId {
        let owner = PlayerId::new();
        allocator.allocate(owner).await.unwrap();
        h.store.set_farm_level(owner, level).await.unwrap();
        h.economy.set_balance(owner, dec!(1000)).await;
        owner
    }

    #[tokio::test]
    async fn deploy_charges_and_records() {
        let h = harness();
        let (allocator, traps) = service(&h);
        let owner = owner_at_level(&h, &allocator, 3).await;

        let trap = traps.deploy(owner, "fine_sign", 1).await.unwrap();
        assert_eq!(trap.slot_index, 1);
        assert_eq!(h.economy.balance(owner).await.unwrap(), dec!(750));
        assert_eq!(traps.deployed(trap.plot_id).await.unwrap(), vec![trap]);
        assert_eq!(h.events.names(), vec!["plot_allocated", "trap_deployed"]);
    }

    #[tokio::test]
    async fn level_one_has_no_slots() {
        let h = harness();
        let (allocator, traps) = service(&h);
        let owner = PlayerId::new();
        allocator.allocate(owner).await.unwrap();

        let err = traps.deploy(owner, "sticky_web", 0).await.unwrap_err();
        assert!(matches!(err, FarmError::SlotOutOfRange { slot: 0, capacity: 0 }));
    }

    #[tokio::test]
    async fn occupied_slot_is_rejected_without_charge() {
        let h = harness();
        let (allocator, traps) = service(&h);
        let owner = owner_at_level(&h, &allocator, 2).await;
        traps.deploy(owner, "sticky_web", 0).await.unwrap();

        let err = traps.deploy(owner, "catapult", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(h.economy.balance(owner).await.unwrap(), dec!(900));
    }

    #[tokio::test]
    async fn unknown_type_and_missing_plot() {
        let h = harness();
        let (allocator, traps) = service(&h);
        let owner = owner_at_level(&h, &allocator, 2).await;
        assert!(matches!(
            traps.deploy(owner, "moat", 0).await,
            Err(FarmError::UnknownTrapType(_))
        ));
        assert!(matches!(
            traps.deploy(PlayerId::new(), "catapult", 0).await,
            Err(FarmError::NoPlot(_))
        ));
    }

    #[tokio::test]
    async fn failed_write_refunds() {
        let h = harness();
        let (allocator, traps) = service(&h);
        let owner = owner_at_level(&h, &allocator, 2).await;
        h.store.set_fail_writes(true);

        let err = traps.deploy(owner, "catapult", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(h.economy.balance(owner).await.unwrap(), dec!(1000));
    }

    #[tokio::test]
    async fn remove_frees_the_slot() {
        let h = harness();
        let (allocator, traps) = service(&h);
        let owner = owner_at_level(&h, &allocator, 2).await;
        let trap = traps.deploy(owner, "sticky_web", 0).await.unwrap();

        traps.remove(owner, 0).await.unwrap();
        assert!(traps.deployed(trap.plot_id).await.unwrap().is_empty());
        assert!(matches!(
            traps.remove(owner, 0).await,
            Err(FarmError::SlotEmpty(0))
        ));
    }
}
