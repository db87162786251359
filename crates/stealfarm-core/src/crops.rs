//! Planting, harvesting and growth acceleration.
//!
//! Every operation that removes or rewrites a crop holds that crop's lock
//! from [`FarmContext::crop_locks`], so an owner's harvest and a thief's
//! theft of the same crop never interleave.

use std::sync::Arc;

use stealfarm_types::{
    AccelerateReason, CropId, CropInstance, FarmEvent, PlayerId, StatisticKind, WaterCooldown,
};
use stealfarm_world::{contains, growth};
use tracing::{debug, info};

use crate::allocator::PlotAllocator;
use crate::context::FarmContext;
use crate::error::FarmError;
use crate::levels::BASE_LEVEL;

/// Result of an owner harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    /// The crop as it was before removal.
    pub crop: CropInstance,
    /// Items granted. Zero when the crop was removed before maturity.
    pub amount: u32,
    /// The crop planted in its place, if replanting was requested.
    pub replanted: Option<CropInstance>,
}

/// Growth snapshot of one crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropStatus {
    /// Current stage index.
    pub stage: usize,
    /// `true` once the last stage is reached.
    pub mature: bool,
    /// Milliseconds until maturity, zero when mature.
    pub remaining_ms: i64,
}

/// Owner and friend interactions with crops.
#[derive(Debug)]
pub struct CropService {
    ctx: FarmContext,
    allocator: Arc<PlotAllocator>,
}

impl CropService {
    /// Create the service.
    pub const fn new(ctx: FarmContext, allocator: Arc<PlotAllocator>) -> Self {
        Self { ctx, allocator }
    }

    /// Plant `crop_type` at a block on the owner's plot.
    pub async fn plant(
        &self,
        owner: PlayerId,
        crop_type: &str,
        world_id: &str,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<CropInstance, FarmError> {
        self.ctx.crop_def(crop_type)?;
        let plot = self
            .allocator
            .plot_of(owner)
            .await
            .ok_or(FarmError::NoPlot(owner))?;
        if !contains(world_id, x, z, &plot) {
            return Err(FarmError::NotOnPlot {
                owner,
                world_id: world_id.to_owned(),
                x,
                z,
            });
        }
        let occupied = || FarmError::PositionOccupied {
            world_id: world_id.to_owned(),
            x,
            y,
            z,
        };
        if self.ctx.store.crop_at(world_id, x, y, z).await?.is_some() {
            return Err(occupied());
        }

        let crop = CropInstance {
            id: CropId::new(),
            crop_type: crop_type.to_owned(),
            plot_id: plot.id,
            owner_id: owner,
            world_id: world_id.to_owned(),
            x,
            y,
            z,
            planted_at: self.ctx.now(),
        };
        match self.ctx.store.insert_crop(&crop).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => return Err(occupied()),
            Err(e) => return Err(e.into()),
        }

        info!(owner = %owner, crop_id = %crop.id, crop_type, x, y, z, "Crop planted");
        self.ctx.emit(FarmEvent::CropPlanted { crop: crop.clone() });
        Ok(crop)
    }

    /// Plant whatever crop grows from `seed_item`.
    pub async fn plant_seed(
        &self,
        owner: PlayerId,
        seed_item: &str,
        world_id: &str,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<CropInstance, FarmError> {
        let crop_type = self
            .ctx
            .crops
            .by_seed(seed_item)
            .map(|d| d.id.clone())
            .ok_or_else(|| FarmError::UnknownCropType(seed_item.to_owned()))?;
        self.plant(owner, &crop_type, world_id, x, y, z).await
    }

    /// Remove one of the owner's crops.
    ///
    /// A mature crop yields a fresh random amount of its harvest item. An
    /// immature crop is removed without yield.
    pub async fn harvest(&self, owner: PlayerId, crop_id: CropId) -> Result<Harvest, FarmError> {
        let _guard = self.ctx.crop_locks.lock(&crop_id).await;
        self.harvest_locked(owner, crop_id).await
    }

    /// Harvest a mature crop and plant the same type in its place.
    pub async fn harvest_and_replant(
        &self,
        owner: PlayerId,
        crop_id: CropId,
    ) -> Result<Harvest, FarmError> {
        let mut harvest = {
            let _guard = self.ctx.crop_locks.lock(&crop_id).await;
            let crop = self.owned_crop(owner, crop_id).await?;
            let def = self.ctx.crop_def(&crop.crop_type)?;
            if !growth::is_mature(&crop, def, self.ctx.now()) {
                return Err(FarmError::NotMature(crop_id));
            }
            self.harvest_locked(owner, crop_id).await?
        };
        let c = &harvest.crop;
        harvest.replanted = Some(
            self.plant(owner, &c.crop_type, &c.world_id, c.x, c.y, c.z)
                .await?,
        );
        Ok(harvest)
    }

    /// Harvest every mature crop on the owner's plot when their level has
    /// auto-harvest unlocked. Returns the number of crops harvested.
    pub async fn auto_harvest(&self, owner: PlayerId) -> Result<usize, FarmError> {
        let level = self
            .ctx
            .store
            .farm_level(owner)
            .await?
            .unwrap_or(BASE_LEVEL);
        if !self.ctx.levels.auto_harvest_unlocked(level) {
            return Ok(0);
        }
        let Some(plot) = self.allocator.plot_of(owner).await else {
            return Ok(0);
        };

        let now = self.ctx.now();
        let mut harvested = 0_usize;
        for crop in self.ctx.store.crops_on_plot(plot.id).await? {
            let Ok(def) = self.ctx.crop_def(&crop.crop_type) else {
                continue;
            };
            if !growth::is_mature(&crop, def, now) {
                continue;
            }
            let _guard = self.ctx.crop_locks.lock(&crop.id).await;
            match self.harvest_locked(owner, crop.id).await {
                Ok(_) => harvested = harvested.saturating_add(1),
                Err(FarmError::CropNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if harvested > 0 {
            info!(owner = %owner, harvested, "Auto-harvest stored crops");
        }
        Ok(harvested)
    }

    /// Skip an immature crop ahead by the fertilizer amount.
    pub async fn fertilize(&self, owner: PlayerId, crop_id: CropId) -> Result<usize, FarmError> {
        let _guard = self.ctx.crop_locks.lock(&crop_id).await;
        let crop = self.owned_crop(owner, crop_id).await?;
        self.accelerate(
            &crop,
            self.ctx.config.growth.fertilizer_acceleration_ms,
            AccelerateReason::Fertilizer,
        )
        .await
    }

    /// A friend waters someone else's immature crop.
    ///
    /// Each waterer may water a given owner's crops once per water
    /// cooldown. Returns the crop's stage afterwards.
    pub async fn water(&self, waterer: PlayerId, crop_id: CropId) -> Result<usize, FarmError> {
        let _guard = self.ctx.crop_locks.lock(&crop_id).await;
        let crop = self
            .ctx
            .store
            .crop_by_id(crop_id)
            .await?
            .ok_or(FarmError::CropNotFound(crop_id))?;
        let owner = crop.owner_id;
        if owner == waterer {
            return Err(FarmError::OwnCrop(waterer));
        }
        let def = self.ctx.crop_def(&crop.crop_type)?;
        let now = self.ctx.now();
        if growth::is_mature(&crop, def, now) {
            return Err(FarmError::AlreadyMature(crop_id));
        }
        if !self.ctx.store.are_friends(waterer, owner).await? {
            return Err(FarmError::NotFriends {
                a: waterer,
                b: owner,
            });
        }
        if let Some(cooldown) = self.ctx.store.water_cooldown(waterer, owner).await? {
            if cooldown.ends_at > now {
                return Err(FarmError::WaterOnCooldown {
                    remaining_ms: cooldown.ends_at.saturating_sub(now),
                });
            }
        }

        let growth_cfg = &self.ctx.config.growth;
        let new_stage = self
            .accelerate(&crop, growth_cfg.water_acceleration_ms, AccelerateReason::Watering)
            .await?;
        self.ctx
            .store
            .set_water_cooldown(&WaterCooldown {
                waterer_id: waterer,
                owner_id: owner,
                ends_at: now.saturating_add(growth_cfg.water_cooldown_ms),
            })
            .await?;

        info!(waterer = %waterer, owner = %owner, crop_id = %crop_id, new_stage, "Crop watered");
        self.ctx.emit(FarmEvent::CropWatered {
            waterer_id: waterer,
            owner_id: owner,
            crop_id,
            new_stage,
        });
        Ok(new_stage)
    }

    /// Growth snapshot of a crop.
    pub async fn status(&self, crop_id: CropId) -> Result<CropStatus, FarmError> {
        let crop = self
            .ctx
            .store
            .crop_by_id(crop_id)
            .await?
            .ok_or(FarmError::CropNotFound(crop_id))?;
        let def = self.ctx.crop_def(&crop.crop_type)?;
        let now = self.ctx.now();
        Ok(CropStatus {
            stage: growth::stage(&crop, def, now),
            mature: growth::is_mature(&crop, def, now),
            remaining_ms: growth::time_to_maturity_ms(&crop, def, now),
        })
    }

    /// Current stage index of a crop.
    pub async fn stage_of(&self, crop_id: CropId) -> Result<usize, FarmError> {
        Ok(self.status(crop_id).await?.stage)
    }

    // -----------------------------------------------------------------------
    // Internals. Callers hold the crop lock.
    // -----------------------------------------------------------------------

    async fn owned_crop(&self, owner: PlayerId, crop_id: CropId) -> Result<CropInstance, FarmError> {
        let crop = self
            .ctx
            .store
            .crop_by_id(crop_id)
            .await?
            .ok_or(FarmError::CropNotFound(crop_id))?;
        if crop.owner_id != owner {
            return Err(FarmError::NotOwner {
                player: owner,
                crop: crop_id,
            });
        }
        Ok(crop)
    }

    async fn harvest_locked(&self, owner: PlayerId, crop_id: CropId) -> Result<Harvest, FarmError> {
        let crop = self.owned_crop(owner, crop_id).await?;
        let def = self.ctx.crop_def(&crop.crop_type)?;
        let amount = if growth::is_mature(&crop, def, self.ctx.now()) {
            self.ctx.with_rng(|rng| growth::harvest_amount(def, rng))
        } else {
            0
        };

        if !self.ctx.store.delete_crop(crop_id).await? {
            return Err(FarmError::CropNotFound(crop_id));
        }
        if amount > 0 {
            self.ctx
                .store
                .add_stat(owner, StatisticKind::TotalHarvest, u64::from(amount))
                .await?;
            self.ctx.inventory.deliver(owner, &def.harvest_item, amount);
        }

        info!(owner = %owner, crop_id = %crop_id, amount, "Crop harvested");
        self.ctx.emit(FarmEvent::CropHarvested {
            crop: crop.clone(),
            amount,
        });
        Ok(Harvest {
            crop,
            amount,
            replanted: None,
        })
    }

    /// Move `crop` back by `delta_ms`, persist, and report the new stage.
    async fn accelerate(
        &self,
        crop: &CropInstance,
        delta_ms: i64,
        reason: AccelerateReason,
    ) -> Result<usize, FarmError> {
        let def = self.ctx.crop_def(&crop.crop_type)?;
        let now = self.ctx.now();
        if growth::is_mature(crop, def, now) {
            return Err(FarmError::AlreadyMature(crop.id));
        }
        let old_stage = growth::stage(crop, def, now);
        let sped = growth::accelerate(crop, delta_ms);
        self.ctx
            .store
            .update_planted_at(crop.id, sped.planted_at)
            .await?;
        let new_stage = growth::stage(&sped, def, now);

        debug!(crop_id = %crop.id, old_stage, new_stage, ?reason, "Crop growth accelerated");
        if new_stage != old_stage {
            self.ctx.emit(FarmEvent::CropGrowthAccelerated {
                crop_id: crop.id,
                old_stage,
                new_stage,
                reason,
            });
        }
        Ok(new_stage)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_db::FarmStore;

    use super::*;
    use crate::context::testing::{Harness, harness};
    use crate::error::ErrorKind;

    struct Farm {
        h: Harness,
        crops: CropService,
        owner: PlayerId,
    }

    async fn farm() -> Farm {
        let h = harness();
        let allocator = Arc::new(PlotAllocator::new(h.ctx.clone()));
        let owner = PlayerId::new();
        allocator.allocate(owner).await.unwrap();
        let crops = CropService::new(h.ctx.clone(), allocator);
        Farm { h, crops, owner }
    }

    #[tokio::test]
    async fn plant_checks_plot_and_position() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 3, 65, -2).await.unwrap();
        assert_eq!(crop.planted_at, 0);

        let err = f.crops.plant(f.owner, "wheat", "farm_world", 3, 65, -2).await.unwrap_err();
        assert!(matches!(err, FarmError::PositionOccupied { .. }));
        let err = f.crops.plant(f.owner, "wheat", "farm_world", 17, 65, 0).await.unwrap_err();
        assert!(matches!(err, FarmError::NotOnPlot { .. }));
        let err = f.crops.plant(f.owner, "wheat", "nether", 0, 65, 0).await.unwrap_err();
        assert!(matches!(err, FarmError::NotOnPlot { .. }));
        let err = f.crops.plant(PlayerId::new(), "wheat", "farm_world", 0, 65, 0).await.unwrap_err();
        assert!(matches!(err, FarmError::NoPlot(_)));
        let err = f.crops.plant(f.owner, "mandrake", "farm_world", 0, 65, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn plant_seed_resolves_the_crop_type() {
        let f = farm().await;
        let crop = f.crops.plant_seed(f.owner, "CARROT", "farm_world", 0, 65, 0).await.unwrap();
        assert_eq!(crop.crop_type, "carrot");
        assert!(f.crops.plant_seed(f.owner, "DIRT", "farm_world", 1, 65, 0).await.is_err());
    }

    #[tokio::test]
    async fn mature_harvest_yields_and_counts() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        f.h.clock.set(130_000);

        let harvest = f.crops.harvest(f.owner, crop.id).await.unwrap();
        assert!((1..=3).contains(&harvest.amount));
        assert_eq!(
            f.h.inventory.total(f.owner, "WHEAT"),
            u64::from(harvest.amount)
        );
        assert_eq!(
            f.h.store.stats(f.owner).await.unwrap().total_harvest,
            u64::from(harvest.amount)
        );
        assert!(f.h.store.crop_by_id(crop.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn immature_harvest_removes_without_yield() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        f.h.clock.set(10_000);

        let harvest = f.crops.harvest(f.owner, crop.id).await.unwrap();
        assert_eq!(harvest.amount, 0);
        assert!(f.h.inventory.deliveries().is_empty());
        assert!(matches!(
            f.crops.harvest(f.owner, crop.id).await,
            Err(FarmError::CropNotFound(_))
        ));
    }

    #[tokio::test]
    async fn harvest_of_foreign_crop_is_refused() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        let err = f.crops.harvest(PlayerId::new(), crop.id).await.unwrap_err();
        assert!(matches!(err, FarmError::NotOwner { .. }));
    }

    #[tokio::test]
    async fn replant_puts_a_fresh_crop_in_place() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        assert!(matches!(
            f.crops.harvest_and_replant(f.owner, crop.id).await,
            Err(FarmError::NotMature(_))
        ));

        f.h.clock.set(200_000);
        let harvest = f.crops.harvest_and_replant(f.owner, crop.id).await.unwrap();
        let fresh = harvest.replanted.unwrap();
        assert_ne!(fresh.id, crop.id);
        assert_eq!((fresh.x, fresh.y, fresh.z), (0, 65, 0));
        assert_eq!(fresh.planted_at, 200_000);
    }

    #[tokio::test]
    async fn fertilizer_advances_one_stage() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        f.h.clock.set(1_000);

        assert_eq!(f.crops.fertilize(f.owner, crop.id).await.unwrap(), 1);
        assert_eq!(
            f.h.store.crop_by_id(crop.id).await.unwrap().unwrap().planted_at,
            -60_000
        );
        assert!(f.h.events.names().contains(&"crop_growth_accelerated"));

        assert_eq!(f.crops.fertilize(f.owner, crop.id).await.unwrap(), 2);
        assert!(matches!(
            f.crops.fertilize(f.owner, crop.id).await,
            Err(FarmError::AlreadyMature(_))
        ));
    }

    #[tokio::test]
    async fn watering_needs_friendship_and_respects_cooldown() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "carrot", "farm_world", 0, 65, 0).await.unwrap();
        let friend = PlayerId::new();

        assert!(matches!(
            f.crops.water(f.owner, crop.id).await,
            Err(FarmError::OwnCrop(_))
        ));
        assert!(matches!(
            f.crops.water(friend, crop.id).await,
            Err(FarmError::NotFriends { .. })
        ));

        f.h.store.add_friend(friend, f.owner).await.unwrap();
        assert_eq!(f.crops.water(friend, crop.id).await.unwrap(), 1);

        f.h.clock.advance(1_000);
        let err = f.crops.water(friend, crop.id).await.unwrap_err();
        assert!(matches!(err, FarmError::WaterOnCooldown { remaining_ms: 3_599_000 }));

        f.h.clock.advance(3_599_000);
        assert!(matches!(
            f.crops.water(friend, crop.id).await,
            Err(FarmError::AlreadyMature(_))
        ));
        let fresh = f.crops.plant(f.owner, "carrot", "farm_world", 1, 65, 0).await.unwrap();
        assert_eq!(f.crops.water(friend, fresh.id).await.unwrap(), 1);
        assert!(f.h.events.names().contains(&"crop_watered"));
    }

    #[tokio::test]
    async fn status_reports_remaining_time() {
        let f = farm().await;
        let crop = f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        f.h.clock.set(70_000);

        let status = f.crops.status(crop.id).await.unwrap();
        assert_eq!(status.stage, 1);
        assert!(!status.mature);
        assert_eq!(status.remaining_ms, 50_000);
        assert_eq!(f.crops.stage_of(crop.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn auto_harvest_requires_unlocked_level() {
        let f = farm().await;
        f.crops.plant(f.owner, "wheat", "farm_world", 0, 65, 0).await.unwrap();
        f.crops.plant(f.owner, "wheat", "farm_world", 1, 65, 0).await.unwrap();
        f.crops.plant(f.owner, "carrot", "farm_world", 2, 65, 0).await.unwrap();
        f.h.clock.set(130_000);

        assert_eq!(f.crops.auto_harvest(f.owner).await.unwrap(), 0);

        f.h.store.set_farm_level(f.owner, 4).await.unwrap();
        assert_eq!(f.crops.auto_harvest(f.owner).await.unwrap(), 2);
        let plot = f.h.store.plot_by_owner(f.owner).await.unwrap().unwrap();
        assert_eq!(f.h.store.crops_on_plot(plot.id).await.unwrap().len(), 1);
    }
}
