//! One-call wiring of every farm service over a shared context.

use std::sync::Arc;

use stealfarm_types::{PendingNotice, PlayerId};
use tracing::{debug, info};

use crate::allocator::PlotAllocator;
use crate::context::FarmContext;
use crate::crops::CropService;
use crate::error::FarmError;
use crate::levels::LevelService;
use crate::presence::Presence;
use crate::social::SocialService;
use crate::steal::StealEconomy;
use crate::traps::TrapService;

/// The full service set a host drives.
#[derive(Debug, Clone)]
pub struct FarmServices {
    /// Plot allocation and lookup.
    pub allocator: Arc<PlotAllocator>,
    /// Farm levels and upgrades.
    pub levels: Arc<LevelService>,
    /// Planting, harvest and growth acceleration.
    pub crops: Arc<CropService>,
    /// Trap deployment.
    pub traps: Arc<TrapService>,
    /// Friends and enemies.
    pub social: Arc<SocialService>,
    /// Theft attempts and their bookkeeping.
    pub steal: Arc<StealEconomy>,
    /// Who is connected.
    pub presence: Arc<Presence>,
    ctx: FarmContext,
}

impl FarmServices {
    /// Build every service. The plot index starts empty; call
    /// [`FarmServices::start`] to load it.
    pub fn new(ctx: &FarmContext) -> Self {
        let allocator = Arc::new(PlotAllocator::new(ctx.clone()));
        let levels = Arc::new(LevelService::new(ctx.clone(), Arc::clone(&allocator)));
        Self {
            crops: Arc::new(CropService::new(ctx.clone(), Arc::clone(&allocator))),
            traps: Arc::new(TrapService::new(
                ctx.clone(),
                Arc::clone(&allocator),
                Arc::clone(&levels),
            )),
            social: Arc::new(SocialService::new(ctx.clone())),
            steal: Arc::new(StealEconomy::new(
                ctx.clone(),
                Arc::clone(&allocator),
                Arc::clone(&levels),
            )),
            presence: Arc::new(Presence::new()),
            ctx: ctx.clone(),
            levels,
            allocator,
        }
    }

    /// Rebuild the plot index from the store. Returns the plot count.
    pub async fn start(&self) -> Result<usize, FarmError> {
        let plots = self.allocator.load().await?;
        info!(plots, "Farm services started");
        Ok(plots)
    }

    /// A player connected. Returns the notices queued while they were away,
    /// oldest first.
    pub async fn on_join(&self, player: PlayerId) -> Result<Vec<PendingNotice>, FarmError> {
        self.presence.join(player);
        let notices = self.ctx.store.take_notices(player).await?;
        debug!(player = %player, notices = notices.len(), "Player joined");
        Ok(notices)
    }

    /// A player entered their own farm: run auto-harvest if unlocked.
    pub async fn on_enter_own_farm(&self, player: PlayerId) -> Result<usize, FarmError> {
        self.crops.auto_harvest(player).await
    }

    /// A player left: mark them offline and drop their process-local visit
    /// counters.
    pub fn on_disconnect(&self, player: PlayerId) {
        self.presence.leave(player);
        self.steal.on_disconnect(player);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_db::FarmStore;

    use super::*;
    use crate::context::testing::harness;

    #[tokio::test]
    async fn start_loads_plots_written_by_an_earlier_process() {
        let h = harness();
        let earlier = FarmServices::new(&h.ctx);
        let owner = PlayerId::new();
        earlier.allocator.allocate(owner).await.unwrap();

        let services = FarmServices::new(&h.ctx);
        assert_eq!(services.start().await.unwrap(), 1);
        assert!(services.allocator.plot_of(owner).await.is_some());
        assert_eq!(h.store.list_plots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn services_share_one_plot_index() {
        let h = harness();
        let services = FarmServices::new(&h.ctx);
        let owner = PlayerId::new();
        services.allocator.allocate(owner).await.unwrap();

        let crop = services
            .crops
            .plant(owner, "wheat", "farm_world", 0, 65, 0)
            .await
            .unwrap();
        h.clock.set(200_000);
        h.store.set_farm_level(owner, 4).await.unwrap();
        assert_eq!(services.on_enter_own_farm(owner).await.unwrap(), 1);
        assert!(h.store.crop_by_id(crop.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn join_hands_back_queued_notices_once() {
        let h = harness();
        let services = FarmServices::new(&h.ctx);
        let player = PlayerId::new();
        h.store
            .queue_notice(&PendingNotice {
                recipient: player,
                message: "someone stole 2 wheat".into(),
                created_at: 10,
            })
            .await
            .unwrap();

        let notices = services.on_join(player).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert!(services.presence.is_online(player));
        assert!(services.on_join(player).await.unwrap().is_empty());

        services.on_disconnect(player);
        assert!(!services.presence.is_online(player));
    }
}
