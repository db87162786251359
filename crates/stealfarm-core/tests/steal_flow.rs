//! End-to-end steal scenario over in-memory collaborators.
//!
//! Two players join, one plants wheat, the other steals it once it is
//! mature. Checks the grid placement, the outcome, the enemy mark, the
//! published event and the visit counter together.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;

use stealfarm_core::allocator::PlotAllocator;
use stealfarm_core::clock::ManualClock;
use stealfarm_core::economy::{MemoryEconomy, RecordingInventory};
use stealfarm_core::events::RecordingSink;
use stealfarm_core::{
    Actor, CropService, FarmConfig, FarmContext, LevelService, SocialService, StealEconomy,
    StealOutcome,
};
use stealfarm_db::MemoryStore;
use stealfarm_types::{FarmEvent, PlayerId};

struct World {
    allocator: Arc<PlotAllocator>,
    crops: CropService,
    social: SocialService,
    steal: StealEconomy,
    clock: Arc<ManualClock>,
    events: Arc<RecordingSink>,
    inventory: Arc<RecordingInventory>,
}

fn world() -> World {
    let mut config = FarmConfig::default();
    config.steal.rng_seed = Some(7);
    let clock = Arc::new(ManualClock::new(0));
    let events = Arc::new(RecordingSink::new());
    let inventory = Arc::new(RecordingInventory::new());
    let ctx = FarmContext::new(
        config,
        Arc::new(MemoryStore::new()),
        clock.clone(),
        events.clone(),
        Arc::new(MemoryEconomy::new()),
        inventory.clone(),
    )
    .unwrap();

    let allocator = Arc::new(PlotAllocator::new(ctx.clone()));
    let levels = Arc::new(LevelService::new(ctx.clone(), Arc::clone(&allocator)));
    World {
        crops: CropService::new(ctx.clone(), Arc::clone(&allocator)),
        social: SocialService::new(ctx.clone()),
        steal: StealEconomy::new(ctx, Arc::clone(&allocator), levels),
        allocator,
        clock,
        events,
        inventory,
    }
}

#[tokio::test]
async fn b_steals_mature_wheat_from_a() {
    let w = world();
    let (a, b) = (PlayerId::new(), PlayerId::new());

    let plot_a = w.allocator.allocate(a).await.unwrap();
    let plot_b = w.allocator.allocate(b).await.unwrap();
    assert_eq!((plot_a.grid_x, plot_a.grid_z), (0, 0));
    assert_eq!((plot_b.grid_x, plot_b.grid_z), (1, 0));

    let wheat = w
        .crops
        .plant(a, "wheat", "farm_world", 2, 65, 3)
        .await
        .unwrap();

    w.clock.set(10_000);
    assert_eq!(
        w.steal.attempt_steal(&Actor::new(b), a, wheat.id).await.unwrap(),
        StealOutcome::NotMature
    );

    w.clock.set(190_000);
    let outcome = w.steal.attempt_steal(&Actor::new(b), a, wheat.id).await.unwrap();
    let StealOutcome::Success {
        amount, crop_type, ..
    } = &outcome
    else {
        panic!("theft failed: {outcome:?}");
    };
    let amount = *amount;
    assert!((1..=3).contains(&amount));
    assert_eq!(crop_type, "wheat");
    assert_eq!(w.inventory.total(b, "WHEAT"), u64::from(amount));

    let enemies = w.social.enemies_of(a).await.unwrap();
    assert_eq!(enemies.len(), 1);
    assert_eq!(enemies[0].thief_id, b);

    let stolen = w.events.events().into_iter().find_map(|e| match e {
        FarmEvent::CropStolen {
            thief_id,
            victim_id,
            amount,
            ..
        } => Some((thief_id, victim_id, amount)),
        _ => None,
    });
    assert_eq!(stolen, Some((b, a, amount)));
    assert_eq!(w.steal.visit_count(b, a), 1);
}
