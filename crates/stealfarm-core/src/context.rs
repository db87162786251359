//! Shared handles passed to every service.
//!
//! A [`FarmContext`] is built once at startup and cloned into each service.
//! It replaces process-wide singletons: tests build a fresh context with a
//! [`MemoryStore`](stealfarm_db::MemoryStore), a [`ManualClock`] and a
//! [`RecordingSink`](crate::events::RecordingSink).
//!
//! [`ManualClock`]: crate::clock::ManualClock

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use stealfarm_db::FarmStore;
use stealfarm_types::{CropDefinition, CropId, FarmEvent, TrapDefinition};
use stealfarm_world::{CropCatalog, LevelCatalog, PlotGeometry, TrapCatalog};

use crate::clock::Clock;
use crate::config::FarmConfig;
use crate::economy::{Economy, Inventory};
use crate::error::FarmError;
use crate::events::EventSink;
use crate::locks::KeyedLocks;

/// Collaborators and catalogs shared by the services.
#[derive(Clone)]
pub struct FarmContext {
    /// Validated configuration.
    pub config: Arc<FarmConfig>,
    /// Persistence gateway.
    pub store: Arc<dyn FarmStore>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Event destination.
    pub events: Arc<dyn EventSink>,
    /// Currency ledger.
    pub economy: Arc<dyn Economy>,
    /// Item delivery.
    pub inventory: Arc<dyn Inventory>,
    /// Crop types.
    pub crops: Arc<CropCatalog>,
    /// Trap types.
    pub traps: Arc<TrapCatalog>,
    /// Farm levels.
    pub levels: Arc<LevelCatalog>,
    /// One lock per crop, shared by harvest, watering and theft.
    pub crop_locks: Arc<KeyedLocks<CropId>>,
    rng: Arc<Mutex<StdRng>>,
}

impl std::fmt::Debug for FarmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FarmContext")
            .field("crops", &self.crops.len())
            .field("world_id", &self.config.plot.world_id)
            .finish_non_exhaustive()
    }
}

impl FarmContext {
    /// Validate the catalogs in `config` and bundle the collaborators.
    ///
    /// Yields and trap rolls use `steal.rng-seed` when set, so a seeded
    /// farm replays identically.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::World`] if a catalog violates its invariants.
    pub fn new(
        config: FarmConfig,
        store: Arc<dyn FarmStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        economy: Arc<dyn Economy>,
        inventory: Arc<dyn Inventory>,
    ) -> Result<Self, FarmError> {
        let crops = CropCatalog::new(config.crops.iter().cloned())?;
        let traps = TrapCatalog::new(config.traps.iter().cloned())?;
        let levels = LevelCatalog::new(config.levels.iter().cloned())?;
        let rng = config
            .steal
            .rng_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            config: Arc::new(config),
            store,
            clock,
            events,
            economy,
            inventory,
            crops: Arc::new(crops),
            traps: Arc::new(traps),
            levels: Arc::new(levels),
            crop_locks: Arc::new(KeyedLocks::new()),
            rng: Arc::new(Mutex::new(rng)),
        })
    }

    /// Current time in epoch milliseconds.
    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Plot geometry from the configuration.
    pub fn geometry(&self) -> PlotGeometry {
        PlotGeometry::new(
            self.config.plot.grid_spacing,
            self.config.plot.initial_plot_size,
        )
    }

    /// Publish one event.
    pub fn emit(&self, event: FarmEvent) {
        self.events.publish(event);
    }

    /// Definition for a crop type.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::UnknownCropType`] if the type is not configured.
    pub fn crop_def(&self, crop_type: &str) -> Result<&CropDefinition, FarmError> {
        self.crops
            .get(crop_type)
            .ok_or_else(|| FarmError::UnknownCropType(crop_type.to_owned()))
    }

    /// Definition for a trap type.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::UnknownTrapType`] if the type is not configured.
    pub fn trap_def(&self, trap_type: &str) -> Result<&TrapDefinition, FarmError> {
        self.traps
            .get(trap_type)
            .ok_or_else(|| FarmError::UnknownTrapType(trap_type.to_owned()))
    }

    /// Run `f` with exclusive access to the shared generator.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Context wiring shared by the service tests.

    use std::sync::Arc;

    use stealfarm_db::MemoryStore;

    use super::FarmContext;
    use crate::clock::ManualClock;
    use crate::config::FarmConfig;
    use crate::economy::{MemoryEconomy, RecordingInventory};
    use crate::events::RecordingSink;

    /// A context over in-memory collaborators, with handles kept for
    /// assertions.
    pub(crate) struct Harness {
        pub ctx: FarmContext,
        pub store: Arc<MemoryStore>,
        pub clock: Arc<ManualClock>,
        pub events: Arc<RecordingSink>,
        pub economy: Arc<MemoryEconomy>,
        pub inventory: Arc<RecordingInventory>,
    }

    #[allow(clippy::unwrap_used)]
    pub(crate) fn harness_with(mut config: FarmConfig) -> Harness {
        config.steal.rng_seed.get_or_insert(42);
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let events = Arc::new(RecordingSink::new());
        let economy = Arc::new(MemoryEconomy::new());
        let inventory = Arc::new(RecordingInventory::new());
        let ctx = FarmContext::new(
            config,
            store.clone(),
            clock.clone(),
            events.clone(),
            economy.clone(),
            inventory.clone(),
        )
        .unwrap();
        Harness {
            ctx,
            store,
            clock,
            events,
            economy,
            inventory,
        }
    }

    pub(crate) fn harness() -> Harness {
        harness_with(FarmConfig::default())
    }
}
