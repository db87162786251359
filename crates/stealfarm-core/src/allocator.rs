//! Plot allocation service.
//!
//! [`PlotAllocator`] owns the in-memory [`OccupancyIndex`] and is the only
//! writer of plot geometry. One async mutex guards the index for the whole
//! read-compute-persist-register sequence, so two first-time players can
//! never receive the same grid cell.
//!
//! Storage is always written first. The index only changes after the store
//! accepted the write, so a failed write leaves the index untouched.

use stealfarm_types::{FarmEvent, PlayerId, Plot, PlotId};
use stealfarm_world::{OccupancyIndex, PlotGeometry, contains};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::context::FarmContext;
use crate::error::FarmError;

/// How many store conflicts one allocation tolerates before giving up.
const MAX_ALLOCATION_ATTEMPTS: usize = 8;

/// Assigns grid cells to owners and maintains plot bounds.
#[derive(Debug)]
pub struct PlotAllocator {
    ctx: FarmContext,
    geometry: PlotGeometry,
    index: Mutex<OccupancyIndex>,
}

impl PlotAllocator {
    /// Create an allocator with an empty index. Call [`load`](Self::load)
    /// before serving players.
    pub fn new(ctx: FarmContext) -> Self {
        let geometry = ctx.geometry();
        Self {
            ctx,
            geometry,
            index: Mutex::new(OccupancyIndex::new()),
        }
    }

    /// Rebuild the index from every persisted plot. Returns the plot count.
    pub async fn load(&self) -> Result<usize, FarmError> {
        let plots = self.ctx.store.list_plots().await?;
        let rebuilt = OccupancyIndex::from_plots(plots)?;
        let count = rebuilt.len();
        *self.index.lock().await = rebuilt;
        info!(plots = count, "Plot index loaded");
        Ok(count)
    }

    /// Give `owner` their first plot.
    ///
    /// The cell is the next point of the spiral walk. If the store rejects
    /// the insert as a conflict, another writer touched the table; the index
    /// is rebuilt from storage and the walk retried a bounded number of
    /// times.
    pub async fn allocate(&self, owner: PlayerId) -> Result<Plot, FarmError> {
        let mut index = self.index.lock().await;
        if index.plot_of(owner).is_some() {
            return Err(FarmError::AlreadyOwnsPlot(owner));
        }

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let cell = index.next_free_cell(self.ctx.config.plot.max_probe)?;
            let plot = self.geometry.new_plot(
                PlotId::new(),
                owner,
                &self.ctx.config.plot.world_id,
                cell,
            )?;

            match self.ctx.store.insert_plot(&plot).await {
                Ok(_) => {
                    index.insert(plot.clone())?;
                    info!(
                        owner = %owner,
                        plot_id = %plot.id,
                        grid_x = cell.x,
                        grid_z = cell.z,
                        "Plot allocated"
                    );
                    self.ctx.emit(FarmEvent::PlotAllocated {
                        owner_id: owner,
                        plot: plot.clone(),
                    });
                    return Ok(plot);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, x = cell.x, z = cell.z, error = %e, "Plot insert conflicted");
                    *index = OccupancyIndex::from_plots(self.ctx.store.list_plots().await?)?;
                    if index.plot_of(owner).is_some() {
                        return Err(FarmError::AlreadyOwnsPlot(owner));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(FarmError::ResourceExhausted(format!(
            "no free grid cell after {MAX_ALLOCATION_ATTEMPTS} attempts"
        )))
    }

    /// Grow a plot's half-width by `size_increase` around its center.
    ///
    /// A zero increase returns the plot unchanged without writing.
    pub async fn expand(&self, plot_id: PlotId, size_increase: i32) -> Result<Plot, FarmError> {
        let mut index = self.index.lock().await;
        let current = index
            .plot(plot_id)
            .cloned()
            .ok_or(FarmError::PlotNotFound(plot_id))?;
        let grown = self.geometry.expanded(&current, size_increase)?;
        if size_increase == 0 {
            return Ok(grown);
        }

        self.ctx.store.update_plot_bounds(&grown).await?;
        index.update(grown.clone())?;
        info!(plot_id = %plot_id, old_size = current.size, new_size = grown.size, "Plot expanded");
        self.ctx.emit(FarmEvent::PlotExpanded {
            plot: grown.clone(),
            old_size: current.size,
            new_size: grown.size,
        });
        Ok(grown)
    }

    /// Restore a plot to the initial size and clear its crops.
    ///
    /// The emitted event carries the bounds before the reset so the world
    /// renderer clears the whole previously used area.
    pub async fn reset(&self, plot_id: PlotId) -> Result<Plot, FarmError> {
        let mut index = self.index.lock().await;
        let current = index
            .plot(plot_id)
            .cloned()
            .ok_or(FarmError::PlotNotFound(plot_id))?;
        let restored = self.geometry.reset(&current)?;

        let crops = self.ctx.store.crops_on_plot(plot_id).await?;
        for crop in &crops {
            self.ctx.store.delete_crop(crop.id).await?;
        }
        self.ctx.store.update_plot_bounds(&restored).await?;
        index.update(restored.clone())?;

        info!(plot_id = %plot_id, crops_cleared = crops.len(), "Plot reset");
        self.ctx.emit(FarmEvent::PlotReset {
            plot: restored.clone(),
            cleared: current.region(),
        });
        Ok(restored)
    }

    /// Remove a plot with its crops and traps and release its grid cell.
    pub async fn delete(&self, plot_id: PlotId) -> Result<Plot, FarmError> {
        let mut index = self.index.lock().await;
        let current = index
            .plot(plot_id)
            .cloned()
            .ok_or(FarmError::PlotNotFound(plot_id))?;

        self.ctx.store.delete_plot(plot_id).await?;
        index.remove(plot_id);

        info!(plot_id = %plot_id, owner = %current.owner_id, "Plot deleted");
        self.ctx.emit(FarmEvent::PlotDeleted {
            plot: current.clone(),
        });
        Ok(current)
    }

    /// Boundary-inclusive test of whether `(x, z)` lies on `plot`.
    pub fn containment(world_id: &str, x: i32, z: i32, plot: &Plot) -> bool {
        contains(world_id, x, z, plot)
    }

    /// The plot containing `(x, z)` in `world_id`, if any.
    pub async fn locate(&self, world_id: &str, x: i32, z: i32) -> Option<Plot> {
        let found = self.index.lock().await.locate(world_id, x, z).cloned();
        debug!(world_id, x, z, found = found.is_some(), "Plot lookup");
        found
    }

    /// The plot owned by `owner`.
    pub async fn plot_of(&self, owner: PlayerId) -> Option<Plot> {
        self.index.lock().await.plot_of(owner).cloned()
    }

    /// Look up a plot by id.
    pub async fn plot(&self, id: PlotId) -> Option<Plot> {
        self.index.lock().await.plot(id).cloned()
    }

    /// Snapshot of every plot.
    pub async fn plots(&self) -> Vec<Plot> {
        self.index.lock().await.plots().cloned().collect()
    }
}
