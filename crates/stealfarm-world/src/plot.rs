//! Plot allocation geometry: the spiral grid walk, bounds arithmetic, and
//! the in-memory occupancy index.
//!
//! Plots live on an unbounded integer grid. The n-th plot ever allocated
//! takes the n-th cell of an outward square spiral around the origin, so
//! allocation order alone decides placement. Each cell maps to world
//! coordinates through `grid_spacing`, and a plot covers
//! `center - size ..= center + size` on both axes.

use std::collections::HashMap;

use stealfarm_types::{GridCell, PlayerId, Plot, PlotId};
use tracing::warn;

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Spiral walk
// ---------------------------------------------------------------------------

/// Iterator over the outward square spiral starting at `(0, 0)`.
///
/// Sides run east, north, west, south and lengthen by one every two
/// turns, so the walk never revisits a cell. The first nine cells are
/// `(0,0) (1,0) (1,1) (0,1) (-1,1) (-1,0) (-1,-1) (0,-1) (1,-1)`.
#[derive(Debug, Clone)]
pub struct SpiralWalk {
    x: i32,
    z: i32,
    dx: i32,
    dz: i32,
    segment_len: u32,
    segment_passed: u32,
    turns: u32,
    started: bool,
}

impl SpiralWalk {
    /// Start a walk at the grid origin heading east.
    pub const fn new() -> Self {
        Self {
            x: 0,
            z: 0,
            dx: 1,
            dz: 0,
            segment_len: 1,
            segment_passed: 0,
            turns: 0,
            started: false,
        }
    }

    fn step(&mut self) -> Option<GridCell> {
        self.x = self.x.checked_add(self.dx)?;
        self.z = self.z.checked_add(self.dz)?;
        self.segment_passed = self.segment_passed.checked_add(1)?;
        if self.segment_passed == self.segment_len {
            self.segment_passed = 0;
            let turned_dx = self.dz.checked_neg()?;
            self.dz = self.dx;
            self.dx = turned_dx;
            self.turns = self.turns.checked_add(1)?;
            if self.turns & 1 == 0 {
                self.segment_len = self.segment_len.checked_add(1)?;
            }
        }
        Some(GridCell::new(self.x, self.z))
    }
}

impl Default for SpiralWalk {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for SpiralWalk {
    type Item = GridCell;

    fn next(&mut self) -> Option<GridCell> {
        if !self.started {
            self.started = true;
            return Some(GridCell::new(self.x, self.z));
        }
        self.step()
    }
}

/// The grid cell for allocation index `n`.
///
/// Returns `None` only if the walk would leave the `i32` range.
pub fn spiral_point(n: usize) -> Option<GridCell> {
    SpiralWalk::new().nth(n)
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Inclusive world-space bounds of a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Inclusive lower X.
    pub min_x: i32,
    /// Inclusive lower Z.
    pub min_z: i32,
    /// Inclusive upper X.
    pub max_x: i32,
    /// Inclusive upper Z.
    pub max_z: i32,
}

/// Maps grid cells to world-space bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotGeometry {
    /// World blocks between adjacent grid cell centers.
    pub grid_spacing: i32,
    /// Half-width given to new and reset plots.
    pub initial_size: i32,
}

impl PlotGeometry {
    /// Create a geometry from spacing and initial half-width.
    pub const fn new(grid_spacing: i32, initial_size: i32) -> Self {
        Self {
            grid_spacing,
            initial_size,
        }
    }

    /// World coordinates of a cell's center.
    pub const fn center(&self, cell: GridCell) -> Result<(i32, i32), WorldError> {
        let Some(cx) = cell.x.checked_mul(self.grid_spacing) else {
            return Err(WorldError::ArithmeticOverflow);
        };
        let Some(cz) = cell.z.checked_mul(self.grid_spacing) else {
            return Err(WorldError::ArithmeticOverflow);
        };
        Ok((cx, cz))
    }

    /// Bounds of a plot with half-width `size` centered on `cell`.
    pub fn bounds(&self, cell: GridCell, size: i32) -> Result<Bounds, WorldError> {
        let (cx, cz) = self.center(cell)?;
        Ok(Bounds {
            min_x: cx.checked_sub(size).ok_or(WorldError::ArithmeticOverflow)?,
            min_z: cz.checked_sub(size).ok_or(WorldError::ArithmeticOverflow)?,
            max_x: cx.checked_add(size).ok_or(WorldError::ArithmeticOverflow)?,
            max_z: cz.checked_add(size).ok_or(WorldError::ArithmeticOverflow)?,
        })
    }

    /// A fresh plot at the initial size. The caller supplies the identity.
    pub fn new_plot(
        &self,
        id: PlotId,
        owner_id: PlayerId,
        world_id: &str,
        cell: GridCell,
    ) -> Result<Plot, WorldError> {
        let b = self.bounds(cell, self.initial_size)?;
        Ok(Plot {
            id,
            owner_id,
            grid_x: cell.x,
            grid_z: cell.z,
            world_id: world_id.to_owned(),
            min_x: b.min_x,
            min_z: b.min_z,
            max_x: b.max_x,
            max_z: b.max_z,
            size: self.initial_size,
        })
    }

    /// Largest half-width that keeps a plot clear of its grid neighbours.
    pub fn max_size(&self) -> i32 {
        self.grid_spacing
            .saturating_sub(1)
            .checked_div(2)
            .unwrap_or(0)
    }

    /// A copy of `plot` resized to `size` around its unchanged center.
    ///
    /// Sizes above [`PlotGeometry::max_size`] are rejected: the plot would
    /// share blocks with the plot in the next cell.
    pub fn resized(&self, plot: &Plot, size: i32) -> Result<Plot, WorldError> {
        let max = self.max_size();
        if size > max {
            return Err(WorldError::PlotTooLarge { size, max });
        }
        let b = self.bounds(plot.grid_cell(), size)?;
        Ok(Plot {
            min_x: b.min_x,
            min_z: b.min_z,
            max_x: b.max_x,
            max_z: b.max_z,
            size,
            ..plot.clone()
        })
    }

    /// A copy of `plot` grown by `increase`. Zero returns an identical plot.
    pub fn expanded(&self, plot: &Plot, increase: i32) -> Result<Plot, WorldError> {
        if increase < 0 {
            return Err(WorldError::NegativeExpansion(increase));
        }
        let size = plot
            .size
            .checked_add(increase)
            .ok_or(WorldError::ArithmeticOverflow)?;
        self.resized(plot, size)
    }

    /// A copy of `plot` restored to the initial size.
    pub fn reset(&self, plot: &Plot) -> Result<Plot, WorldError> {
        self.resized(plot, self.initial_size)
    }
}

/// Boundary-inclusive test of whether `(x, z)` in `world_id` lies on `plot`.
pub fn contains(world_id: &str, x: i32, z: i32, plot: &Plot) -> bool {
    world_id == plot.world_id
        && (plot.min_x..=plot.max_x).contains(&x)
        && (plot.min_z..=plot.max_z).contains(&z)
}

// ---------------------------------------------------------------------------
// OccupancyIndex
// ---------------------------------------------------------------------------

/// In-memory index of every allocated plot by id, owner, and grid cell.
///
/// The index only reflects plots that were successfully persisted; callers
/// write to storage first and register afterwards.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    plots: HashMap<PlotId, Plot>,
    by_owner: HashMap<PlayerId, PlotId>,
    by_cell: HashMap<GridCell, PlotId>,
}

impl OccupancyIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from previously persisted plots.
    pub fn from_plots(plots: impl IntoIterator<Item = Plot>) -> Result<Self, WorldError> {
        let mut index = Self::new();
        for plot in plots {
            index.insert(plot)?;
        }
        Ok(index)
    }

    /// Number of plots held.
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    /// `true` when no plot has been allocated.
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// `true` when a plot already sits on `cell`.
    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.by_cell.contains_key(&cell)
    }

    /// Look up a plot by id.
    pub fn plot(&self, id: PlotId) -> Option<&Plot> {
        self.plots.get(&id)
    }

    /// Look up the plot owned by `owner`.
    pub fn plot_of(&self, owner: PlayerId) -> Option<&Plot> {
        self.by_owner.get(&owner).and_then(|id| self.plots.get(id))
    }

    /// All plots, in no particular order.
    pub fn plots(&self) -> impl Iterator<Item = &Plot> {
        self.plots.values()
    }

    /// The plot containing `(x, z)` in `world_id`, if any.
    pub fn locate(&self, world_id: &str, x: i32, z: i32) -> Option<&Plot> {
        self.plots.values().find(|p| contains(world_id, x, z, p))
    }

    /// The next free cell, starting at spiral index `len()`.
    ///
    /// Occupied cells are only possible after a manual edit of the index,
    /// so skipping them is logged. Gives up after `max_probe` cells.
    pub fn next_free_cell(&self, max_probe: usize) -> Result<GridCell, WorldError> {
        let mut skipped = 0_usize;
        for cell in SpiralWalk::new().skip(self.len()).take(max_probe) {
            if !self.is_occupied(cell) {
                if skipped > 0 {
                    warn!(skipped, x = cell.x, z = cell.z, "Spiral walk skipped occupied cells");
                }
                return Ok(cell);
            }
            skipped = skipped.saturating_add(1);
        }
        Err(WorldError::GridExhausted { probes: max_probe })
    }

    /// Register a persisted plot. Fails if its owner or cell is taken.
    pub fn insert(&mut self, plot: Plot) -> Result<(), WorldError> {
        if self.by_owner.contains_key(&plot.owner_id) {
            return Err(WorldError::OwnerAlreadyIndexed(plot.owner_id));
        }
        let cell = plot.grid_cell();
        if self.by_cell.contains_key(&cell) {
            return Err(WorldError::CellOccupied(cell));
        }
        self.by_owner.insert(plot.owner_id, plot.id);
        self.by_cell.insert(cell, plot.id);
        self.plots.insert(plot.id, plot);
        Ok(())
    }

    /// Replace the geometry of an already indexed plot.
    pub fn update(&mut self, plot: Plot) -> Result<(), WorldError> {
        let slot = self
            .plots
            .get_mut(&plot.id)
            .ok_or(WorldError::PlotNotFound(plot.id))?;
        *slot = plot;
        Ok(())
    }

    /// Drop a plot and release its owner and cell.
    pub fn remove(&mut self, id: PlotId) -> Option<Plot> {
        let plot = self.plots.remove(&id)?;
        self.by_owner.remove(&plot.owner_id);
        self.by_cell.remove(&plot.grid_cell());
        Some(plot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn geometry() -> PlotGeometry {
        PlotGeometry::new(64, 16)
    }

    fn plot_at(cell: GridCell) -> Plot {
        geometry()
            .new_plot(PlotId::new(), PlayerId::new(), "farm_world", cell)
            .unwrap()
    }

    #[test]
    fn spiral_first_nine_cells() {
        let cells: Vec<(i32, i32)> = SpiralWalk::new().take(9).map(|c| (c.x, c.z)).collect();
        assert_eq!(
            cells,
            vec![
                (0, 0),
                (1, 0),
                (1, 1),
                (0, 1),
                (-1, 1),
                (-1, 0),
                (-1, -1),
                (0, -1),
                (1, -1),
            ]
        );
    }

    #[test]
    fn spiral_never_revisits_a_cell() {
        let cells: Vec<GridCell> = SpiralWalk::new().take(2_500).collect();
        let distinct: HashSet<GridCell> = cells.iter().copied().collect();
        assert_eq!(distinct.len(), cells.len());
        // 2500 = 50 x 50, so the walk has filled the square around the origin.
        assert!(cells.iter().all(|c| c.x.abs() <= 25 && c.z.abs() <= 25));
    }

    #[test]
    fn spiral_point_matches_walk() {
        assert_eq!(spiral_point(0), Some(GridCell::new(0, 0)));
        assert_eq!(spiral_point(4), Some(GridCell::new(-1, 1)));
        assert_eq!(spiral_point(9), Some(GridCell::new(2, -1)));
    }

    #[test]
    fn bounds_are_centered_on_the_cell() {
        let plot = plot_at(GridCell::new(1, -1));
        assert_eq!((plot.min_x, plot.max_x), (48, 80));
        assert_eq!((plot.min_z, plot.max_z), (-80, -48));
        assert_eq!(plot.size, 16);
    }

    #[test]
    fn containment_is_boundary_inclusive() {
        let plot = Plot {
            min_x: 0,
            min_z: 0,
            max_x: 10,
            max_z: 10,
            ..plot_at(GridCell::new(0, 0))
        };
        assert!(contains("farm_world", 0, 0, &plot));
        assert!(contains("farm_world", 10, 10, &plot));
        assert!(!contains("farm_world", 11, 0, &plot));
        assert!(!contains("other_world", 5, 5, &plot));
    }

    #[test]
    fn expand_keeps_center_and_reset_restores() {
        let g = geometry();
        let plot = plot_at(GridCell::new(1, 0));
        let grown = g.expanded(&plot, 8).unwrap();
        assert_eq!(grown.size, 24);
        assert_eq!((grown.min_x, grown.max_x), (40, 88));
        assert_eq!(grown.grid_cell(), plot.grid_cell());

        let same = g.expanded(&plot, 0).unwrap();
        assert_eq!(same, plot);

        assert!(matches!(
            g.expanded(&plot, -1),
            Err(WorldError::NegativeExpansion(-1))
        ));

        let reset = g.reset(&grown).unwrap();
        assert_eq!(reset, plot);
    }

    #[test]
    fn neighbours_never_share_a_boundary() {
        let g = geometry();
        assert_eq!(g.max_size(), 31);
        let left = g.expanded(&plot_at(GridCell::new(0, 0)), 15).unwrap();
        let right = g.expanded(&plot_at(GridCell::new(1, 0)), 15).unwrap();
        assert!(left.max_x < right.min_x);
        assert!(!contains("farm_world", right.min_x, 0, &left));

        assert!(matches!(
            g.expanded(&left, 1),
            Err(WorldError::PlotTooLarge { size: 32, max: 31 })
        ));
        assert!(matches!(
            g.resized(&left, 32),
            Err(WorldError::PlotTooLarge { .. })
        ));
    }

    #[test]
    fn index_rejects_second_plot_for_owner_and_taken_cell() {
        let mut index = OccupancyIndex::new();
        let first = plot_at(GridCell::new(0, 0));
        let owner = first.owner_id;
        index.insert(first).unwrap();

        let same_owner = Plot {
            owner_id: owner,
            ..plot_at(GridCell::new(1, 0))
        };
        assert!(matches!(
            index.insert(same_owner),
            Err(WorldError::OwnerAlreadyIndexed(_))
        ));
        assert!(matches!(
            index.insert(plot_at(GridCell::new(0, 0))),
            Err(WorldError::CellOccupied(_))
        ));
    }

    #[test]
    fn next_free_cell_follows_allocation_count() {
        let mut index = OccupancyIndex::new();
        assert_eq!(index.next_free_cell(16).unwrap(), GridCell::new(0, 0));
        index.insert(plot_at(GridCell::new(0, 0))).unwrap();
        assert_eq!(index.next_free_cell(16).unwrap(), GridCell::new(1, 0));
    }

    #[test]
    fn next_free_cell_skips_manually_occupied_cells() {
        let mut index = OccupancyIndex::new();
        index.insert(plot_at(GridCell::new(1, 0))).unwrap();
        // One plot allocated, so the walk starts at index 1 = (1, 0), which is taken.
        assert_eq!(index.next_free_cell(16).unwrap(), GridCell::new(1, 1));
        assert!(matches!(
            index.next_free_cell(1),
            Err(WorldError::GridExhausted { probes: 1 })
        ));
    }

    #[test]
    fn locate_and_remove() {
        let mut index = OccupancyIndex::new();
        let plot = plot_at(GridCell::new(1, 0));
        let id = plot.id;
        let owner = plot.owner_id;
        index.insert(plot).unwrap();

        assert_eq!(index.locate("farm_world", 64, 0).unwrap().id, id);
        assert!(index.locate("farm_world", 0, 0).is_none());

        assert!(index.remove(id).is_some());
        assert!(index.plot_of(owner).is_none());
        assert!(!index.is_occupied(GridCell::new(1, 0)));
        assert!(index.is_empty());
    }
}
