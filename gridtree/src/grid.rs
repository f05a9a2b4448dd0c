use std::hash::Hash;

use common::shapes::{Position, Region};
use fxhash::FxHashSet;
use tracing::{debug, trace};

use crate::cell::{BranchCell, EntryBuf};
use crate::error::{GridError, GridResult};
use crate::quadrant::{self, Direction};

/// Tuning for the trees under each macro cell.
#[derive(Debug, Clone)]
pub struct Config {
    /// Handles a leaf holds before its branch subdivides.
    pub leaf_capacity: usize,
    /// How many times a macro cell may subdivide.
    pub cell_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            leaf_capacity: 8,
            cell_depth: 4,
        }
    }
}

/// A bounded area partitioned into a uniform grid of macro cells, each
/// rooting its own adaptive tree. Positions map to macro cells by
/// floor-division; everything below that is handled by the cells.
///
/// The index references handles, it never owns the objects behind them.
/// Hosts must `remove` before destroying an object and `relocate` when a
/// tracked position changes. Single-threaded by design; wrap externally
/// if several writers need one grid.
pub struct Grid<H> {
    origin: Position,
    cell_width: f32,
    cell_height: f32,
    cols: u32,
    rows: u32,
    roots: Vec<BranchCell<H>>,
}

impl<H: Copy + Eq> Grid<H> {
    pub fn new(
        origin: Position,
        cell_width: f32,
        cell_height: f32,
        cols: u32,
        rows: u32,
    ) -> GridResult<Self> {
        Self::new_with_config(origin, cell_width, cell_height, cols, rows, Config::default())
    }

    pub fn new_with_config(
        origin: Position,
        cell_width: f32,
        cell_height: f32,
        cols: u32,
        rows: u32,
        config: Config,
    ) -> GridResult<Self> {
        if !(cell_width.is_finite() && cell_height.is_finite())
            || cell_width <= 0.0
            || cell_height <= 0.0
        {
            return Err(GridError::InvalidCellSize {
                width: cell_width,
                height: cell_height,
            });
        }
        if cols == 0 || rows == 0 {
            return Err(GridError::InvalidGridDims { cols, rows });
        }
        if config.leaf_capacity == 0 {
            return Err(GridError::InvalidCapacity);
        }

        let mut roots = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                let region = Region::new(
                    origin.x + col as f32 * cell_width,
                    origin.y + row as f32 * cell_height,
                    cell_width,
                    cell_height,
                );
                roots.push(BranchCell::new(
                    region,
                    config.leaf_capacity,
                    config.cell_depth,
                ));
            }
        }
        debug!(
            cols,
            rows,
            leaf_capacity = config.leaf_capacity,
            cell_depth = config.cell_depth,
            "created spatial grid"
        );
        Ok(Self {
            origin,
            cell_width,
            cell_height,
            cols,
            rows,
            roots,
        })
    }

    fn cell_index(&self, position: Position) -> GridResult<usize> {
        let col = ((position.x - self.origin.x) / self.cell_width).floor();
        let row = ((position.y - self.origin.y) / self.cell_height).floor();
        if !(col >= 0.0 && col < self.cols as f32 && row >= 0.0 && row < self.rows as f32) {
            return Err(GridError::OutOfBounds {
                x: position.x,
                y: position.y,
            });
        }
        Ok(col as usize + row as usize * self.cols as usize)
    }

    /// File `handle` under `position`.
    pub fn insert(&mut self, handle: H, position: Position) -> GridResult<()> {
        let index = self.cell_index(position)?;
        self.roots[index].add(handle, position)
    }

    /// Drop `handle` from the leaf containing `position`.
    pub fn remove(&mut self, handle: H, position: Position) -> GridResult<()> {
        let index = self.cell_index(position)?;
        self.roots[index].remove(handle, position)
    }

    /// Move `handle` from `old` to `new`. If both positions fall in the
    /// same leaf only the filed position is refreshed; otherwise this is
    /// a remove followed by an insert, which may split or merge cells on
    /// either side. A failed move leaves the handle resident at `old`.
    pub fn relocate(&mut self, handle: H, old: Position, new: Position) -> GridResult<()> {
        let old_index = self.cell_index(old)?;
        let new_index = self.cell_index(new)?;
        if old_index == new_index {
            let root = &mut self.roots[old_index];
            if root.leaf_for(old).contains(new) {
                if root.refresh_position(handle, old, new) {
                    return Ok(());
                }
                return Err(GridError::NotFound { x: old.x, y: old.y });
            }
        }
        trace!(
            from = ?(old.x, old.y),
            to = ?(new.x, new.y),
            "relocating across cells"
        );
        self.roots[old_index].remove(handle, old)?;
        match self.roots[new_index].add(handle, new) {
            Ok(()) => Ok(()),
            Err(err) => {
                // The entry fit at `old` a moment ago, so restoring it
                // there cannot run out of room or depth.
                self.roots[old_index].add(handle, old)?;
                Err(err)
            }
        }
    }

    /// Every handle co-resident in the leaf containing `position`, in
    /// slot order.
    pub fn leaf_objects(&self, position: Position) -> GridResult<impl Iterator<Item = H> + '_> {
        let index = self.cell_index(position)?;
        Ok(self.roots[index].leaf_for(position).handles())
    }

    /// The region of the leaf containing `position`. Useful to hosts for
    /// drawing cell boundaries.
    pub fn leaf_region(&self, position: Position) -> GridResult<Region> {
        let index = self.cell_index(position)?;
        Ok(*self.roots[index].leaf_for(position).region())
    }

    /// A point just across the containing leaf's edge in `direction`.
    /// Feed it back to `leaf_objects` to reach the adjacent cell's
    /// occupants; this never inspects the neighbor itself.
    pub fn neighbor_probe(&self, position: Position, direction: Direction) -> GridResult<Position> {
        let region = self.leaf_region(position)?;
        Ok(quadrant::probe_position(&region, position, direction))
    }

    /// Total resident handles.
    pub fn len(&self) -> usize {
        self.roots.iter().map(|root| root.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Copy + Eq + Hash> Grid<H> {
    /// Audit the whole index: aggregate counts match leaf occupancy,
    /// split branches exceed the leaf capacity, and no handle is resident
    /// in more than one leaf. Cheap enough for tests, not meant for the
    /// hot path.
    pub fn is_consistent(&self) -> bool {
        if !self.roots.iter().all(|root| root.is_consistent()) {
            return false;
        }
        let mut entries = EntryBuf::new();
        for root in &self.roots {
            root.collect_entries(&mut entries);
        }
        let mut seen = FxHashSet::default();
        entries.iter().all(|(handle, _)| seen.insert(*handle)) && seen.len() == self.len()
    }
}
