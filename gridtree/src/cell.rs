use common::shapes::{Position, Region};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{GridError, GridResult};
use crate::quadrant::Quadrant;

/// Handles plus the positions they were filed under. Overflow snapshots
/// and merge buffers are bounded by the leaf capacity, which is small.
pub(crate) type EntryBuf<H> = SmallVec<[(H, Position); 8]>;

/// Outcome of a leaf insertion. `Overloaded` carries everything the leaf
/// holds so the enclosing branch can rebuild; it never travels further up
/// than that branch.
pub(crate) enum LeafAdd<H> {
    Inserted,
    Overloaded(EntryBuf<H>),
}

/// A terminal cell: a fixed number of slots over a rectangular region.
/// Slots are scanned linearly, which is the right trade at the small
/// capacities this index targets.
pub(crate) struct LeafCell<H> {
    region: Region,
    slots: Vec<Option<(H, Position)>>,
}

impl<H: Copy + Eq> LeafCell<H> {
    pub(crate) fn new(region: Region, capacity: usize) -> Self {
        Self {
            region,
            slots: vec![None; capacity],
        }
    }

    fn with_entries(
        region: Region,
        capacity: usize,
        entries: impl IntoIterator<Item = (H, Position)>,
    ) -> Self {
        let mut leaf = Self::new(region, capacity);
        for (i, entry) in entries.into_iter().enumerate() {
            leaf.slots[i] = Some(entry);
        }
        leaf
    }

    fn add(&mut self, handle: H, position: Position) -> LeafAdd<H> {
        debug_assert!(
            self.slots.iter().flatten().all(|(h, _)| *h != handle),
            "handle already resident in this cell"
        );
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some((handle, position));
            return LeafAdd::Inserted;
        }
        LeafAdd::Overloaded(self.entries().collect())
    }

    fn remove(&mut self, handle: H, position: Position) -> GridResult<()> {
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some((h, _)) if *h == handle) {
                *slot = None;
                return Ok(());
            }
        }
        Err(GridError::NotFound {
            x: position.x,
            y: position.y,
        })
    }

    fn refresh(&mut self, handle: H, position: Position) -> bool {
        for slot in self.slots.iter_mut() {
            if let Some((h, stored)) = slot {
                if *h == handle {
                    *stored = position;
                    return true;
                }
            }
        }
        false
    }

    pub(crate) fn region(&self) -> &Region {
        &self.region
    }

    pub(crate) fn contains(&self, position: Position) -> bool {
        self.region.contains(position)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub(crate) fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.slots.iter().flatten().map(|(h, _)| *h)
    }

    fn entries(&self) -> impl Iterator<Item = (H, Position)> + '_ {
        self.slots.iter().flatten().copied()
    }
}

/// One child of a split branch.
pub(crate) enum Cell<H> {
    Leaf(LeafCell<H>),
    Branch(BranchCell<H>),
}

impl<H: Copy + Eq> Cell<H> {
    fn len(&self) -> usize {
        match self {
            Cell::Leaf(leaf) => leaf.len(),
            Cell::Branch(branch) => branch.len(),
        }
    }

    fn collect_entries(&self, out: &mut EntryBuf<H>) {
        match self {
            Cell::Leaf(leaf) => out.extend(leaf.entries()),
            Cell::Branch(branch) => branch.collect_entries(out),
        }
    }

    fn is_consistent(&self) -> bool {
        match self {
            Cell::Leaf(_) => true,
            Cell::Branch(branch) => branch.is_consistent(),
        }
    }
}

/// Child state of a branch: a reserved subdivision slot holding one leaf
/// over the whole region, or four children, one per quadrant.
enum Children<H> {
    Pending(LeafCell<H>),
    Split(Box<[Cell<H>; 4]>),
}

/// An internal cell. Consumes leaf overflow by splitting and rebuilding,
/// collapses its children back into one leaf once occupancy falls to the
/// leaf capacity. Every tree root in the grid is one of these.
pub(crate) struct BranchCell<H> {
    region: Region,
    capacity: usize,
    depth_left: u32,
    count: usize,
    children: Children<H>,
}

impl<H: Copy + Eq> BranchCell<H> {
    pub(crate) fn new(region: Region, capacity: usize, depth_left: u32) -> Self {
        Self {
            region,
            capacity,
            depth_left,
            count: 0,
            children: Children::Pending(LeafCell::new(region, capacity)),
        }
    }

    fn new_split(region: Region, capacity: usize, depth_left: u32) -> Self {
        Self {
            region,
            capacity,
            depth_left,
            count: 0,
            children: Children::Split(Self::quadrant_leaves(&region, capacity)),
        }
    }

    fn quadrant_leaves(region: &Region, capacity: usize) -> Box<[Cell<H>; 4]> {
        Box::new(Quadrant::ALL.map(|q| Cell::Leaf(LeafCell::new(q.sub_region(region), capacity))))
    }

    pub(crate) fn region(&self) -> &Region {
        &self.region
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn add(&mut self, handle: H, position: Position) -> GridResult<()> {
        let center = self.region.center();
        let snapshot = match &mut self.children {
            Children::Pending(leaf) => match leaf.add(handle, position) {
                LeafAdd::Inserted => {
                    self.count += 1;
                    return Ok(());
                }
                LeafAdd::Overloaded(snapshot) => snapshot,
            },
            Children::Split(children) => {
                let quadrant = Quadrant::classify(center, position);
                let snapshot = match &mut children[quadrant.index()] {
                    Cell::Branch(branch) => {
                        branch.add(handle, position)?;
                        self.count += 1;
                        return Ok(());
                    }
                    Cell::Leaf(leaf) => match leaf.add(handle, position) {
                        LeafAdd::Inserted => {
                            self.count += 1;
                            return Ok(());
                        }
                        LeafAdd::Overloaded(snapshot) => snapshot,
                    },
                };
                // A quadrant leaf overflowed: rebuild its slot one depth
                // level down.
                if self.depth_left <= 1 {
                    return Err(GridError::DepthExhausted {
                        x: position.x,
                        y: position.y,
                    });
                }
                let region = quadrant.sub_region(&self.region);
                debug!(region = ?region, occupants = snapshot.len(), "splitting cell");
                Self::split_slot(
                    &mut children[quadrant.index()],
                    region,
                    self.capacity,
                    self.depth_left - 1,
                    &snapshot,
                    handle,
                    position,
                )?;
                self.count += 1;
                return Ok(());
            }
        };
        self.split_self(snapshot, handle, position)
    }

    /// The reserved leaf overflowed: subdivide this branch in place and
    /// redistribute, then place the handle that did not fit.
    fn split_self(&mut self, snapshot: EntryBuf<H>, handle: H, position: Position) -> GridResult<()> {
        if self.depth_left == 0 {
            return Err(GridError::DepthExhausted {
                x: position.x,
                y: position.y,
            });
        }
        debug!(region = ?self.region, occupants = snapshot.len(), "splitting cell");
        self.count = 0;
        self.children = Children::Split(Self::quadrant_leaves(&self.region, self.capacity));
        for (h, p) in snapshot.iter().copied() {
            // Redistribution cannot overflow: even if the whole snapshot
            // lands in one quadrant it fills the leaf exactly.
            self.add(h, p)?;
        }
        match self.add(handle, position) {
            Ok(()) => Ok(()),
            Err(err) => {
                // The new handle could not be placed anywhere under this
                // branch. Collapse back so the caller sees the tree it
                // started with.
                self.merge();
                Err(err)
            }
        }
    }

    /// Rebuild an overflowed quadrant leaf's slot as a subtree holding the
    /// leaf's occupants plus the new handle. The slot is only replaced
    /// once the rebuild succeeds, so a failed rebuild leaves the original
    /// leaf in place.
    fn split_slot(
        slot: &mut Cell<H>,
        region: Region,
        capacity: usize,
        depth_left: u32,
        snapshot: &EntryBuf<H>,
        handle: H,
        position: Position,
    ) -> GridResult<()> {
        let mut subtree = Self::new_split(region, capacity, depth_left);
        for (h, p) in snapshot.iter().copied() {
            subtree.add(h, p)?;
        }
        subtree.add(handle, position)?;
        *slot = Cell::Branch(subtree);
        Ok(())
    }

    pub(crate) fn remove(&mut self, handle: H, position: Position) -> GridResult<()> {
        let center = self.region.center();
        match &mut self.children {
            Children::Pending(leaf) => {
                leaf.remove(handle, position)?;
                self.count -= 1;
                Ok(())
            }
            Children::Split(children) => {
                let quadrant = Quadrant::classify(center, position);
                match &mut children[quadrant.index()] {
                    Cell::Leaf(leaf) => leaf.remove(handle, position)?,
                    Cell::Branch(branch) => branch.remove(handle, position)?,
                }
                self.count -= 1;
                if self.count <= self.capacity {
                    self.merge();
                }
                Ok(())
            }
        }
    }

    /// Collapse four children back into a single fresh leaf over this
    /// branch's own region. Only called once the aggregate fits, so the
    /// rebuild cannot overflow.
    fn merge(&mut self) {
        let entries = match &self.children {
            Children::Pending(_) => return,
            Children::Split(children) => {
                let mut entries = EntryBuf::new();
                for child in children.iter() {
                    child.collect_entries(&mut entries);
                }
                entries
            }
        };
        debug!(region = ?self.region, occupants = entries.len(), "merging cell");
        let leaf = LeafCell::with_entries(self.region, self.capacity, entries);
        self.count = leaf.len();
        self.children = Children::Pending(leaf);
    }

    /// The leaf whose region contains `position`.
    pub(crate) fn leaf_for(&self, position: Position) -> &LeafCell<H> {
        match &self.children {
            Children::Pending(leaf) => leaf,
            Children::Split(children) => {
                let quadrant = Quadrant::classify(self.region.center(), position);
                match &children[quadrant.index()] {
                    Cell::Leaf(leaf) => leaf,
                    Cell::Branch(branch) => branch.leaf_for(position),
                }
            }
        }
    }

    /// Update the position filed for `handle` in the leaf containing
    /// `position`. Used when a move stays inside one leaf.
    pub(crate) fn refresh_position(
        &mut self,
        handle: H,
        position: Position,
        new_position: Position,
    ) -> bool {
        let center = self.region.center();
        match &mut self.children {
            Children::Pending(leaf) => leaf.refresh(handle, new_position),
            Children::Split(children) => {
                let quadrant = Quadrant::classify(center, position);
                match &mut children[quadrant.index()] {
                    Cell::Leaf(leaf) => leaf.refresh(handle, new_position),
                    Cell::Branch(branch) => {
                        branch.refresh_position(handle, position, new_position)
                    }
                }
            }
        }
    }

    pub(crate) fn collect_entries(&self, out: &mut EntryBuf<H>) {
        match &self.children {
            Children::Pending(leaf) => out.extend(leaf.entries()),
            Children::Split(children) => {
                for child in children.iter() {
                    child.collect_entries(out);
                }
            }
        }
    }

    /// Audit: aggregate counts match the leaves underneath, and a split
    /// branch always holds more than the leaf capacity.
    pub(crate) fn is_consistent(&self) -> bool {
        match &self.children {
            Children::Pending(leaf) => self.count == leaf.len(),
            Children::Split(children) => {
                let sum: usize = children.iter().map(|child| child.len()).sum();
                self.count == sum
                    && self.count > self.capacity
                    && children.iter().all(|child| child.is_consistent())
            }
        }
    }
}
