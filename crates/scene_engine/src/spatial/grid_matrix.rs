//! Grid storage
//!
//! A grid maps each integer cell to at most one [`GridEntry`]. It never owns
//! the game objects it indexes; entries hold an [`ObjectId`] into the scene
//! arena plus a copy of what the draw pass needs, so the render side can read
//! the grid without touching the scene.
//!
//! Both storages sit behind a single `RwLock`, so a reader always sees a cell
//! either before or after a write, never half of one.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::foundation::math::Transform;
use crate::game::ObjectId;
use crate::render::Visible;
use crate::spatial::{Cell, GridError, PackedKey};

/// Contents of one occupied cell
#[derive(Debug, Clone)]
pub struct GridEntry {
    /// Occupying game object, `None` for standalone render objects
    pub object: Option<ObjectId>,

    /// Opaque tag carried alongside the cell
    pub metadata: i16,

    /// World transform at placement time
    pub transform: Transform,

    /// Draw-list entries contributed by this cell
    pub renders: Vec<Visible>,
}

impl GridEntry {
    /// Entry for a game object
    pub fn for_object(
        object: ObjectId,
        metadata: i16,
        transform: Transform,
        renders: Vec<Visible>,
    ) -> Self {
        Self {
            object: Some(object),
            metadata,
            transform,
            renders,
        }
    }

    /// Entry for a render object placed without an owner
    pub fn standalone(visible: Visible) -> Self {
        Self {
            object: None,
            metadata: 0,
            transform: visible.transform,
            renders: vec![visible],
        }
    }
}

/// Thread-safe cell storage
///
/// Every method takes `&self`; implementations synchronise internally so the
/// grid can be shared between the tick thread and a draw thread.
pub trait GridMatrix: Send + Sync {
    /// Copy of the entry at `cell`
    fn get(&self, cell: Cell) -> Result<Option<GridEntry>, GridError>;

    /// Place `entry` at `cell`, returning the entry it replaced
    fn set(&self, cell: Cell, entry: GridEntry) -> Result<Option<GridEntry>, GridError>;

    /// Empty `cell`, returning what was there
    fn remove(&self, cell: Cell) -> Result<Option<GridEntry>, GridError>;

    /// Empty `cell` only if `object` still occupies it
    fn remove_occupant(&self, cell: Cell, object: ObjectId) -> Result<bool, GridError>;

    /// Draw-list entries of every occupied cell
    ///
    /// The camera is accepted for culling; no culling is done yet, so every
    /// placed render object is returned.
    fn visibles(&self, camera: &Transform) -> Vec<Visible>;

    /// Ids of every placed game object
    fn occupants(&self) -> Vec<ObjectId>;

    /// Number of occupied cells
    fn len(&self) -> usize;

    /// Whether no cell is occupied
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty every cell
    fn clear(&self);

    /// Occupant of `cell`, if a game object sits there
    fn occupant(&self, cell: Cell) -> Result<Option<ObjectId>, GridError> {
        Ok(self.get(cell)?.and_then(|entry| entry.object))
    }
}

/// Grid keyed by [`PackedKey`] cell bits
///
/// Each axis is limited to the `i16` range; placing or querying outside it is
/// an error.
#[derive(Debug, Default)]
pub struct PackedGrid {
    cells: RwLock<HashMap<u64, GridEntry>>,
}

impl PackedGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    fn key(cell: Cell) -> Result<u64, GridError> {
        Ok(PackedKey::encode(cell, 0)?.cell_bits())
    }
}

impl GridMatrix for PackedGrid {
    fn get(&self, cell: Cell) -> Result<Option<GridEntry>, GridError> {
        let key = Self::key(cell)?;
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        Ok(cells.get(&key).cloned())
    }

    fn set(&self, cell: Cell, entry: GridEntry) -> Result<Option<GridEntry>, GridError> {
        let key = PackedKey::encode(cell, entry.metadata)?.cell_bits();
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cells.insert(key, entry))
    }

    fn remove(&self, cell: Cell) -> Result<Option<GridEntry>, GridError> {
        let key = Self::key(cell)?;
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cells.remove(&key))
    }

    fn remove_occupant(&self, cell: Cell, object: ObjectId) -> Result<bool, GridError> {
        let key = Self::key(cell)?;
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        if cells.get(&key).and_then(|entry| entry.object) == Some(object) {
            cells.remove(&key);
            return Ok(true);
        }
        Ok(false)
    }

    fn visibles(&self, _camera: &Transform) -> Vec<Visible> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells
            .values()
            .flat_map(|entry| entry.renders.iter().cloned())
            .collect()
    }

    fn occupants(&self) -> Vec<ObjectId> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.values().filter_map(|entry| entry.object).collect()
    }

    fn len(&self) -> usize {
        self.cells.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn clear(&self) {
        self.cells.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

type Column = BTreeMap<i32, GridEntry>;
type Plane = BTreeMap<i32, Column>;

/// Grid of nested per-axis maps covering the full `i32` range
///
/// Iteration is ordered by x, then y, then z.
#[derive(Debug, Default)]
pub struct NestedGrid {
    cells: RwLock<BTreeMap<i32, Plane>>,
}

impl NestedGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    fn take(planes: &mut BTreeMap<i32, Plane>, cell: Cell) -> Option<GridEntry> {
        let plane = planes.get_mut(&cell.x)?;
        let column = plane.get_mut(&cell.y)?;
        let entry = column.remove(&cell.z);

        // Drop emptied levels so len/iteration stay cheap
        if column.is_empty() {
            plane.remove(&cell.y);
        }
        if plane.is_empty() {
            planes.remove(&cell.x);
        }
        entry
    }
}

impl GridMatrix for NestedGrid {
    fn get(&self, cell: Cell) -> Result<Option<GridEntry>, GridError> {
        let planes = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        Ok(planes
            .get(&cell.x)
            .and_then(|plane| plane.get(&cell.y))
            .and_then(|column| column.get(&cell.z))
            .cloned())
    }

    fn set(&self, cell: Cell, entry: GridEntry) -> Result<Option<GridEntry>, GridError> {
        let mut planes = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        Ok(planes
            .entry(cell.x)
            .or_default()
            .entry(cell.y)
            .or_default()
            .insert(cell.z, entry))
    }

    fn remove(&self, cell: Cell) -> Result<Option<GridEntry>, GridError> {
        let mut planes = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::take(&mut planes, cell))
    }

    fn remove_occupant(&self, cell: Cell, object: ObjectId) -> Result<bool, GridError> {
        let mut planes = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        let occupied_by_object = planes
            .get(&cell.x)
            .and_then(|plane| plane.get(&cell.y))
            .and_then(|column| column.get(&cell.z))
            .and_then(|entry| entry.object)
            == Some(object);

        if occupied_by_object {
            Self::take(&mut planes, cell);
        }
        Ok(occupied_by_object)
    }

    fn visibles(&self, _camera: &Transform) -> Vec<Visible> {
        let planes = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        planes
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .flat_map(|entry| entry.renders.iter().cloned())
            .collect()
    }

    fn occupants(&self) -> Vec<ObjectId> {
        let planes = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        planes
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .filter_map(|entry| entry.object)
            .collect()
    }

    fn len(&self) -> usize {
        let planes = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        planes.values().flat_map(BTreeMap::values).map(BTreeMap::len).sum()
    }

    fn clear(&self) {
        self.cells.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
