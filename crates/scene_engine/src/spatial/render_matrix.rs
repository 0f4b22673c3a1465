//! Render matrix
//!
//! Owns the scene's grid and turns it into draw calls each frame.

use std::sync::Arc;

use crate::config::GridKind;
use crate::foundation::math::{Spatial, Transform};
use crate::game::{GameObject, ObjectId};
use crate::render::{BackendResult, RenderBackend, RenderSlot};
use crate::spatial::{Cell, GridEntry, GridError, GridMatrix, NestedGrid, PackedGrid};

/// Draw-list producer over a shared [`GridMatrix`]
#[derive(Clone)]
pub struct RenderMatrix {
    grid: Arc<dyn GridMatrix>,
}

impl std::fmt::Debug for RenderMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderMatrix")
            .field("cells", &self.grid.len())
            .finish()
    }
}

impl Default for RenderMatrix {
    fn default() -> Self {
        Self::with_kind(GridKind::default())
    }
}

impl RenderMatrix {
    /// Wrap an existing grid
    pub fn new(grid: Arc<dyn GridMatrix>) -> Self {
        Self { grid }
    }

    /// Create a render matrix over a fresh grid of the given kind
    pub fn with_kind(kind: GridKind) -> Self {
        let grid: Arc<dyn GridMatrix> = match kind {
            GridKind::Packed => Arc::new(PackedGrid::new()),
            GridKind::Nested => Arc::new(NestedGrid::new()),
        };
        Self::new(grid)
    }

    /// Shared handle to the grid, for readers on other threads
    pub fn grid(&self) -> &Arc<dyn GridMatrix> {
        &self.grid
    }

    /// Place a game object in the cell its position rounds to
    ///
    /// Returns the cell used and whatever occupied it before.
    pub fn add_game_object(
        &self,
        id: ObjectId,
        object: &GameObject,
    ) -> Result<(Cell, Option<GridEntry>), GridError> {
        let cell = Cell::from(object.transform.position);
        let previous = self.grid.set(cell, object.grid_entry(id))?;
        Ok((cell, previous))
    }

    /// Place several game objects; later ones win contested cells
    pub fn add_game_objects<'a>(
        &self,
        objects: impl IntoIterator<Item = (ObjectId, &'a GameObject)>,
    ) -> Result<Vec<Cell>, GridError> {
        objects
            .into_iter()
            .map(|(id, object)| self.add_game_object(id, object).map(|(cell, _)| cell))
            .collect()
    }

    /// Place a render object with no owning game object
    ///
    /// Its local transform is taken as the world transform.
    pub fn add_render_object(&self, slot: &RenderSlot) -> Result<Cell, GridError> {
        let visible = slot.visible(&Transform::identity());
        let cell = Cell::from(visible.transform.position);
        self.grid.set(cell, GridEntry::standalone(visible))?;
        Ok(cell)
    }

    /// Place several standalone render objects
    pub fn add_render_objects<'a>(
        &self,
        slots: impl IntoIterator<Item = &'a RenderSlot>,
    ) -> Result<Vec<Cell>, GridError> {
        slots
            .into_iter()
            .map(|slot| self.add_render_object(slot))
            .collect()
    }

    /// Draw every visible entry against `camera`
    ///
    /// Returns the number of entities drawn. Presenting the frame is left to
    /// the caller.
    pub fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        camera: &impl Spatial,
    ) -> BackendResult<usize> {
        let camera = Transform::new(camera.position(), camera.rotation(), camera.scale());
        let visibles = self.grid.visibles(&camera);

        for visible in &visibles {
            backend.draw_entity(visible, &camera)?;
        }

        log::trace!("Drew {} entities", visibles.len());
        Ok(visibles.len())
    }

    /// Remove everything from the grid
    pub fn clear(&self) {
        self.grid.clear();
    }
}
