//! Render descriptors
//!
//! A [`RenderObject`] is an immutable description of something drawable. Game
//! objects own them through [`RenderSlot`]s, which also remember the backend
//! resource once loaded. Each frame the grid turns slots into [`Visible`]
//! entries carrying the final world transform.

use std::sync::Arc;

use crate::foundation::math::{Transform, Vec3};
use crate::render::{BackendResult, ResourceHandle, ResourceLoader};

/// Geometry of a render object
#[derive(Debug, Clone, PartialEq)]
pub enum RenderShape {
    /// Unit quad scaled by the transform
    Rect,
    /// Circle approximated by `segments` edges
    Circle {
        /// Number of edges on the outline
        segments: u32,
        /// Fill the interior instead of drawing the outline
        filled: bool,
    },
    /// Line from the local origin to `to`
    Line {
        /// End point in local space
        to: Vec3,
    },
    /// Named mesh resolved by the backend
    Mesh {
        /// Backend-specific mesh name
        name: String,
    },
    /// Text label
    Text {
        /// String to draw
        content: String,
        /// Glyph height in world units
        size: f32,
    },
}

/// Immutable drawable descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    /// Debug name, used in logs and backend errors
    pub name: String,

    /// What to draw
    pub shape: RenderShape,

    /// Transform relative to the owner (world transform when standalone)
    pub local: Transform,

    /// RGBA color
    pub color: [f32; 4],
}

impl RenderObject {
    /// Create a white render object at the owner's origin
    pub fn new(name: impl Into<String>, shape: RenderShape) -> Self {
        Self {
            name: name.into(),
            shape,
            local: Transform::identity(),
            color: [1.0; 4],
        }
    }

    /// Builder-style local transform
    #[must_use]
    pub fn with_local(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    /// Builder-style color
    #[must_use]
    pub const fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Outlined circle with the usual segment count
    pub fn circle(name: impl Into<String>) -> Self {
        Self::new(
            name,
            RenderShape::Circle {
                segments: 32,
                filled: false,
            },
        )
    }

    /// Unit rectangle
    pub fn rect(name: impl Into<String>) -> Self {
        Self::new(name, RenderShape::Rect)
    }
}

/// A render object owned by a game object, plus its backend resource
#[derive(Debug, Clone)]
pub struct RenderSlot {
    object: Arc<RenderObject>,
    handle: Option<ResourceHandle>,
}

impl RenderSlot {
    /// Wrap a render object; nothing is loaded yet
    pub fn new(object: RenderObject) -> Self {
        Self {
            object: Arc::new(object),
            handle: None,
        }
    }

    /// The descriptor
    pub fn object(&self) -> &Arc<RenderObject> {
        &self.object
    }

    /// Backend handle, once loaded
    pub const fn handle(&self) -> Option<ResourceHandle> {
        self.handle
    }

    /// Whether a backend resource is held
    pub const fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Load the backend resource once; later calls are no-ops
    pub fn load(&mut self, loader: &mut dyn ResourceLoader) -> BackendResult<()> {
        if self.handle.is_none() {
            self.handle = Some(loader.load_resource(&self.object)?);
        }
        Ok(())
    }

    /// Release the backend resource if one is held
    pub fn unload(&mut self, loader: &mut dyn ResourceLoader) {
        if let Some(handle) = self.handle.take() {
            loader.unload_resource(handle);
        }
    }

    /// Draw-list entry for an owner at `owner` in world space
    pub fn visible(&self, owner: &Transform) -> Visible {
        Visible {
            render: Arc::clone(&self.object),
            resource: self.handle,
            transform: owner.combine(&self.object.local),
        }
    }
}

impl From<RenderObject> for RenderSlot {
    fn from(object: RenderObject) -> Self {
        Self::new(object)
    }
}

/// One draw-list entry
#[derive(Debug, Clone)]
pub struct Visible {
    /// The descriptor to draw
    pub render: Arc<RenderObject>,

    /// Backend resource, `None` if the owner never loaded it
    pub resource: Option<ResourceHandle>,

    /// Final world transform
    pub transform: Transform,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use approx::assert_relative_eq;

    #[test]
    fn test_slot_loads_once() {
        let mut backend = RecordingBackend::new();
        let mut slot = RenderSlot::new(RenderObject::circle("ball"));

        slot.load(&mut backend).unwrap();
        let handle = slot.handle();
        slot.load(&mut backend).unwrap();

        assert_eq!(slot.handle(), handle);
        assert_eq!(backend.loaded_count(), 1);

        slot.unload(&mut backend);
        slot.unload(&mut backend);
        assert!(!slot.is_loaded());
        assert_eq!(backend.loaded_count(), 0);
    }

    #[test]
    fn test_visible_combines_owner_and_local() {
        let object = RenderObject::rect("label")
            .with_local(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let slot = RenderSlot::new(object);

        let owner = Transform::from_position(Vec3::new(3.0, 0.0, 0.0)).with_uniform_scale(2.0);
        let visible = slot.visible(&owner);

        assert_relative_eq!(visible.transform.position, Vec3::new(3.0, 2.0, 0.0));
        assert!(visible.resource.is_none());
    }
}
