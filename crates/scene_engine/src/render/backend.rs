//! # Render Backend Abstraction
//!
//! Two small traits sit between the scene and a graphics API:
//!
//! - [`ResourceLoader`] allocates and releases backend-side resources for a
//!   render object. Game objects call it while loading and unloading.
//! - [`RenderBackend`] extends it with the per-frame draw contract: draw one
//!   visible entity against the camera, then present the frame.
//!
//! Backends own their own state. The engine only keeps the opaque
//! [`ResourceHandle`] a backend returns.

use crate::foundation::math::Transform;
use crate::render::{RenderError, RenderObject, Visible};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Opaque handle to a backend-side resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub u64);

/// Load/unload lifecycle for backend resources
pub trait ResourceLoader {
    /// Allocate whatever the backend needs before `object` is first drawn
    fn load_resource(&mut self, object: &RenderObject) -> BackendResult<ResourceHandle>;

    /// Release a resource after its last use
    fn unload_resource(&mut self, handle: ResourceHandle);
}

/// Per-frame draw contract
pub trait RenderBackend: ResourceLoader {
    /// Issue the draw calls for one visible entity as seen from `camera`
    ///
    /// # Arguments
    /// * `entity` - Render descriptor, its resource handle and world transform
    /// * `camera` - Transform of the active camera
    fn draw_entity(&mut self, entity: &Visible, camera: &Transform) -> BackendResult<()>;

    /// Finish the frame
    fn present(&mut self) -> BackendResult<()>;
}
