//! Rendering collaborator contract
//!
//! The engine never talks to a graphics API. It hands immutable render
//! descriptors to whatever implements [`ResourceLoader`] and [`RenderBackend`]
//! and lets that implementation decide what a draw call means.

pub mod backend;
pub mod recording;
pub mod render_object;

pub use backend::{BackendResult, RenderBackend, ResourceHandle, ResourceLoader};
pub use recording::{BackendEvent, RecordingBackend};
pub use render_object::{RenderObject, RenderShape, RenderSlot, Visible};

use thiserror::Error;

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Backend failed to allocate a resource for a render object
    #[error("Resource load failed for '{name}': {reason}")]
    LoadFailed {
        /// Debug name of the render object
        name: String,
        /// Backend supplied reason
        reason: String,
    },

    /// A handle was used that the backend does not know about
    #[error("Unknown resource handle {0:?}")]
    UnknownResource(ResourceHandle),

    /// Backend failure while drawing or presenting
    #[error("Backend error: {0}")]
    BackendError(String),
}
