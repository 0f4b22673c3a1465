//! Game objects and the scene that drives them
//!
//! A [`Scene`] owns every [`GameObject`] in an arena keyed by [`ObjectId`],
//! keeps them placed in its render matrix and runs them through the
//! lifecycle each tick.

pub mod camera;
pub mod context;
pub mod object;
pub mod scene;

pub use camera::{Camera, CameraError, Projection};
pub use context::{SimulationContext, TickContext, WorldSnapshot};
pub use object::{Behavior, GameObject};
pub use scene::{Scene, ShutdownHandle};

slotmap::new_key_type! {
    /// Handle of a game object in its scene
    pub struct ObjectId;
}
