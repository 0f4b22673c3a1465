//! Scene lifecycle tree
//!
//! Every stateful entity moves through the same states:
//! `Unloaded -> Loaded -> (Enabled <-> Disabled) -> Unloaded`.
//! [`Container`] implements that state machine once and propagates it through
//! an arbitrary tree of [`Tickable`] children.

pub mod container;

pub use container::{Container, Hooks, LifecycleFlags, NodeId, Tickable};

use crate::physics::{ColliderError, PhysicsError};
use crate::spatial::GridError;
use thiserror::Error;

/// Anything that can go wrong inside one tick
///
/// Any of these stops the game loop after the current tick.
#[derive(Error, Debug)]
pub enum TickError {
    /// Grid placement failed
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// A collider pair could not be tested
    #[error("Collider error: {0}")]
    Collider(#[from] ColliderError),

    /// Collision response hit an invalid state
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// User behaviour code failed
    #[error("Behavior error: {0}")]
    Behavior(String),
}
