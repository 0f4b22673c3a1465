//! Physics module
//!
//! Collision detection between collider shapes and the elastic response that
//! turns detected collisions into new velocities.

pub mod collider;
pub mod physics_object;
pub mod response;
pub mod shape;

pub use collider::{Collider, Collision};
pub use physics_object::PhysicsObject;
pub use response::{BodyState, ContactFrame};
pub use shape::{ColliderKind, Probe, DEFAULT_CIRCLE_SEGMENTS};

use crate::game::ObjectId;
use thiserror::Error;

/// Collision detection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColliderError {
    /// No algorithm exists for this shape pair
    #[error("Collision between {active} and {other} is not supported")]
    UnsupportedPair {
        /// Shape asking
        active: ColliderKind,
        /// Shape asked about
        other: ColliderKind,
    },

    /// No containment test exists for this shape
    #[error("Point containment is not supported for {0}")]
    UnsupportedPoint(ColliderKind),

    /// A planar shape was tested against a solid
    #[error("Cannot test {active} against {other}: dimensions differ")]
    DimensionMismatch {
        /// Shape asking
        active: ColliderKind,
        /// Shape asked about
        other: ColliderKind,
    },
}

/// Collision response errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A body taking part in a collision has no usable mass
    #[error("Object {object:?} has invalid mass {mass}")]
    InvalidMass {
        /// Offending body
        object: ObjectId,
        /// Its mass
        mass: f32,
    },

    /// The momentum split would hand out more than the pair has
    #[error("Momentum split factor {factor} is out of range")]
    EnergyAccounting {
        /// Computed split factor
        factor: f32,
    },
}
