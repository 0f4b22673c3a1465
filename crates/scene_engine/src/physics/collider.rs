//! Collider component
//!
//! A collider belongs to exactly one game object. Each tick an active collider
//! throws away its collision set and rebuilds it by testing its own probe
//! against every other probe in the world snapshot.

use crate::foundation::math::{Transform, Vec3};
use crate::game::{ObjectId, WorldSnapshot};
use crate::physics::{ColliderError, ColliderKind, Probe};

/// One detected overlap, valid for the tick it was found in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Object whose collider found the overlap
    pub active: ObjectId,
    /// Object it overlaps
    pub other: ObjectId,
    /// Contact point reported by the shape test
    pub contact: Vec3,
}

/// Collision shape attached to a game object
#[derive(Debug, Clone)]
pub struct Collider {
    kind: ColliderKind,
    active: bool,
    collisions: Vec<Collision>,
}

impl Collider {
    /// Active collider of the given shape
    pub fn new(kind: ColliderKind) -> Self {
        Self {
            kind,
            active: true,
            collisions: Vec::new(),
        }
    }

    /// Shorthand for a circle collider
    pub fn circle() -> Self {
        Self::new(ColliderKind::Circle)
    }

    /// Shorthand for a rect collider
    pub fn rect() -> Self {
        Self::new(ColliderKind::Rect)
    }

    /// Collider that other objects can hit but which never looks for hits itself
    pub fn passive(kind: ColliderKind) -> Self {
        Self {
            active: false,
            ..Self::new(kind)
        }
    }

    /// Shape
    pub fn kind(&self) -> &ColliderKind {
        &self.kind
    }

    /// Whether this collider refreshes its collision set each tick
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Turn per-tick refresh on or off
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.collisions.clear();
        }
    }

    /// Overlaps found this tick
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Whether this tick found an overlap with `other`
    pub fn is_colliding_with(&self, other: ObjectId) -> bool {
        self.collisions.iter().any(|collision| collision.other == other)
    }

    /// Probe for this collider at `transform`
    pub fn probe(&self, owner: ObjectId, transform: Transform, segments: usize) -> Probe {
        Probe::new(owner, self.kind.clone(), transform).with_segments(segments)
    }

    /// Rebuild the collision set against every probe in `world`
    ///
    /// Inactive colliders keep an empty set.
    pub fn refresh(
        &mut self,
        owner: ObjectId,
        transform: &Transform,
        world: &WorldSnapshot,
        segments: usize,
    ) -> Result<&[Collision], ColliderError> {
        self.collisions.clear();
        if !self.active {
            return Ok(self.collisions.as_slice());
        }

        let probe = self.probe(owner, *transform, segments);
        for other in world.probes() {
            if other.owner == owner || self.is_colliding_with(other.owner) {
                continue;
            }

            if let Some(contact) = probe.collides_with(other, false, transform.position.z)? {
                self.collisions.push(Collision {
                    active: owner,
                    other: other.owner,
                    contact,
                });
            }
        }

        Ok(self.collisions.as_slice())
    }
}
