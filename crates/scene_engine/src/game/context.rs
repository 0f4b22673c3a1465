//! Simulation and per-tick context
//!
//! Everything a tick needs that is not owned by the entity being ticked is
//! passed explicitly through a [`TickContext`]: the physics constants, the
//! tick number and a snapshot of the world taken at the start of the tick.

use std::time::Duration;

use slotmap::SecondaryMap;

use crate::config::EngineConfig;
use crate::foundation::math::Vec3;
use crate::game::ObjectId;
use crate::physics::{BodyState, Probe, DEFAULT_CIRCLE_SEGMENTS};

/// Physics constants shared by every body in a scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationContext {
    /// Global gravity vector
    pub gravity: Vec3,

    /// Length of one tick in milliseconds; integration scales by `tick / 100`
    pub tick_duration_ms: f32,

    /// Velocity damping for bodies without their own inertia
    pub inertia: f32,

    /// Speeds at or below this snap to zero
    pub deadzone: f32,

    /// Samples for the circle collision fallback
    pub circle_segments: usize,
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self {
            gravity: Vec3::zeros(),
            tick_duration_ms: 20.0,
            inertia: 0.93,
            deadzone: 0.09,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
        }
    }
}

impl SimulationContext {
    /// Build from engine configuration
    #[allow(clippy::cast_precision_loss)]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            gravity: config.physics.gravity_vector(),
            tick_duration_ms: config.tick.tick_time_ms as f32,
            inertia: config.physics.inertia,
            deadzone: config.physics.deadzone,
            circle_segments: config.physics.circle_segments,
        }
    }

    /// Integration step: `tick_duration_ms / 100`
    pub fn step_scale(&self) -> f32 {
        self.tick_duration_ms / 100.0
    }
}

/// Colliders and bodies of every placed object, taken at the start of a tick
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    probes: Vec<Probe>,
    bodies: SecondaryMap<ObjectId, BodyState>,
}

impl WorldSnapshot {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a collider
    pub fn add_probe(&mut self, probe: Probe) {
        self.probes.push(probe);
    }

    /// Record a physics body
    pub fn add_body(&mut self, object: ObjectId, body: BodyState) {
        self.bodies.insert(object, body);
    }

    /// Every recorded collider
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Collider of one object
    pub fn probe(&self, object: ObjectId) -> Option<&Probe> {
        self.probes.iter().find(|probe| probe.owner == object)
    }

    /// Physics body of one object, `None` if it has none (immovable)
    pub fn body(&self, object: ObjectId) -> Option<BodyState> {
        self.bodies.get(object).copied()
    }

    /// Update a body's velocity in the snapshot
    pub fn set_velocity(&mut self, object: ObjectId, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(object) {
            body.velocity = velocity;
        }
    }
}

/// Value passed to every tick hook
#[derive(Debug, Clone)]
pub struct TickContext {
    /// Physics constants
    pub sim: SimulationContext,

    /// Number of the tick being run, starting at 1
    pub tick: u64,

    /// Duration of the previous tick
    pub elapsed: Duration,

    /// State of the world at the start of this tick
    pub world: WorldSnapshot,

    current: Option<ObjectId>,
    pending: Vec<(ObjectId, Vec3)>,
}

impl TickContext {
    /// Context for a first tick with an empty world
    pub fn new(sim: SimulationContext) -> Self {
        Self {
            sim,
            tick: 1,
            elapsed: Duration::ZERO,
            world: WorldSnapshot::new(),
            current: None,
            pending: Vec::new(),
        }
    }

    /// Builder-style world snapshot
    #[must_use]
    pub fn with_world(mut self, world: WorldSnapshot) -> Self {
        self.world = world;
        self
    }

    /// Game object currently being ticked
    pub const fn current_object(&self) -> Option<ObjectId> {
        self.current
    }

    /// Mark which game object is being ticked
    pub fn set_current_object(&mut self, object: Option<ObjectId>) {
        self.current = object;
    }

    /// Change another body's velocity
    ///
    /// The snapshot sees the new value immediately; the scene applies it to
    /// the body itself once the current object finishes its tick.
    pub fn write_velocity(&mut self, object: ObjectId, velocity: Vec3) {
        self.world.set_velocity(object, velocity);
        self.pending.push((object, velocity));
    }

    /// Drain queued velocity writes
    pub fn take_pending(&mut self) -> Vec<(ObjectId, Vec3)> {
        std::mem::take(&mut self.pending)
    }
}
