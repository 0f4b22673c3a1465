//! Physics body
//!
//! Each tick a body runs, in order: gravity, inertia damping, collision
//! response against its collider's collisions, then integration into the
//! owner's transform. The first two and the last two are split into
//! [`PhysicsObject::accelerate`] and [`PhysicsObject::resolve`] so the owning
//! game object can tick its sub-entities in between.

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::game::{ObjectId, SimulationContext, TickContext};
use crate::physics::response::{self, BodyState, ContactFrame};
use crate::physics::{Collision, PhysicsError};

/// Velocity, spin and mass of one game object
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsObject {
    /// Linear velocity, units per 100 ms
    pub velocity: Vec3,

    /// Rotation applied per 100 ms
    pub rotation_velocity: Quat,

    /// Mass; must be positive for any collision involving this body
    pub mass: f32,

    /// Per-body damping factor; `None` uses the scene default
    pub inertia: Option<f32>,
}

impl Default for PhysicsObject {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PhysicsObject {
    /// Body at rest
    pub fn new(mass: f32) -> Self {
        Self {
            velocity: Vec3::zeros(),
            rotation_velocity: Quat::identity(),
            mass,
            inertia: None,
        }
    }

    /// Builder-style initial velocity
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder-style spin
    #[must_use]
    pub fn with_rotation_velocity(mut self, rotation_velocity: Quat) -> Self {
        self.rotation_velocity = rotation_velocity;
        self
    }

    /// Builder-style damping override (1.0 keeps all velocity)
    #[must_use]
    pub fn with_inertia(mut self, inertia: f32) -> Self {
        self.inertia = Some(inertia);
        self
    }

    /// Snapshot for the other side of a collision
    pub fn state(&self) -> BodyState {
        BodyState {
            velocity: self.velocity,
            mass: self.mass,
        }
    }

    /// Kinetic energy `0.5 * m * v²`
    pub fn kinetic_energy(&self) -> f32 {
        self.state().kinetic_energy()
    }

    /// Add an acceleration to the velocity
    ///
    /// The force is applied squared, component by component. This matches the
    /// engine's long-standing gravity behaviour and drops the sign of each
    /// component.
    pub fn apply_acceleration(&mut self, force: Vec3) {
        self.velocity += force.component_mul(&force);
    }

    /// Run one tick of motion for the body owned by `owner`
    pub fn step(
        &mut self,
        owner: ObjectId,
        transform: &mut Transform,
        collisions: &[Collision],
        ctx: &mut TickContext,
    ) -> Result<(), PhysicsError> {
        self.accelerate(&ctx.sim);
        self.resolve(owner, transform, collisions, ctx)
    }

    /// Gravity, then inertia damping or the deadzone snap
    pub fn accelerate(&mut self, sim: &SimulationContext) {
        if sim.gravity != Vec3::zeros() {
            self.apply_acceleration(sim.gravity);
        }

        if self.velocity.norm() > sim.deadzone {
            self.velocity *= self.inertia.unwrap_or(sim.inertia);
        } else {
            self.velocity = Vec3::zeros();
        }
    }

    /// Collision response, then integration into `transform`
    ///
    /// Publishes the final velocity to the tick's world so later objects see it.
    pub fn resolve(
        &mut self,
        owner: ObjectId,
        transform: &mut Transform,
        collisions: &[Collision],
        ctx: &mut TickContext,
    ) -> Result<(), PhysicsError> {
        if !collisions.is_empty() && self.velocity != Vec3::zeros() {
            ctx.world.set_velocity(owner, self.velocity);
            for collision in collisions {
                self.respond(owner, transform, collision, ctx)?;
            }
        }

        let scale = ctx.sim.step_scale();
        transform.position += self.velocity * scale;
        if self.rotation_velocity != Quat::identity() {
            transform.rotation *= self.rotation_velocity.powf(scale);
        }

        ctx.world.set_velocity(owner, self.velocity);
        Ok(())
    }

    fn respond(
        &mut self,
        owner: ObjectId,
        transform: &Transform,
        collision: &Collision,
        ctx: &mut TickContext,
    ) -> Result<(), PhysicsError> {
        let other_position = ctx
            .world
            .probe(collision.other)
            .map_or(collision.contact, |probe| probe.transform.position);

        let Some(frame) =
            ContactFrame::new(transform.position, collision.contact, other_position)
        else {
            return Ok(());
        };

        match ctx.world.body(collision.other) {
            Some(other) => {
                if let Some((mine, theirs)) =
                    response::elastic(owner, self.state(), collision.other, other, &frame)?
                {
                    log::trace!(
                        "{:?} hit {:?} at {:.2} rad: {:?} -> {:?}",
                        owner,
                        collision.other,
                        frame.hit_angle,
                        self.velocity,
                        mine
                    );
                    self.velocity = mine;
                    ctx.world.set_velocity(owner, mine);
                    ctx.write_velocity(collision.other, theirs);
                }
            }
            None => {
                if let Some(bounced) = response::reflect(self.velocity, &frame) {
                    self.velocity = bounced;
                    ctx.world.set_velocity(owner, bounced);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants;
    use crate::game::{SimulationContext, WorldSnapshot};
    use crate::physics::{ColliderKind, Probe};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    const EPSILON: f32 = 1e-5;

    fn ids() -> (ObjectId, ObjectId) {
        let mut arena: SlotMap<ObjectId, ()> = SlotMap::with_key();
        (arena.insert(()), arena.insert(()))
    }

    #[test]
    fn test_gravity_is_applied_squared() {
        let (owner, _) = ids();
        let mut body = PhysicsObject::new(1.0).with_inertia(1.0);
        let mut ctx = TickContext::new(SimulationContext {
            gravity: Vec3::new(0.0, -2.0, 0.0),
            ..Default::default()
        });

        let mut transform = Transform::identity();
        body.step(owner, &mut transform, &[], &mut ctx).unwrap();

        assert_relative_eq!(body.velocity, Vec3::new(0.0, 4.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(transform.position, Vec3::new(0.0, 0.8, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_inertia_and_deadzone() {
        let (owner, _) = ids();
        let mut ctx = TickContext::new(SimulationContext::default());
        let mut transform = Transform::identity();

        let mut moving = PhysicsObject::new(1.0).with_velocity(Vec3::new(1.0, 0.0, 0.0));
        moving.step(owner, &mut transform, &[], &mut ctx).unwrap();
        assert_relative_eq!(moving.velocity.x, 0.93, epsilon = EPSILON);

        let mut creeping = PhysicsObject::new(1.0).with_velocity(Vec3::new(0.05, 0.05, 0.0));
        creeping.step(owner, &mut transform, &[], &mut ctx).unwrap();
        assert_eq!(creeping.velocity, Vec3::zeros());
    }

    #[test]
    fn test_spin_integrates_into_rotation() {
        let (owner, _) = ids();
        let mut ctx = TickContext::new(SimulationContext {
            tick_duration_ms: 100.0,
            ..Default::default()
        });
        let spin = Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI);
        let mut body = PhysicsObject::new(1.0).with_rotation_velocity(spin);
        let mut transform = Transform::identity();

        body.step(owner, &mut transform, &[], &mut ctx).unwrap();
        assert_relative_eq!(transform.rotation.angle(), constants::HALF_PI, epsilon = EPSILON);
    }

    #[test]
    fn test_head_on_collision_swaps_and_queues_write() {
        let (a, b) = ids();
        let mut world = WorldSnapshot::new();
        let b_at = Transform::from_position(Vec3::new(2.0, 0.0, 0.0));
        world.add_probe(Probe::new(b, ColliderKind::Circle, b_at));
        world.add_body(a, BodyState { velocity: Vec3::new(1.0, 0.0, 0.0), mass: 1.0 });
        world.add_body(b, BodyState { velocity: Vec3::new(-1.0, 0.0, 0.0), mass: 1.0 });
        let mut ctx = TickContext::new(SimulationContext::default()).with_world(world);

        let mut body = PhysicsObject::new(1.0)
            .with_velocity(Vec3::new(1.0, 0.0, 0.0))
            .with_inertia(1.0);
        let mut transform = Transform::identity();
        let collision = Collision { active: a, other: b, contact: Vec3::new(1.0, 0.0, 0.0) };

        body.step(a, &mut transform, &[collision], &mut ctx).unwrap();

        assert_relative_eq!(body.velocity, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
        let pending = ctx.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, b);
        assert_relative_eq!(pending[0].1, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(transform.position, Vec3::new(-0.2, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_immovable_other_reflects() {
        let (a, wall) = ids();
        let mut world = WorldSnapshot::new();
        let wall_at = Transform::from_position(Vec3::new(3.0, 0.0, 0.0));
        world.add_probe(Probe::new(wall, ColliderKind::Rect, wall_at));
        let mut ctx = TickContext::new(SimulationContext::default()).with_world(world);

        let mut body = PhysicsObject::new(2.0)
            .with_velocity(Vec3::new(1.0, 1.0, 0.0))
            .with_inertia(1.0);
        let energy = body.kinetic_energy();
        let mut transform = Transform::identity();
        let collision = Collision { active: a, other: wall, contact: Vec3::new(1.0, 0.0, 0.0) };

        body.step(a, &mut transform, &[collision], &mut ctx).unwrap();

        assert_relative_eq!(body.velocity, Vec3::new(-1.0, 1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(body.kinetic_energy(), energy, epsilon = EPSILON);
        assert!(ctx.take_pending().is_empty());
    }

    #[test]
    fn test_massless_other_is_fatal() {
        let (a, b) = ids();
        let mut world = WorldSnapshot::new();
        world.add_body(b, BodyState { velocity: Vec3::zeros(), mass: 0.0 });
        let mut ctx = TickContext::new(SimulationContext::default()).with_world(world);

        let mut body = PhysicsObject::new(1.0).with_velocity(Vec3::new(1.0, 0.0, 0.0));
        let collision = Collision { active: a, other: b, contact: Vec3::new(0.5, 0.0, 0.0) };

        let err = body
            .step(a, &mut Transform::identity(), &[collision], &mut ctx)
            .unwrap_err();
        assert_eq!(err, PhysicsError::InvalidMass { object: b, mass: 0.0 });
    }
}
