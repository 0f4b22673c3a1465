//! Elastic collision response
//!
//! Both bodies are resolved in the contact frame: the hit angle from the
//! active body to the contact point gives the collision normal, total
//! momentum along it is split by inverse mass ratio and each share is turned
//! back into a velocity by its own mass. Tangential velocity is untouched.

use crate::foundation::math::Vec3;
use crate::game::ObjectId;
use crate::physics::PhysicsError;

/// Velocity and mass of one body, as seen by the other side of a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Current velocity
    pub velocity: Vec3,
    /// Mass
    pub mass: f32,
}

impl BodyState {
    /// Momentum `velocity * mass`
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }

    /// Kinetic energy `0.5 * m * v²`
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}

/// Collision normal and hit angle for one contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactFrame {
    /// Unit vector from the active body toward the contact
    pub normal: Vec3,
    /// Angle of the normal in the XY plane (radians)
    pub hit_angle: f32,
}

impl ContactFrame {
    /// Frame for a body at `position` touching at `contact`
    ///
    /// Falls back to the direction of the other body when the contact sits on
    /// the active body's center. `None` if both are degenerate.
    pub fn new(position: Vec3, contact: Vec3, other_position: Vec3) -> Option<Self> {
        [contact - position, other_position - position]
            .into_iter()
            .find(|offset| offset.norm() > f32::EPSILON)
            .map(|offset| {
                let normal = offset.normalize();
                Self {
                    normal,
                    hit_angle: normal.y.atan2(normal.x),
                }
            })
    }
}

/// Share of the pair's momentum that goes to a body of `mass`: `1 / (1 + other / mass)`
pub fn split_factor(mass: f32, other_mass: f32) -> Result<f32, PhysicsError> {
    let factor = 1.0 / (1.0 + other_mass / mass);
    if !factor.is_finite() || factor > 1.0 {
        return Err(PhysicsError::EnergyAccounting { factor });
    }
    Ok(factor)
}

fn check_mass(object: ObjectId, mass: f32) -> Result<(), PhysicsError> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidMass { object, mass })
    }
}

/// Resolve a collision between two movable bodies
///
/// Returns the new velocities of `(a, b)`, or `None` when the bodies are
/// already separating along the normal.
pub fn elastic(
    a_id: ObjectId,
    a: BodyState,
    b_id: ObjectId,
    b: BodyState,
    frame: &ContactFrame,
) -> Result<Option<(Vec3, Vec3)>, PhysicsError> {
    check_mass(a_id, a.mass)?;
    check_mass(b_id, b.mass)?;

    let a_factor = split_factor(a.mass, b.mass)?;
    let b_factor = split_factor(b.mass, a.mass)?;

    let n = frame.normal;
    let a_normal = a.velocity.dot(&n);
    let b_normal = b.velocity.dot(&n);
    if a_normal - b_normal <= 0.0 {
        return Ok(None);
    }

    // Total momentum along the normal, split by inverse mass ratio
    let total = a.momentum().dot(&n) + b.momentum().dot(&n);
    let a_after = 2.0 * total * a_factor / a.mass - a_normal;
    let b_after = 2.0 * total * b_factor / b.mass - b_normal;

    let a_velocity = a.velocity + n * (a_after - a_normal);
    let b_velocity = b.velocity + n * (b_after - b_normal);

    if !a_velocity.iter().chain(b_velocity.iter()).all(|v| v.is_finite()) {
        return Err(PhysicsError::EnergyAccounting { factor: a_factor });
    }
    Ok(Some((a_velocity, b_velocity)))
}

/// Bounce off something without a physics body
///
/// The normal component is mirrored so the body keeps all its kinetic energy.
/// `None` when the body is not moving into the contact.
pub fn reflect(velocity: Vec3, frame: &ContactFrame) -> Option<Vec3> {
    let into = velocity.dot(&frame.normal);
    (into > 0.0).then(|| velocity - frame.normal * (2.0 * into))
}
