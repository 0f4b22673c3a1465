//! Math utilities and types
//!
//! Provides the vector, quaternion and transform types every other module
//! builds on.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Read-only view of anything that has a place in the world.
///
/// Cameras, colliders and render objects only ever read a transform through
/// this trait; the owning entity is the only one that mutates it.
pub trait Spatial {
    /// World position
    fn position(&self) -> Vec3;

    /// World rotation
    fn rotation(&self) -> Quat;

    /// Per-axis scale
    fn scale(&self) -> Vec3;

    /// Local +Z axis rotated into world space
    fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::z()
    }

    /// Local +Y axis rotated into world space
    fn up(&self) -> Vec3 {
        self.rotation() * Vec3::y()
    }

    /// Local +X axis rotated into world space
    fn left(&self) -> Vec3 {
        self.rotation() * Vec3::x()
    }
}

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a transform from all three components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder-style uniform scale override
    #[must_use]
    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::new(scale, scale, scale))
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Combine this transform with a child transform expressed in its local space
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            position: self.position + self.rotation * self.scale.component_mul(&other.position),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }
}

impl Spatial for Transform {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }
}

/// Drop the Z component
pub fn flatten(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Rotation angles about the X, Y and Z axes (radians) of a quaternion.
///
/// Backends that only take Euler angles (immediate-mode style rotate calls)
/// apply them in X, Y, Z order.
pub fn euler_angles(q: &Quat) -> Vec3 {
    let (x, y, z) = q.euler_angles();
    Vec3::new(x, y, z)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_axes() {
        let t = Transform::identity();
        assert_relative_eq!(t.forward(), Vec3::z(), epsilon = EPSILON);
        assert_relative_eq!(t.up(), Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(t.left(), Vec3::x(), epsilon = EPSILON);
    }

    #[test]
    fn test_axes_follow_rotation() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), constants::HALF_PI);
        let t = Transform::from_position_rotation(Vec3::new(4.0, 0.0, 0.0), rotation);

        // Position never leaks into the direction vectors
        assert_relative_eq!(t.forward(), Vec3::x(), epsilon = EPSILON);
        assert_relative_eq!(t.left(), -Vec3::z(), epsilon = EPSILON);
        assert_relative_eq!(t.up(), Vec3::y(), epsilon = EPSILON);
    }

    #[test]
    fn test_combine_applies_parent_scale_and_rotation() {
        let parent = Transform::from_position_rotation(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI),
        )
        .with_uniform_scale(2.0);
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));

        let world = parent.combine(&child);
        assert_relative_eq!(world.position, Vec3::new(1.0, 2.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(world.scale, Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_euler_angles_single_axis() {
        assert_relative_eq!(euler_angles(&Quat::identity()), Vec3::zeros(), epsilon = EPSILON);

        let q = Quat::from_axis_angle(&Vec3::z_axis(), 0.5);
        assert_relative_eq!(euler_angles(&q), Vec3::new(0.0, 0.0, 0.5), epsilon = EPSILON);
    }

    #[test]
    fn test_flatten_drops_z() {
        assert_eq!(flatten(Vec3::new(1.0, 2.0, 3.0)), Vec2::new(1.0, 2.0));
    }
}
