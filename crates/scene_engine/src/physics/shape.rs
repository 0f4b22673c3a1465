//! Collider shapes and pairwise intersection
//!
//! Every intersection goes through [`Probe::collides_with`], which dispatches
//! on the `(active, other)` shape pair. Some pairs only have an algorithm from
//! one side; those hand the query to the other probe with `recursive = true`,
//! and a recursive probe never hands it back.
//!
//! Shapes read their size from the owner's scale: rects span `scale.x` by
//! `scale.y`, circles and spheres use `scale.x` as the radius.

use std::fmt;

use crate::foundation::math::{constants, flatten, Transform, Vec3};
use crate::game::ObjectId;
use crate::physics::ColliderError;

/// Default number of circumference samples for the circle fallback
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 50;

/// Shape of a collider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColliderKind {
    /// Oriented rectangle in the XY plane
    Rect,
    /// Circle in the XY plane
    Circle,
    /// Box; declared, pair tests not available
    Cuboid,
    /// Sphere
    Sphere,
    /// Everything outside the wrapped shape
    Inverse(Box<ColliderKind>),
}

impl ColliderKind {
    /// Wrap a shape so every predicate is negated
    pub fn inverse(inner: Self) -> Self {
        Self::Inverse(Box::new(inner))
    }

    /// 2 for planar shapes, 3 for solids
    pub fn dimensions(&self) -> u8 {
        match self {
            Self::Rect | Self::Circle => 2,
            Self::Cuboid | Self::Sphere => 3,
            Self::Inverse(inner) => inner.dimensions(),
        }
    }
}

impl fmt::Display for ColliderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rect => write!(f, "rect"),
            Self::Circle => write!(f, "circle"),
            Self::Cuboid => write!(f, "cuboid"),
            Self::Sphere => write!(f, "sphere"),
            Self::Inverse(inner) => write!(f, "inverse {inner}"),
        }
    }
}

/// World-space view of one collider for a single tick
#[derive(Debug, Clone)]
pub struct Probe {
    /// Owning game object
    pub owner: ObjectId,

    /// Shape
    pub kind: ColliderKind,

    /// Owner's transform when the probe was taken
    pub transform: Transform,

    /// Samples used by the circle fallback
    pub segments: usize,
}

impl Probe {
    /// Probe with the default circle sampling
    pub fn new(owner: ObjectId, kind: ColliderKind, transform: Transform) -> Self {
        Self {
            owner,
            kind,
            transform,
            segments: DEFAULT_CIRCLE_SEGMENTS,
        }
    }

    /// Builder-style sample count override
    #[must_use]
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments.max(1);
        self
    }

    /// Radius of a circle or sphere
    pub fn radius(&self) -> f32 {
        self.transform.scale.x
    }

    /// The two extreme corners of a rect: center ± rotated half-scale
    pub fn corners(&self) -> [Vec3; 2] {
        let half = self.transform.rotation * (self.transform.scale * 0.5);
        [self.transform.position - half, self.transform.position + half]
    }

    /// Does this shape overlap `other`?
    ///
    /// `Some(contact)` means colliding. A probe never collides with another
    /// probe of the same owner. `z` is the plane the circle fallback samples
    /// in.
    pub fn collides_with(
        &self,
        other: &Self,
        recursive: bool,
        z: f32,
    ) -> Result<Option<Vec3>, ColliderError> {
        if self.owner == other.owner {
            return Ok(None);
        }

        if self.kind.dimensions() != other.kind.dimensions() {
            return Err(ColliderError::DimensionMismatch {
                active: self.kind.clone(),
                other: other.kind.clone(),
            });
        }

        match &self.kind {
            ColliderKind::Rect => self.rect_collides(other, recursive, z),
            ColliderKind::Circle => self.circle_collides(other, recursive, z),
            ColliderKind::Sphere => self.sphere_collides(other, recursive, z),
            ColliderKind::Cuboid => self.delegate_or_unsupported(other, recursive, z),
            // Negates a full two-sided answer, so `recursive` does not apply
            ColliderKind::Inverse(inner) => {
                let inner = self.with_kind(inner.as_ref().clone());
                Ok(match inner.overlaps(other, z)? {
                    Some(_) => None,
                    None => Some(other.transform.position),
                })
            }
        }
    }

    /// Is `point` strictly inside this shape?
    pub fn point_inside(&self, point: Vec3) -> Result<bool, ColliderError> {
        match &self.kind {
            ColliderKind::Rect => {
                let [a, b] = self.corners();
                let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
                let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
                Ok(min_x < point.x && point.x < max_x && min_y < point.y && point.y < max_y)
            }
            ColliderKind::Circle => {
                let distance = (flatten(point) - flatten(self.transform.position)).norm();
                Ok(distance < self.radius())
            }
            ColliderKind::Sphere => {
                Ok((point - self.transform.position).norm() < self.radius())
            }
            ColliderKind::Cuboid => Err(ColliderError::UnsupportedPoint(self.kind.clone())),
            ColliderKind::Inverse(inner) => {
                Ok(!self.with_kind(inner.as_ref().clone()).point_inside(point)?)
            }
        }
    }

    fn with_kind(&self, kind: ColliderKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Overlap asked from both sides
    ///
    /// A single `collides_with` may stop at "not detected from this side";
    /// only both sides missing means the shapes are apart.
    fn overlaps(&self, other: &Self, z: f32) -> Result<Option<Vec3>, ColliderError> {
        match self.collides_with(other, false, z)? {
            Some(contact) => Ok(Some(contact)),
            None => other.collides_with(self, false, z),
        }
    }

    fn rect_collides(
        &self,
        other: &Self,
        recursive: bool,
        z: f32,
    ) -> Result<Option<Vec3>, ColliderError> {
        if let Some(corner) = self.corner_inside(other)? {
            return Ok(Some(corner));
        }

        if recursive {
            return Ok(None);
        }
        other.collides_with(self, true, z)
    }

    fn corner_inside(&self, other: &Self) -> Result<Option<Vec3>, ColliderError> {
        for corner in self.corners() {
            if other.point_inside(corner)? {
                return Ok(Some(corner));
            }
        }
        Ok(None)
    }

    fn circle_collides(
        &self,
        other: &Self,
        recursive: bool,
        z: f32,
    ) -> Result<Option<Vec3>, ColliderError> {
        match (&other.kind, recursive) {
            (ColliderKind::Circle, _) => {
                let offset = flatten(other.transform.position) - flatten(self.transform.position);
                let distance = offset.norm();
                if distance >= self.radius() + other.radius() {
                    return Ok(None);
                }

                let mut contact = self.transform.position;
                if distance > f32::EPSILON {
                    let normal = offset / distance * self.radius();
                    contact.x += normal.x;
                    contact.y += normal.y;
                }
                Ok(Some(contact))
            }
            (ColliderKind::Rect, false) => match other.corner_inside(self)? {
                Some(corner) => Ok(Some(corner)),
                None => self.sample_circumference(other, z),
            },
            (_, true) => self.sample_circumference(other, z),
            (_, false) => other.collides_with(self, true, z),
        }
    }

    /// Discretised fallback: test points around the circle against `other`
    fn sample_circumference(&self, other: &Self, z: f32) -> Result<Option<Vec3>, ColliderError> {
        let center = self.transform.position;
        let radius = self.radius();

        for step in 0..self.segments {
            #[allow(clippy::cast_precision_loss)]
            let angle = constants::TAU * step as f32 / self.segments as f32;
            let point = Vec3::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                z,
            );
            if other.point_inside(point)? {
                return Ok(Some(point));
            }
        }
        Ok(None)
    }

    fn sphere_collides(
        &self,
        other: &Self,
        recursive: bool,
        z: f32,
    ) -> Result<Option<Vec3>, ColliderError> {
        if other.kind != ColliderKind::Sphere {
            return self.delegate_or_unsupported(other, recursive, z);
        }

        let offset = other.transform.position - self.transform.position;
        let distance = offset.norm();
        if distance >= self.radius() + other.radius() {
            return Ok(None);
        }

        let contact = if distance > f32::EPSILON {
            self.transform.position + offset / distance * self.radius()
        } else {
            self.transform.position
        };
        Ok(Some(contact))
    }

    /// Let an inverse shape answer once; every other pair is not available
    fn delegate_or_unsupported(
        &self,
        other: &Self,
        recursive: bool,
        z: f32,
    ) -> Result<Option<Vec3>, ColliderError> {
        if !recursive && matches!(other.kind, ColliderKind::Inverse(_)) {
            return other.collides_with(self, true, z);
        }
        Err(ColliderError::UnsupportedPair {
            active: self.kind.clone(),
            other: other.kind.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    const EPSILON: f32 = 1e-5;

    struct Owners(SlotMap<ObjectId, ()>);

    impl Owners {
        fn new() -> Self {
            Self(SlotMap::with_key())
        }

        fn probe(&mut self, kind: ColliderKind, position: Vec3, scale: f32) -> Probe {
            let transform = Transform::from_position(position).with_uniform_scale(scale);
            Probe::new(self.0.insert(()), kind, transform)
        }

        fn rect(&mut self, position: Vec3, size: Vec3) -> Probe {
            let transform = Transform::from_position(position).with_scale(size);
            Probe::new(self.0.insert(()), ColliderKind::Rect, transform)
        }
    }

    #[test]
    fn test_circle_pair_is_exact_and_symmetric() {
        let mut owners = Owners::new();
        let a = owners.probe(ColliderKind::Circle, Vec3::zeros(), 3.0);
        let b = owners.probe(ColliderKind::Circle, Vec3::new(5.0, 0.0, 0.0), 3.0);
        let far = owners.probe(ColliderKind::Circle, Vec3::new(7.0, 0.0, 0.0), 1.0);

        let contact = a.collides_with(&b, false, 0.0).unwrap().unwrap();
        assert_relative_eq!(contact, Vec3::new(3.0, 0.0, 0.0), epsilon = EPSILON);
        assert!(b.collides_with(&a, false, 0.0).unwrap().is_some());

        assert!(a.collides_with(&far, false, 0.0).unwrap().is_none());
        assert!(far.collides_with(&a, false, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_touching_circles_do_not_collide() {
        let mut owners = Owners::new();
        let a = owners.probe(ColliderKind::Circle, Vec3::zeros(), 2.0);
        let b = owners.probe(ColliderKind::Circle, Vec3::new(3.0, 0.0, 0.0), 1.0);

        assert!(a.collides_with(&b, false, 0.0).unwrap().is_none());
        assert!(b.collides_with(&a, false, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_never_collides_with_itself() {
        let mut owners = Owners::new();
        let kinds = [
            ColliderKind::Rect,
            ColliderKind::Circle,
            ColliderKind::Cuboid,
            ColliderKind::Sphere,
        ];
        for kind in kinds {
            let probe = owners.probe(kind, Vec3::zeros(), 1.0);
            assert!(probe.collides_with(&probe, false, 0.0).unwrap().is_none());
        }

        let inverse = owners.probe(ColliderKind::inverse(ColliderKind::Circle), Vec3::zeros(), 1.0);
        assert!(inverse.collides_with(&inverse, false, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_rect_point_inside_is_strict() {
        let mut owners = Owners::new();
        let rect = owners.rect(Vec3::zeros(), Vec3::new(2.0, 4.0, 0.0));

        assert!(rect.point_inside(Vec3::new(0.5, 1.5, 0.0)).unwrap());
        assert!(!rect.point_inside(Vec3::new(1.0, 0.0, 0.0)).unwrap());
        assert!(!rect.point_inside(Vec3::new(0.0, -2.0, 0.0)).unwrap());
        assert!(!rect.point_inside(Vec3::new(3.0, 0.0, 0.0)).unwrap());
    }

    #[test]
    fn test_rect_boundary_consistent_with_overlap() {
        let mut owners = Owners::new();
        let a = owners.rect(Vec3::zeros(), Vec3::new(2.0, 2.0, 0.0));
        // b's lower-left corner sits exactly on a's upper-right corner
        let touching = owners.rect(Vec3::new(2.0, 2.0, 0.0), Vec3::new(2.0, 2.0, 0.0));
        let overlapping = owners.rect(Vec3::new(1.5, 1.5, 0.0), Vec3::new(2.0, 2.0, 0.0));

        let [corner, _] = touching.corners();
        assert!(!a.point_inside(corner).unwrap());
        assert!(a.collides_with(&touching, false, 0.0).unwrap().is_none());
        assert!(touching.collides_with(&a, false, 0.0).unwrap().is_none());

        let contact = a.collides_with(&overlapping, false, 0.0).unwrap().unwrap();
        assert!(overlapping.point_inside(contact).unwrap());
        assert!(overlapping.collides_with(&a, false, 0.0).unwrap().is_some());
    }

    #[test]
    fn test_rect_delegates_once() {
        let mut owners = Owners::new();
        // Small rect fully inside a big one: only the big one's corners miss
        let big = owners.rect(Vec3::zeros(), Vec3::new(10.0, 10.0, 0.0));
        let small = owners.rect(Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));

        assert!(big.collides_with(&small, false, 0.0).unwrap().is_some());
        assert!(big.collides_with(&small, true, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_circle_against_rect() {
        let mut owners = Owners::new();
        let circle = owners.probe(ColliderKind::Circle, Vec3::zeros(), 1.0);
        // Edge crosses the circle but no rect corner is inside it
        let wall = owners.rect(Vec3::new(1.5, 0.0, 0.0), Vec3::new(1.2, 10.0, 0.0));
        let away = owners.rect(Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0));

        let contact = circle.collides_with(&wall, false, 0.0).unwrap().unwrap();
        assert!(wall.point_inside(contact).unwrap());
        assert!(wall.collides_with(&circle, false, 0.0).unwrap().is_some());

        assert!(circle.collides_with(&away, false, 0.0).unwrap().is_none());
        assert!(away.collides_with(&circle, false, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_rotated_rect_corners() {
        let mut owners = Owners::new();
        let mut rect = owners.rect(Vec3::zeros(), Vec3::new(2.0, 2.0, 0.0));
        rect.transform.rotation = Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI);

        let [a, b] = rect.corners();
        assert_relative_eq!(a, Vec3::new(1.0, -1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(b, Vec3::new(-1.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_spheres() {
        let mut owners = Owners::new();
        let a = owners.probe(ColliderKind::Sphere, Vec3::zeros(), 1.0);
        let b = owners.probe(ColliderKind::Sphere, Vec3::new(0.0, 0.0, 1.5), 1.0);
        let c = owners.probe(ColliderKind::Sphere, Vec3::new(0.0, 0.0, 2.0), 1.0);

        let contact = a.collides_with(&b, false, 0.0).unwrap().unwrap();
        assert_relative_eq!(contact, Vec3::new(0.0, 0.0, 1.0), epsilon = EPSILON);
        assert!(a.collides_with(&c, false, 0.0).unwrap().is_none());
        assert!(a.point_inside(Vec3::new(0.5, 0.5, 0.0)).unwrap());
    }

    #[test]
    fn test_cuboid_pairs_are_unsupported() {
        let mut owners = Owners::new();
        let cuboid = owners.probe(ColliderKind::Cuboid, Vec3::zeros(), 1.0);
        let other = owners.probe(ColliderKind::Cuboid, Vec3::new(0.5, 0.0, 0.0), 1.0);
        let sphere = owners.probe(ColliderKind::Sphere, Vec3::zeros(), 1.0);

        assert!(matches!(
            cuboid.collides_with(&other, false, 0.0),
            Err(ColliderError::UnsupportedPair { .. })
        ));
        assert!(matches!(
            sphere.collides_with(&cuboid, false, 0.0),
            Err(ColliderError::UnsupportedPair { .. })
        ));
        assert!(matches!(
            cuboid.point_inside(Vec3::zeros()),
            Err(ColliderError::UnsupportedPoint(ColliderKind::Cuboid))
        ));
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let mut owners = Owners::new();
        let circle = owners.probe(ColliderKind::Circle, Vec3::zeros(), 1.0);
        let sphere = owners.probe(ColliderKind::Sphere, Vec3::zeros(), 1.0);

        assert!(matches!(
            circle.collides_with(&sphere, false, 0.0),
            Err(ColliderError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_inverse_negates() {
        let mut owners = Owners::new();
        let arena = owners.probe(ColliderKind::inverse(ColliderKind::Circle), Vec3::zeros(), 10.0);
        let inside = owners.probe(ColliderKind::Circle, Vec3::new(2.0, 0.0, 0.0), 1.0);
        let escaping = owners.probe(ColliderKind::Circle, Vec3::new(20.0, 0.0, 0.0), 1.0);

        assert!(arena.collides_with(&inside, false, 0.0).unwrap().is_none());
        assert!(arena.collides_with(&escaping, false, 0.0).unwrap().is_some());
        assert!(inside.collides_with(&arena, false, 0.0).unwrap().is_none());
        assert!(escaping.collides_with(&arena, false, 0.0).unwrap().is_some());

        assert!(!arena.point_inside(Vec3::new(1.0, 0.0, 0.0)).unwrap());
        assert!(arena.point_inside(Vec3::new(11.0, 0.0, 0.0)).unwrap());
    }

    #[test]
    fn test_circle_inside_inverse_rect_agrees_both_ways() {
        let mut owners = Owners::new();
        let mut arena = owners.rect(Vec3::zeros(), Vec3::new(10.0, 10.0, 0.0));
        arena.kind = ColliderKind::inverse(ColliderKind::Rect);
        let ball = owners.probe(ColliderKind::Circle, Vec3::zeros(), 1.0);
        let outside = owners.probe(ColliderKind::Circle, Vec3::new(20.0, 0.0, 0.0), 1.0);

        // Only the circle's own sampling sees the rect around it
        assert!(ball.collides_with(&arena, false, 0.0).unwrap().is_none());
        assert!(arena.collides_with(&ball, false, 0.0).unwrap().is_none());
        assert!(arena.collides_with(&ball, true, 0.0).unwrap().is_none());

        assert!(outside.collides_with(&arena, false, 0.0).unwrap().is_some());
        assert!(arena.collides_with(&outside, false, 0.0).unwrap().is_some());
    }
}
