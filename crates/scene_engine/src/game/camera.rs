//! Camera
//!
//! Anything implementing [`Spatial`] can be used as the draw camera; this
//! type adds the projection parameters a backend needs to build matrices.

use nalgebra::{Orthographic3, Perspective3, Point3};
use thiserror::Error;

use crate::foundation::math::{Mat4, Quat, Spatial, Transform, Vec3};

/// Camera errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Metadata tag does not name a projection
    #[error("Metadata {0} does not name a camera projection")]
    UnknownProjection(i16),
}

/// Projection model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Perspective with a vertical field of view
    Perspective,
    /// Orthographic with a fixed view volume
    Orthographic,
}

impl TryFrom<i16> for Projection {
    type Error = CameraError;

    fn try_from(metadata: i16) -> Result<Self, Self::Error> {
        match metadata {
            0 => Ok(Self::Perspective),
            1 => Ok(Self::Orthographic),
            other => Err(CameraError::UnknownProjection(other)),
        }
    }
}

impl From<Projection> for i16 {
    fn from(projection: Projection) -> Self {
        match projection {
            Projection::Perspective => 0,
            Projection::Orthographic => 1,
        }
    }
}

/// Camera with projection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Placement
    pub transform: Transform,
    /// Projection model
    pub projection: Projection,
    /// Orthographic view width
    pub width: f32,
    /// Orthographic view height
    pub height: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Transform::identity(), Projection::Perspective)
    }
}

impl Camera {
    /// Camera with the default view volume
    pub fn new(transform: Transform, projection: Projection) -> Self {
        Self {
            transform,
            projection,
            width: 160.0,
            height: 90.0,
            fov: 80.0,
            near: 10.0,
            far: 1000.0,
        }
    }

    /// Camera whose projection is picked by a metadata tag (0 perspective, 1 orthographic)
    pub fn from_metadata(transform: Transform, metadata: i16) -> Result<Self, CameraError> {
        Ok(Self::new(transform, Projection::try_from(metadata)?))
    }

    /// Metadata tag for this camera's projection
    pub fn metadata(&self) -> i16 {
        self.projection.into()
    }

    /// Width over height of the view volume
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// World-to-view matrix looking along the camera's forward axis
    pub fn view_matrix(&self) -> Mat4 {
        let eye = Point3::from(self.transform.position);
        let target = eye + self.forward();
        Mat4::look_at_rh(&eye, &target, &self.up())
    }

    /// View-to-clip matrix for a viewport of the given aspect ratio
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective => {
                let fov = self.fov.to_radians();
                Perspective3::new(aspect, fov, self.near, self.far).to_homogeneous()
            }
            Projection::Orthographic => {
                let half_width = self.width * 0.5;
                let half_height = self.height * 0.5;
                Orthographic3::new(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
                .to_homogeneous()
            }
        }
    }
}

impl Spatial for Camera {
    fn position(&self) -> Vec3 {
        self.transform.position
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    fn scale(&self) -> Vec3 {
        self.transform.scale
    }
}
