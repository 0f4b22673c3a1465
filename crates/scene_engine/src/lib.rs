//! # Scene Engine
//!
//! A small real-time scene engine: a lifecycle tree of game objects, a spatial
//! grid that indexes them by position and produces each frame's draw list, and
//! a 2D/3D collision layer with elastic physics response.
//!
//! ## Features
//!
//! - **Lifecycle tree**: load, enable, tick, disable, unload propagated through any depth
//! - **Spatial grid**: one occupant per integer cell, packed or nested storage
//! - **Collision**: rect, circle, sphere and inverted shapes with contact points
//! - **Physics**: gravity, damping and momentum-conserving elastic response
//! - **Backend agnostic**: drawing and resource loading go through traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Bounce;
//!
//! impl Application for Bounce {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         engine.scene.spawn(
//!             GameObject::at(Vec3::new(0.0, 10.0, 0.0))
//!                 .with_collider(Collider::circle())
//!                 .with_physics(PhysicsObject::new(1.0)),
//!         )?;
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = EngineConfig::default();
//!     config.tick.max_ticks = Some(100);
//!     Engine::run(config, &mut Bounce, &mut RecordingBackend::new())?;
//!     Ok(())
//! }
//! ```

pub mod foundation;
pub mod config;
pub mod scene;
pub mod render;
pub mod spatial;
pub mod physics;
pub mod game;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{Engine, EngineError, GameLoop};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineError, GameLoop,
        config::{Config, EngineConfig, GridKind},
        foundation::{
            math::{Vec2, Vec3, Quat, Mat4, Transform, Spatial},
            time::{TickClock, Stopwatch},
        },
        game::{Camera, GameObject, ObjectId, Projection, Scene, SimulationContext, TickContext},
        physics::{Collider, ColliderKind, Collision, PhysicsObject},
        render::{RecordingBackend, RenderBackend, RenderObject, RenderShape, ResourceLoader},
        scene::{Container, Tickable, TickError},
        spatial::{Cell, GridMatrix, RenderMatrix},
    };
}
