//! Game object
//!
//! A positioned entity that composes everything else: render slots, an
//! optional collider, an optional physics body, a user behaviour and a
//! container of extra sub-entities.
//!
//! Tick order: behaviour, collider refresh, gravity and damping, sub-entities,
//! collision response, integration. The collider therefore always holds this
//! tick's collisions before the body reads them, and sub-entities see the
//! damped velocity before the object moves.

use std::fmt;

use crate::foundation::math::{Quat, Spatial, Transform, Vec3};
use crate::game::{ObjectId, TickContext};
use crate::physics::{Collider, Collision, PhysicsObject};
use crate::render::{RenderObject, RenderSlot, ResourceLoader};
use crate::scene::{Container, LifecycleFlags, NodeId, TickError, Tickable};
use crate::spatial::{Cell, GridEntry};

/// User code run at the start of an object's tick
pub trait Behavior {
    /// Update `object` for this tick
    fn on_tick(&mut self, object: &mut GameObject, ctx: &mut TickContext) -> Result<(), TickError>;
}

impl<F> Behavior for F
where
    F: FnMut(&mut GameObject, &mut TickContext) -> Result<(), TickError>,
{
    fn on_tick(&mut self, object: &mut GameObject, ctx: &mut TickContext) -> Result<(), TickError> {
        self(object, ctx)
    }
}

/// A tickable, placeable entity
pub struct GameObject {
    /// World transform; the only place the object's position lives
    pub transform: Transform,

    /// Opaque tag stored alongside the object's grid cell
    pub metadata: i16,

    /// Collision shape
    pub collider: Option<Collider>,

    /// Physics body
    pub physics: Option<PhysicsObject>,

    id: NodeId,
    flags: LifecycleFlags,
    renders: Vec<RenderSlot>,
    children: Container,
    behavior: Option<Box<dyn Behavior>>,
    placed_cell: Option<Cell>,
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("position", &self.transform.position)
            .field("metadata", &self.metadata)
            .field("flags", &self.flags)
            .field("renders", &self.renders.len())
            .field("collider", &self.collider.as_ref().map(Collider::kind))
            .field("physics", &self.physics)
            .field("placed_cell", &self.placed_cell)
            .finish_non_exhaustive()
    }
}

impl Default for GameObject {
    fn default() -> Self {
        Self::new(Transform::identity())
    }
}

impl GameObject {
    /// Object at `transform` with nothing attached
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            metadata: 0,
            collider: None,
            physics: None,
            id: NodeId::next(),
            flags: LifecycleFlags::empty(),
            renders: Vec::new(),
            children: Container::default(),
            behavior: None,
            placed_cell: None,
        }
    }

    /// Object at `position` with identity rotation and unit scale
    pub fn at(position: Vec3) -> Self {
        Self::new(Transform::from_position(position))
    }

    /// Builder-style metadata tag
    #[must_use]
    pub fn with_metadata(mut self, metadata: i16) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builder-style render object
    #[must_use]
    pub fn with_render(mut self, render: RenderObject) -> Self {
        self.renders.push(RenderSlot::new(render));
        self
    }

    /// Builder-style collider
    #[must_use]
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    /// Builder-style physics body
    #[must_use]
    pub fn with_physics(mut self, physics: PhysicsObject) -> Self {
        self.physics = Some(physics);
        self
    }

    /// Builder-style behaviour
    #[must_use]
    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Attach a render object
    ///
    /// It is loaded with the object; one added after loading is drawn without
    /// a backend resource until the next load.
    pub fn add_render(&mut self, render: RenderObject) {
        self.renders.push(RenderSlot::new(render));
    }

    /// Render slots in draw order
    pub fn renders(&self) -> &[RenderSlot] {
        &self.renders
    }

    /// Attach a sub-entity; `false` if it is already attached
    pub fn add_child(&mut self, child: Box<dyn Tickable>) -> bool {
        self.children.add_child(child)
    }

    /// Detach a sub-entity
    pub fn remove_child(&mut self, id: NodeId) -> Option<Box<dyn Tickable>> {
        self.children.remove_child(id)
    }

    /// Sub-entities
    pub const fn children(&self) -> &Container {
        &self.children
    }

    /// Collisions found this tick
    pub fn collisions(&self) -> &[Collision] {
        match &self.collider {
            Some(collider) => collider.collisions(),
            None => &[],
        }
    }

    /// Current velocity, zero without a physics body
    pub fn velocity(&self) -> Vec3 {
        self.physics.as_ref().map_or_else(Vec3::zeros, |body| body.velocity)
    }

    /// Cell the object was last placed in, `None` if unplaced or displaced
    pub const fn placed_cell(&self) -> Option<Cell> {
        self.placed_cell
    }

    pub(crate) fn set_placed_cell(&mut self, cell: Option<Cell>) {
        self.placed_cell = cell;
    }

    /// Grid entry describing this object as `id`
    pub fn grid_entry(&self, id: ObjectId) -> GridEntry {
        let renders = self
            .renders
            .iter()
            .map(|slot| slot.visible(&self.transform))
            .collect();
        GridEntry::for_object(id, self.metadata, self.transform, renders)
    }

    fn run_behavior(&mut self, ctx: &mut TickContext) -> Result<(), TickError> {
        let Some(mut behavior) = self.behavior.take() else {
            return Ok(());
        };
        let result = behavior.on_tick(self, ctx);
        // Keep a behaviour installed during its own tick
        if self.behavior.is_none() {
            self.behavior = Some(behavior);
        }
        result
    }

    fn run_physics(&mut self, id: ObjectId, ctx: &mut TickContext) -> Result<(), TickError> {
        let segments = ctx.sim.circle_segments;
        let collisions: &[Collision] = match self.collider.as_mut() {
            Some(collider) => collider.refresh(id, &self.transform, &ctx.world, segments)?,
            None => &[],
        };

        if !collisions.is_empty() {
            let others: Vec<ObjectId> = collisions.iter().map(|hit| hit.other).collect();
            log::debug!("{:?} collided with {:?}", id, others);
        }

        if let Some(body) = self.physics.as_mut() {
            body.accelerate(&ctx.sim);
        }
        tick_sub_entities(&mut self.children, ctx)?;
        if let Some(body) = self.physics.as_mut() {
            body.resolve(id, &mut self.transform, collisions, ctx)?;
        }
        Ok(())
    }
}

/// Nested game objects are not placed, so they must not act as their owner
fn tick_sub_entities(children: &mut Container, ctx: &mut TickContext) -> Result<(), TickError> {
    let current = ctx.current_object();
    ctx.set_current_object(None);
    let result = children.tick(ctx);
    ctx.set_current_object(current);
    result
}

impl Spatial for GameObject {
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

impl Tickable for GameObject {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn load(&mut self, loader: &mut dyn ResourceLoader) -> bool {
        let reloading = self.flags.is_loaded();
        if !self.children.load(loader) && !self.children.is_loaded() {
            return false;
        }

        // Slots attached after the first load are picked up here too
        let mut fresh = Vec::new();
        let mut failed = false;
        for (index, slot) in self.renders.iter_mut().enumerate() {
            if slot.is_loaded() {
                continue;
            }
            match slot.load(loader) {
                Ok(()) => fresh.push(index),
                Err(err) => {
                    log::warn!("{:?} could not load render object: {}", self.id, err);
                    failed = true;
                    if !reloading {
                        break;
                    }
                }
            }
        }

        if reloading {
            return false;
        }
        if failed {
            for index in fresh {
                self.renders[index].unload(loader);
            }
            self.children.unload(loader);
            return false;
        }
        self.flags.insert(LifecycleFlags::LOADED);
        true
    }

    fn enable(&mut self) -> bool {
        if !self.flags.is_loaded() {
            return false;
        }
        if !self.children.enable() && !self.children.is_enabled() {
            return false;
        }
        if self.flags.is_enabled() {
            return false;
        }

        self.flags.insert(LifecycleFlags::ENABLED);
        true
    }

    /// Needs the scene to have set the current object on `ctx`; without one
    /// only the sub-entities tick.
    fn tick(&mut self, ctx: &mut TickContext) -> Result<(), TickError> {
        if !self.flags.is_enabled() {
            return Ok(());
        }

        match ctx.current_object() {
            Some(id) => {
                self.run_behavior(ctx)?;
                self.run_physics(id, ctx)
            }
            None => tick_sub_entities(&mut self.children, ctx),
        }
    }

    fn disable(&mut self) {
        if !self.flags.is_enabled() {
            return;
        }
        self.children.disable();
        self.flags.remove(LifecycleFlags::ENABLED);
    }

    fn unload(&mut self, loader: &mut dyn ResourceLoader) {
        if !self.flags.is_loaded() {
            return;
        }
        self.disable();
        self.children.unload(loader);
        for slot in &mut self.renders {
            slot.unload(loader);
        }
        self.flags.remove(LifecycleFlags::LOADED);
    }

    fn dispose(&mut self) {
        self.disable();
        self.children.dispose();
        self.behavior = None;
        if let Some(collider) = self.collider.as_mut() {
            collider.set_active(false);
        }
    }

    fn is_loaded(&self) -> bool {
        self.flags.is_loaded()
    }

    fn is_enabled(&self) -> bool {
        self.flags.is_enabled()
    }
}
