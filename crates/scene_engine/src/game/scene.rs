//! Scene driver
//!
//! Owns the game objects, keeps the render matrix in sync with their
//! positions and moves the whole tree through the lifecycle.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slotmap::SlotMap;

use crate::config::EngineConfig;
use crate::foundation::math::Spatial;
use crate::game::{GameObject, ObjectId, SimulationContext, TickContext, WorldSnapshot};
use crate::render::{BackendResult, RenderBackend, ResourceLoader};
use crate::scene::{LifecycleFlags, TickError, Tickable};
use crate::spatial::{Cell, GridError, GridMatrix, RenderMatrix};

/// Shared switch that keeps a scene's loop running
///
/// Clones observe the same flag, so another thread can stop the loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Whether the loop should keep running
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Ask the loop to stop after the current tick
    pub fn shutdown(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub(crate) fn activate(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// The root of the entity tree
pub struct Scene {
    objects: SlotMap<ObjectId, GameObject>,
    order: Vec<ObjectId>,
    render_matrix: RenderMatrix,
    sim: SimulationContext,
    flags: LifecycleFlags,
    active: ShutdownHandle,
    tick: u64,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("children", &self.order.len())
            .field("arena", &self.objects.len())
            .field("render_matrix", &self.render_matrix)
            .field("flags", &self.flags)
            .field("tick", &self.tick)
            .finish()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SimulationContext::default(), RenderMatrix::default())
    }
}

impl Scene {
    /// Empty, unloaded scene
    pub fn new(sim: SimulationContext, render_matrix: RenderMatrix) -> Self {
        Self {
            objects: SlotMap::with_key(),
            order: Vec::new(),
            render_matrix,
            sim,
            flags: LifecycleFlags::empty(),
            active: ShutdownHandle::default(),
            tick: 0,
        }
    }

    /// Empty scene using the configured physics constants and grid kind
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            SimulationContext::from_config(config),
            RenderMatrix::with_kind(config.grid.kind),
        )
    }

    /// Move an object into the arena without making it a child
    pub fn insert(&mut self, object: GameObject) -> ObjectId {
        self.objects.insert(object)
    }

    /// Make an arena object a child and place it in the grid
    ///
    /// `false` if it is already a child or not in the arena. Children added to
    /// a loaded scene are loaded and enabled by the next `load` and `enable`.
    pub fn add_child(&mut self, id: ObjectId) -> Result<bool, GridError> {
        if !self.objects.contains_key(id) || self.order.contains(&id) {
            log::debug!("Rejected child {:?}", id);
            return Ok(false);
        }
        self.order.push(id);
        self.place(id)?;
        Ok(true)
    }

    /// Insert and add an object in one go
    pub fn spawn(&mut self, object: GameObject) -> Result<ObjectId, GridError> {
        let id = self.insert(object);
        self.add_child(id)?;
        Ok(id)
    }

    /// Detach an object, take it out of the grid and hand it back
    pub fn remove_child(&mut self, id: ObjectId) -> Option<GameObject> {
        self.order.retain(|child| *child != id);
        let object = self.objects.remove(id)?;
        if let Some(cell) = object.placed_cell() {
            if let Err(err) = self.render_matrix.grid().remove_occupant(cell, id) {
                log::warn!("Could not unplace {:?} from {:?}: {}", id, cell, err);
            }
        }
        Some(object)
    }

    /// Object by id
    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Object by id, mutably
    ///
    /// Moving an object this way is picked up by the grid on the next tick.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Children in tick order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.order
            .iter()
            .filter_map(|id| self.objects.get(*id).map(|object| (*id, object)))
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the scene has no children
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The scene's render matrix
    pub const fn render_matrix(&self) -> &RenderMatrix {
        &self.render_matrix
    }

    /// The spatial grid behind the render matrix
    pub fn grid(&self) -> &Arc<dyn GridMatrix> {
        self.render_matrix.grid()
    }

    /// Physics constants
    pub const fn sim(&self) -> &SimulationContext {
        &self.sim
    }

    /// Number of ticks run so far
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Handle that stops the loop from anywhere
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.active.clone()
    }

    /// Whether the loop should keep running
    pub fn is_active(&self) -> bool {
        self.active.is_active()
    }

    /// Stop the loop after the current tick
    pub fn stop(&self) {
        self.active.shutdown();
    }

    /// Current lifecycle state
    pub const fn flags(&self) -> LifecycleFlags {
        self.flags
    }

    /// Load every child, then the scene
    ///
    /// Children are visited even when the scene is already loaded, so objects
    /// added since are loaded and re-placed with their resource handles.
    pub fn load(&mut self, loader: &mut dyn ResourceLoader) -> bool {
        let reloading = self.flags.is_loaded();
        let mut failed = false;

        for id in &self.order {
            let Some(object) = self.objects.get_mut(*id) else {
                continue;
            };
            if !object.load(loader) && !object.is_loaded() {
                log::warn!("Scene child {:?} failed to load", id);
                failed = true;
                if !reloading {
                    break;
                }
            }
        }
        if failed && !reloading {
            self.release(loader);
            return false;
        }

        // Grid entries were built before the renders had backend handles
        for index in 0..self.order.len() {
            if let Err(err) = self.place(self.order[index]) {
                log::warn!("Could not place scene child after load: {}", err);
                if !reloading {
                    self.release(loader);
                }
                return false;
            }
        }

        if reloading {
            return false;
        }
        self.flags.insert(LifecycleFlags::LOADED);
        log::debug!("Loaded scene with {} children", self.order.len());
        true
    }

    /// Enable every child, then the scene, and mark it active
    ///
    /// Like [`Scene::load`], this reaches children added since the last call.
    pub fn enable(&mut self) -> bool {
        if !self.flags.is_loaded() {
            return false;
        }
        let reenabling = self.flags.is_enabled();

        for id in &self.order {
            let Some(object) = self.objects.get_mut(*id) else {
                continue;
            };
            if !object.enable() && !object.is_enabled() {
                log::warn!("Scene child {:?} failed to enable", id);
                if !reenabling {
                    return false;
                }
            }
        }

        if reenabling {
            return false;
        }
        self.flags.insert(LifecycleFlags::ENABLED);
        self.active.activate();
        log::debug!("Enabled scene");
        true
    }

    /// Run one tick over every child in order, then re-key the grid
    ///
    /// Velocity changes an object makes to others are applied as soon as that
    /// object finishes, so later objects see them.
    pub fn tick(&mut self, elapsed: Duration) -> Result<(), TickError> {
        if !self.flags.is_enabled() {
            return Ok(());
        }
        self.tick += 1;

        let mut ctx = TickContext::new(self.sim).with_world(self.snapshot());
        ctx.tick = self.tick;
        ctx.elapsed = elapsed;

        for id in &self.order {
            let Some(object) = self.objects.get_mut(*id) else {
                continue;
            };
            ctx.set_current_object(Some(*id));
            let result = object.tick(&mut ctx);
            ctx.set_current_object(None);

            for (other, velocity) in ctx.take_pending() {
                let target = self.objects.get_mut(other);
                if let Some(body) = target.and_then(|o| o.physics.as_mut()) {
                    body.velocity = velocity;
                }
            }
            result?;
        }

        for index in 0..self.order.len() {
            self.place(self.order[index])?;
        }
        Ok(())
    }

    /// Draw everything in the grid; presenting is left to the caller
    pub fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        camera: &impl Spatial,
    ) -> BackendResult<usize> {
        self.render_matrix.draw(backend, camera)
    }

    /// Disable every child, then the scene
    pub fn disable(&mut self) {
        if !self.flags.is_enabled() {
            return;
        }
        for id in &self.order {
            if let Some(object) = self.objects.get_mut(*id) {
                object.disable();
            }
        }
        self.flags.remove(LifecycleFlags::ENABLED);
        self.active.shutdown();
        log::debug!("Disabled scene");
    }

    /// Disable if needed, then unload every child and the scene
    pub fn unload(&mut self, loader: &mut dyn ResourceLoader) {
        if !self.flags.is_loaded() {
            return;
        }
        self.disable();
        self.release(loader);
        self.flags.remove(LifecycleFlags::LOADED);
        log::debug!("Unloaded scene");
    }

    /// Unload whichever children are loaded
    fn release(&mut self, loader: &mut dyn ResourceLoader) {
        for id in &self.order {
            if let Some(object) = self.objects.get_mut(*id) {
                object.unload(loader);
            }
        }
    }

    /// Drop every object and clear the grid
    pub fn dispose(&mut self) {
        self.disable();
        if self.flags.is_loaded() {
            log::warn!("Disposing scene while its resources are still loaded");
        }
        for object in self.objects.values_mut() {
            object.dispose();
        }
        self.objects.clear();
        self.order.clear();
        self.render_matrix.clear();
    }

    /// Colliders and bodies of every object currently in the grid, in child order
    fn snapshot(&self) -> WorldSnapshot {
        let placed: HashSet<ObjectId> =
            self.render_matrix.grid().occupants().into_iter().collect();
        let segments = self.sim.circle_segments;

        let mut world = WorldSnapshot::new();
        for (id, object) in self.objects() {
            if !placed.contains(&id) {
                continue;
            }
            if let Some(collider) = &object.collider {
                world.add_probe(collider.probe(id, object.transform, segments));
            }
            if let Some(body) = &object.physics {
                world.add_body(id, body.state());
            }
        }
        world
    }

    /// Put an object in the cell its position rounds to
    ///
    /// The old cell is freed only if the object still holds it. Whoever held
    /// the new cell is displaced and stays unplaced until it is re-keyed.
    fn place(&mut self, id: ObjectId) -> Result<(), GridError> {
        let Some(object) = self.objects.get(id) else {
            return Ok(());
        };

        let target = Cell::from(object.transform.position);
        if let Some(old) = object.placed_cell() {
            if old != target {
                self.render_matrix.grid().remove_occupant(old, id)?;
            }
        }

        let (cell, previous) = self.render_matrix.add_game_object(id, object)?;
        let displaced = previous.and_then(|entry| entry.object).filter(|other| *other != id);
        if let Some(displaced) = displaced {
            log::debug!("{:?} displaced {:?} from {:?}", id, displaced, cell);
            if let Some(other) = self.objects.get_mut(displaced) {
                if other.placed_cell() == Some(cell) {
                    other.set_placed_cell(None);
                }
            }
        }

        if let Some(object) = self.objects.get_mut(id) {
            object.set_placed_cell(Some(cell));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::physics::{Collider, ColliderKind, PhysicsObject};
    use crate::render::{RecordingBackend, RenderObject};
    use approx::assert_relative_eq;

    fn running(scene: &mut Scene, backend: &mut RecordingBackend) {
        assert!(scene.load(backend));
        assert!(scene.enable());
    }

    #[test]
    fn test_spawn_places_in_grid() {
        let mut scene = Scene::default();
        let id = scene.spawn(GameObject::at(Vec3::new(1.4, 2.6, 0.0))).unwrap();

        assert_eq!(scene.get(id).and_then(GameObject::placed_cell), Some(Cell::new(1, 3, 0)));
        assert_eq!(scene.grid().occupant(Cell::new(1, 3, 0)).unwrap(), Some(id));
        assert!(!scene.add_child(id).unwrap());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_remove_child_unplaces() {
        let mut scene = Scene::default();
        let id = scene.spawn(GameObject::at(Vec3::new(4.0, 0.0, 0.0))).unwrap();

        let object = scene.remove_child(id).unwrap();
        assert_eq!(object.transform.position, Vec3::new(4.0, 0.0, 0.0));
        assert!(scene.grid().is_empty());
        assert!(scene.remove_child(id).is_none());
    }

    #[test]
    fn test_tick_rekeys_moved_objects() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::default();
        let id = scene
            .spawn(GameObject::default().with_physics(
                PhysicsObject::new(1.0).with_velocity(Vec3::new(10.0, 0.0, 0.0)).with_inertia(1.0),
            ))
            .unwrap();
        running(&mut scene, &mut backend);

        scene.tick(Duration::ZERO).unwrap();

        // 10 units/tick at step scale 0.2
        assert_relative_eq!(scene.get(id).unwrap().transform.position.x, 2.0);
        assert_eq!(scene.grid().occupant(Cell::ORIGIN).unwrap(), None);
        assert_eq!(scene.grid().occupant(Cell::axis(2)).unwrap(), Some(id));
        assert_eq!(scene.tick_count(), 1);
    }

    #[test]
    fn test_contested_cell_last_child_wins() {
        let mut scene = Scene::default();
        let first = scene.spawn(GameObject::at(Vec3::new(0.2, 0.0, 0.0))).unwrap();
        let second = scene.spawn(GameObject::at(Vec3::new(-0.2, 0.0, 0.0))).unwrap();

        assert_eq!(scene.grid().occupant(Cell::ORIGIN).unwrap(), Some(second));
        assert_eq!(scene.get(first).unwrap().placed_cell(), None);
        assert_eq!(scene.get(second).unwrap().placed_cell(), Some(Cell::ORIGIN));
    }

    #[test]
    fn test_tick_requires_enable() {
        let mut scene = Scene::default();
        let id = scene
            .spawn(
                GameObject::default()
                    .with_physics(PhysicsObject::new(1.0).with_velocity(Vec3::x())),
            )
            .unwrap();

        scene.tick(Duration::ZERO).unwrap();
        assert_eq!(scene.get(id).unwrap().transform.position, Vec3::zeros());
        assert_eq!(scene.tick_count(), 0);
    }

    #[test]
    fn test_enable_activates_and_disable_stops() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::default();
        let handle = scene.shutdown_handle();
        assert!(!handle.is_active());

        running(&mut scene, &mut backend);
        assert!(handle.is_active());

        handle.shutdown();
        assert!(!scene.is_active());

        scene.unload(&mut backend);
        assert!(!scene.flags().is_loaded());
    }

    #[test]
    fn test_pending_velocity_written_back() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::default();
        let striker = scene
            .spawn(
                GameObject::at(Vec3::new(-2.0, 0.0, 0.0))
                    .with_collider(Collider::circle())
                    .with_physics(
                        PhysicsObject::new(1.0).with_velocity(Vec3::x()).with_inertia(1.0),
                    ),
            )
            .unwrap();
        let target = scene
            .spawn(
                GameObject::at(Vec3::new(-0.5, 0.0, 0.0))
                    .with_collider(Collider::passive(ColliderKind::Circle))
                    .with_physics(PhysicsObject::new(1.0).with_inertia(1.0)),
            )
            .unwrap();
        running(&mut scene, &mut backend);

        scene.tick(Duration::ZERO).unwrap();

        assert_relative_eq!(scene.get(striker).unwrap().velocity(), Vec3::zeros(), epsilon = 1e-5);
        assert_relative_eq!(scene.get(target).unwrap().velocity(), Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_draw_and_dispose() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::default();
        for x in [0.0, 2.0, 4.0] {
            let ball = GameObject::at(Vec3::new(x, 0.0, 0.0));
            scene.spawn(ball.with_render(RenderObject::circle("ball"))).unwrap();
        }
        running(&mut scene, &mut backend);

        assert_eq!(scene.draw(&mut backend, &Transform::identity()).unwrap(), 3);

        scene.unload(&mut backend);
        scene.dispose();
        assert!(scene.is_empty());
        assert!(scene.grid().is_empty());
        assert_eq!(backend.loaded_count(), 0);
    }

    #[test]
    fn test_object_spawned_into_running_scene_joins_on_reload() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::default();
        running(&mut scene, &mut backend);

        let id = scene
            .spawn(
                GameObject::default()
                    .with_render(RenderObject::circle("late"))
                    .with_physics(
                        PhysicsObject::new(1.0)
                            .with_velocity(Vec3::new(10.0, 0.0, 0.0))
                            .with_inertia(1.0),
                    ),
            )
            .unwrap();
        scene.tick(Duration::ZERO).unwrap();
        assert_eq!(scene.get(id).unwrap().transform.position, Vec3::zeros());

        assert!(!scene.load(&mut backend));
        assert!(!scene.enable());
        let object = scene.get(id).unwrap();
        assert!(object.is_loaded() && object.is_enabled());
        assert_eq!(backend.loaded_count(), 1);

        // Re-placed with the handle it was just given
        let entry = scene.grid().get(Cell::ORIGIN).unwrap().unwrap();
        assert_eq!(entry.renders[0].resource, object.renders()[0].handle());

        scene.tick(Duration::ZERO).unwrap();
        assert_relative_eq!(scene.get(id).unwrap().transform.position.x, 2.0);
    }

    #[test]
    fn test_partial_load_failure_leaves_nothing_loaded() {
        let mut backend = RecordingBackend::failing_after(2);
        let mut scene = Scene::default();
        let first = GameObject::at(Vec3::new(-3.0, 0.0, 0.0));
        scene.spawn(first.with_render(RenderObject::rect("first"))).unwrap();
        scene
            .spawn(
                GameObject::at(Vec3::new(3.0, 0.0, 0.0))
                    .with_render(RenderObject::rect("second"))
                    .with_render(RenderObject::rect("third")),
            )
            .unwrap();

        assert!(!scene.load(&mut backend));
        assert!(!scene.flags().is_loaded());
        assert_eq!(backend.loaded_count(), 0);
        assert!(scene.objects().all(|(_, object)| !object.is_loaded()));
    }

    #[test]
    fn test_ball_displacing_wall_hides_it_until_rekeyed() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::default();
        let wall = scene
            .spawn(
                GameObject::new(
                    Transform::from_position(Vec3::new(2.0, 0.0, 0.0))
                        .with_scale(Vec3::new(0.2, 10.0, 0.0)),
                )
                .with_collider(Collider::passive(ColliderKind::Rect)),
            )
            .unwrap();
        let ball = scene
            .spawn(
                GameObject::new(Transform::from_position(Vec3::zeros()).with_uniform_scale(0.2))
                    .with_collider(Collider::circle())
                    .with_physics(
                        PhysicsObject::new(1.0)
                            .with_velocity(Vec3::new(10.0, 0.0, 0.0))
                            .with_inertia(1.0),
                    ),
            )
            .unwrap();
        running(&mut scene, &mut backend);
        let wall_cell = Cell::axis(2);

        // The ball lands in the wall's cell and, as the later child, takes it
        scene.tick(Duration::ZERO).unwrap();
        assert_eq!(scene.grid().occupant(wall_cell).unwrap(), Some(ball));
        assert_eq!(scene.get(wall).unwrap().placed_cell(), None);
        assert!(scene.snapshot().probe(wall).is_none());

        // Unplaced, the wall is not tested, so the ball passes straight through
        scene.tick(Duration::ZERO).unwrap();
        let passed = scene.get(ball).unwrap();
        assert!(passed.collisions().is_empty());
        assert_relative_eq!(passed.velocity(), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(passed.transform.position.x, 4.0);

        // Re-keying puts the wall back once the ball has left its cell
        assert_eq!(scene.grid().occupant(wall_cell).unwrap(), Some(wall));
        assert_eq!(scene.get(wall).unwrap().placed_cell(), Some(wall_cell));
        assert!(scene.snapshot().probe(wall).is_some());
    }
}
