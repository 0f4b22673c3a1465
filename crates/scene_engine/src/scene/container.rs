//! Lifecycle container
//!
//! Load and enable run children first and the node's own hook last. Tick runs
//! the node's own hook first and then every child in insertion order. Disable
//! and unload mirror load and enable. Every transition is idempotent: asking
//! for a state the node is already in returns `false` or does nothing, though
//! load and enable still reach children attached since. A node that fails to
//! load or enable rolls back the children it brought up on the way.

use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use crate::game::TickContext;
use crate::render::ResourceLoader;
use crate::scene::TickError;

bitflags! {
    /// Lifecycle state of a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LifecycleFlags: u8 {
        /// Resources are loaded
        const LOADED = 1 << 0;
        /// Node ticks; implies `LOADED`
        const ENABLED = 1 << 1;
    }
}

impl LifecycleFlags {
    /// Whether the node is loaded
    pub const fn is_loaded(self) -> bool {
        self.contains(Self::LOADED)
    }

    /// Whether the node is enabled
    pub const fn is_enabled(self) -> bool {
        self.contains(Self::ENABLED)
    }
}

/// Identity of a node in a lifecycle tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id, unique for the process
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Capability shared by every node of the lifecycle tree
pub trait Tickable {
    /// Identity used for duplicate detection
    fn node_id(&self) -> NodeId;

    /// Load children then self; `false` if already loaded or loading failed
    ///
    /// Children are visited even when the node itself is already loaded.
    fn load(&mut self, loader: &mut dyn ResourceLoader) -> bool;

    /// Enable children then self; `false` unless loaded and not yet enabled
    ///
    /// Children are visited even when the node itself is already enabled.
    fn enable(&mut self) -> bool;

    /// Run one tick; a no-op unless enabled
    fn tick(&mut self, ctx: &mut TickContext) -> Result<(), TickError>;

    /// Disable children then self; safe when already disabled
    fn disable(&mut self);

    /// Unload children then self, disabling first if needed
    fn unload(&mut self, loader: &mut dyn ResourceLoader);

    /// Tear down and drop every child
    fn dispose(&mut self);

    /// Whether the node is loaded
    fn is_loaded(&self) -> bool;

    /// Whether the node is enabled
    fn is_enabled(&self) -> bool;
}

/// Per-node behaviour plugged into a [`Container`]
///
/// All hooks default to doing nothing and succeeding.
pub trait Hooks {
    /// Called once when the node loads, after its children
    fn on_load(&mut self, _loader: &mut dyn ResourceLoader) -> bool {
        true
    }

    /// Called once when the node enables, after its children
    fn on_enable(&mut self) -> bool {
        true
    }

    /// Called every tick before the children tick
    fn on_tick(&mut self, _ctx: &mut TickContext) -> Result<(), TickError> {
        Ok(())
    }

    /// Called when the node disables, after its children
    fn on_disable(&mut self) {}

    /// Called when the node unloads, after its children
    fn on_unload(&mut self, _loader: &mut dyn ResourceLoader) {}
}

impl Hooks for () {}

/// Composite node with its own hooks and an ordered set of children
pub struct Container<H: Hooks = ()> {
    id: NodeId,
    flags: LifecycleFlags,
    hooks: H,
    children: Vec<Box<dyn Tickable>>,
}

impl<H: Hooks + Default> Default for Container<H> {
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<H: Hooks + std::fmt::Debug> std::fmt::Debug for Container<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("hooks", &self.hooks)
            .field("children", &self.children.len())
            .finish()
    }
}

impl<H: Hooks> Container<H> {
    /// Unloaded container with no children
    pub fn new(hooks: H) -> Self {
        Self {
            id: NodeId::next(),
            flags: LifecycleFlags::empty(),
            hooks,
            children: Vec::new(),
        }
    }

    /// The node's hooks
    pub const fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The node's hooks, mutably
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Current lifecycle state
    pub const fn flags(&self) -> LifecycleFlags {
        self.flags
    }

    /// Append a child; `false` if a child with the same id is already present
    pub fn add_child(&mut self, child: Box<dyn Tickable>) -> bool {
        let id = child.node_id();
        if self.contains(id) {
            log::debug!("Rejected duplicate child {:?} of {:?}", id, self.id);
            return false;
        }
        self.children.push(child);
        true
    }

    /// Detach a child, keeping the order of the rest
    pub fn remove_child(&mut self, id: NodeId) -> Option<Box<dyn Tickable>> {
        let index = self.children.iter().position(|child| child.node_id() == id)?;
        Some(self.children.remove(index))
    }

    /// Whether a child with `id` is attached
    pub fn contains(&self, id: NodeId) -> bool {
        self.children.iter().any(|child| child.node_id() == id)
    }

    /// Children in insertion order
    pub fn children(&self) -> impl Iterator<Item = &(dyn Tickable + 'static)> {
        self.children.iter().map(|child| &**child)
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<H: Hooks> Tickable for Container<H> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn load(&mut self, loader: &mut dyn ResourceLoader) -> bool {
        let reloading = self.flags.is_loaded();
        let mut fresh = Vec::new();
        let mut failed = false;

        for (index, child) in self.children.iter_mut().enumerate() {
            if child.load(loader) {
                fresh.push(index);
            } else if !child.is_loaded() {
                log::warn!("Child {:?} of {:?} failed to load", child.node_id(), self.id);
                failed = true;
                if !reloading {
                    break;
                }
            }
        }

        if reloading {
            return false;
        }
        if failed || !self.hooks.on_load(loader) {
            for index in fresh {
                self.children[index].unload(loader);
            }
            return false;
        }
        self.flags.insert(LifecycleFlags::LOADED);
        log::debug!("Loaded {:?}", self.id);
        true
    }

    fn enable(&mut self) -> bool {
        if !self.flags.is_loaded() {
            return false;
        }
        let reenabling = self.flags.is_enabled();
        let mut fresh = Vec::new();
        let mut failed = false;

        for (index, child) in self.children.iter_mut().enumerate() {
            if child.enable() {
                fresh.push(index);
            } else if !child.is_enabled() {
                log::warn!("Child {:?} of {:?} failed to enable", child.node_id(), self.id);
                failed = true;
                if !reenabling {
                    break;
                }
            }
        }

        if reenabling {
            return false;
        }
        if failed || !self.hooks.on_enable() {
            for index in fresh {
                self.children[index].disable();
            }
            return false;
        }
        self.flags.insert(LifecycleFlags::ENABLED);
        log::debug!("Enabled {:?}", self.id);
        true
    }

    fn tick(&mut self, ctx: &mut TickContext) -> Result<(), TickError> {
        if !self.flags.is_enabled() {
            return Ok(());
        }

        self.hooks.on_tick(ctx)?;
        for child in &mut self.children {
            child.tick(ctx)?;
        }
        Ok(())
    }

    fn disable(&mut self) {
        if !self.flags.is_enabled() {
            return;
        }

        for child in &mut self.children {
            child.disable();
        }
        self.hooks.on_disable();
        self.flags.remove(LifecycleFlags::ENABLED);
        log::debug!("Disabled {:?}", self.id);
    }

    fn unload(&mut self, loader: &mut dyn ResourceLoader) {
        if !self.flags.is_loaded() {
            return;
        }
        self.disable();

        for child in &mut self.children {
            child.unload(loader);
        }
        self.hooks.on_unload(loader);
        self.flags.remove(LifecycleFlags::LOADED);
        log::debug!("Unloaded {:?}", self.id);
    }

    fn dispose(&mut self) {
        self.disable();
        if self.flags.is_loaded() {
            log::warn!("Disposing {:?} while its resources are still loaded", self.id);
        }

        for child in &mut self.children {
            child.dispose();
        }
        self.children.clear();
    }

    fn is_loaded(&self) -> bool {
        self.flags.is_loaded()
    }

    fn is_enabled(&self) -> bool {
        self.flags.is_enabled()
    }
}
