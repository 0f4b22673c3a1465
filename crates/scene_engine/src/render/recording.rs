//! Headless backend that records every call
//!
//! Used by tests and the sandbox demo in place of a real graphics API.

use std::collections::HashSet;

use crate::foundation::math::{Transform, Vec3};
use crate::render::{
    BackendResult, RenderBackend, RenderError, RenderObject, ResourceHandle, ResourceLoader,
    Visible,
};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// A resource was allocated
    Load {
        /// Handle handed out
        handle: ResourceHandle,
        /// Render object name
        name: String,
    },
    /// A resource was released
    Unload(ResourceHandle),
    /// An entity was drawn
    Draw {
        /// Render object name
        name: String,
        /// World position it was drawn at
        position: Vec3,
        /// Camera position for this draw
        camera: Vec3,
    },
    /// A frame was presented
    Present,
}

/// In-memory [`RenderBackend`]
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    loaded: HashSet<ResourceHandle>,
    events: Vec<BackendEvent>,
    frames: u64,
    load_budget: Option<u64>,
}

impl RecordingBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose every resource load fails
    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    /// Backend that hands out `loads` resources and fails every load after that
    pub fn failing_after(loads: u64) -> Self {
        Self {
            load_budget: Some(loads),
            ..Self::default()
        }
    }

    /// Everything recorded so far
    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    /// Number of resources currently held
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Number of presented frames
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Names drawn since the last present, in draw order
    pub fn last_frame_draws(&self) -> Vec<&str> {
        let start = self
            .events
            .iter()
            .rposition(|event| matches!(event, BackendEvent::Present))
            .map_or(0, |index| index + 1);

        self.events[start..]
            .iter()
            .filter_map(|event| match event {
                BackendEvent::Draw { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Total draw calls recorded
    pub fn draw_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, BackendEvent::Draw { .. }))
            .count()
    }
}

impl ResourceLoader for RecordingBackend {
    fn load_resource(&mut self, object: &RenderObject) -> BackendResult<ResourceHandle> {
        if matches!(self.load_budget, Some(budget) if self.next_handle >= budget) {
            return Err(RenderError::LoadFailed {
                name: object.name.clone(),
                reason: "recording backend configured to fail".to_string(),
            });
        }

        self.next_handle += 1;
        let handle = ResourceHandle(self.next_handle);
        self.loaded.insert(handle);
        self.events.push(BackendEvent::Load {
            handle,
            name: object.name.clone(),
        });
        Ok(handle)
    }

    fn unload_resource(&mut self, handle: ResourceHandle) {
        if self.loaded.remove(&handle) {
            self.events.push(BackendEvent::Unload(handle));
        } else {
            log::warn!("Unload of unknown resource {:?}", handle);
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn draw_entity(&mut self, entity: &Visible, camera: &Transform) -> BackendResult<()> {
        if let Some(handle) = entity.resource {
            if !self.loaded.contains(&handle) {
                return Err(RenderError::UnknownResource(handle));
            }
        }

        self.events.push(BackendEvent::Draw {
            name: entity.render.name.clone(),
            position: entity.transform.position,
            camera: camera.position,
        });
        Ok(())
    }

    fn present(&mut self) -> BackendResult<()> {
        self.frames += 1;
        self.events.push(BackendEvent::Present);
        Ok(())
    }
}
