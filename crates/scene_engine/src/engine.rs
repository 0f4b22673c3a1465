//! Core engine implementation
//!
//! [`Engine::run`] drives a scene through its whole life:
//! load, enable, the paced tick loop, disable and unload.

use std::time::Duration;

use thiserror::Error;

use crate::application::Application;
use crate::config::{ConfigError, EngineConfig, TickConfig};
use crate::foundation::time::{Stopwatch, TickClock};
use crate::game::{Camera, Scene};
use crate::render::{RenderBackend, RenderError};
use crate::scene::TickError;

/// Tick pacing and bookkeeping
#[derive(Debug)]
pub struct GameLoop {
    config: TickConfig,
    clock: TickClock,
    time_delta: Duration,
}

impl GameLoop {
    /// Loop paced by `config`
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            clock: TickClock::new(),
            time_delta: Duration::ZERO,
        }
    }

    /// Target duration of one tick
    pub fn target(&self) -> Duration {
        Duration::from_millis(u64::from(self.config.tick_time_ms))
    }

    /// Start timing a tick
    pub fn begin_tick(&mut self) {
        self.clock.begin();
    }

    /// Record the tick's work time, then sleep out the rest of the target if pacing
    pub fn end_tick(&mut self) -> Duration {
        self.time_delta = self.clock.elapsed();

        if self.config.pace {
            let margin = Duration::from_millis(u64::from(self.config.safety_margin_ms));
            if let Some(rest) = self.clock.remaining(self.target(), margin) {
                std::thread::sleep(rest);
            }
        }

        self.clock.finish();
        self.time_delta
    }

    /// Work time of the last finished tick, excluding any pacing sleep
    pub fn time_delta(&self) -> Duration {
        self.time_delta
    }

    /// Number of finished ticks
    pub fn ticks(&self) -> u64 {
        self.clock.tick_count()
    }

    /// Whether the configured tick bound has been reached
    pub fn finished(&self) -> bool {
        self.config.max_ticks.is_some_and(|max| self.ticks() >= max)
    }

    /// Underlying clock
    pub fn clock(&self) -> &TickClock {
        &self.clock
    }
}

/// Main engine struct
///
/// Holds the scene and the camera it is drawn through.
#[derive(Debug)]
pub struct Engine {
    /// The scene being run
    pub scene: Scene,

    /// Camera used for drawing
    pub camera: Camera,

    config: EngineConfig,
    game_loop: GameLoop,
}

impl Engine {
    /// Create an engine with an empty scene built from `config`
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scene: Scene::from_config(&config),
            camera: Camera::default(),
            game_loop: GameLoop::new(config.tick.clone()),
            config,
        }
    }

    /// Run the engine with the given application until the scene stops
    ///
    /// A tick error stops the loop; the scene is still disabled and unloaded
    /// and the application cleaned up before the error is returned.
    pub fn run<A: Application, B: RenderBackend>(
        config: EngineConfig,
        app: &mut A,
        backend: &mut B,
    ) -> Result<(), EngineError> {
        let stopwatch = Stopwatch::start_new();
        let mut engine = Self::new(config);

        app.initialize(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        if !engine.scene.load(backend) {
            log::error!("Scene failed to load");
            app.cleanup(&mut engine);
            return Err(EngineError::LoadFailed);
        }
        if !engine.scene.enable() {
            log::error!("Scene failed to enable");
            engine.scene.unload(backend);
            app.cleanup(&mut engine);
            return Err(EngineError::EnableFailed);
        }

        log::info!("Starting game loop with {} objects", engine.scene.len());
        let result = engine.run_loop(app, backend);
        if let Err(err) = &result {
            log::error!("Game loop stopped: {err}");
            engine.scene.stop();
        }

        engine.scene.disable();
        engine.scene.unload(backend);
        app.cleanup(&mut engine);

        log::info!(
            "Engine shutdown after {} ticks in {:?} (average tick {:?})",
            engine.game_loop.ticks(),
            stopwatch.elapsed(),
            engine.game_loop.clock().average_tick()
        );
        result
    }

    fn run_loop<A: Application, B: RenderBackend>(
        &mut self,
        app: &mut A,
        backend: &mut B,
    ) -> Result<(), EngineError> {
        while self.scene.is_active() && !self.game_loop.finished() {
            self.game_loop.begin_tick();
            let delta = self.game_loop.time_delta();

            app.update(self, delta.as_secs_f32())
                .map_err(|e| EngineError::ApplicationError(format!("App update: {e}")))?;

            self.scene.tick(delta)?;
            self.scene.draw(backend, &self.camera)?;
            backend.present()?;

            self.game_loop.end_tick();
        }
        Ok(())
    }

    /// Stop the loop after the current tick
    pub fn quit(&self) {
        log::info!("Engine shutdown requested");
        self.scene.stop();
    }

    /// Configuration the engine was built from
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tick pacing state
    pub const fn game_loop(&self) -> &GameLoop {
        &self.game_loop
    }

    /// Work time of the last tick
    pub fn delta_time(&self) -> Duration {
        self.game_loop.time_delta()
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The scene could not load its resources
    #[error("Scene failed to load")]
    LoadFailed,

    /// The scene loaded but could not be enabled
    #[error("Scene failed to enable")]
    EnableFailed,

    /// A tick failed
    #[error("Tick failed: {0}")]
    Tick(#[from] TickError),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpaced(max_ticks: Option<u64>) -> TickConfig {
        TickConfig {
            pace: false,
            max_ticks,
            ..TickConfig::default()
        }
    }

    #[test]
    fn test_game_loop_counts_to_bound() {
        let mut game_loop = GameLoop::new(unpaced(Some(3)));
        for _ in 0..3 {
            assert!(!game_loop.finished());
            game_loop.begin_tick();
            game_loop.end_tick();
        }
        assert!(game_loop.finished());
        assert_eq!(game_loop.ticks(), 3);
    }

    #[test]
    fn test_unbounded_loop_never_finishes() {
        let mut game_loop = GameLoop::new(unpaced(None));
        game_loop.begin_tick();
        game_loop.end_tick();
        assert!(!game_loop.finished());
    }

    #[test]
    fn test_paced_tick_lasts_close_to_target() {
        let mut game_loop = GameLoop::new(TickConfig {
            tick_time_ms: 15,
            safety_margin_ms: 1,
            ..TickConfig::default()
        });
        game_loop.begin_tick();
        let work = game_loop.end_tick();

        assert!(work < Duration::from_millis(14));
        assert!(game_loop.clock().last_tick() >= Duration::from_millis(13));
    }
}
