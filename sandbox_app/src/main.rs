//! Bouncing circles demo
//!
//! Scatters circles inside a box of rect walls and runs the game loop
//! headless against a recording backend for a bounded number of ticks.
//!
//! Usage: `bounce_demo [config.toml|config.ron]`

use rand::prelude::*;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;

const BALLS: usize = 12;
const ARENA_HALF: f32 = 20.0;
const DEFAULT_TICKS: u64 = 500;

struct BounceDemo {
    rng: StdRng,
    balls: Vec<ObjectId>,
    collisions_seen: usize,
}

impl BounceDemo {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            balls: Vec::new(),
            collisions_seen: 0,
        }
    }

    fn spawn_walls(engine: &mut Engine) -> Result<(), AppError> {
        let span = ARENA_HALF * 2.0;
        let walls = [
            (Vec3::new(0.0, ARENA_HALF, 0.0), Vec3::new(span, 1.0, 0.0)),
            (Vec3::new(0.0, -ARENA_HALF, 0.0), Vec3::new(span, 1.0, 0.0)),
            (Vec3::new(ARENA_HALF, 0.0, 0.0), Vec3::new(1.0, span, 0.0)),
            (Vec3::new(-ARENA_HALF, 0.0, 0.0), Vec3::new(1.0, span, 0.0)),
        ];

        for (position, size) in walls {
            engine.scene.spawn(
                GameObject::new(Transform::from_position(position).with_scale(size))
                    .with_render(RenderObject::rect("wall"))
                    .with_collider(Collider::passive(ColliderKind::Rect)),
            )?;
        }
        Ok(())
    }

    fn spawn_ball(&mut self, engine: &mut Engine, slot: usize) -> Result<(), AppError> {
        // Lay balls out on a coarse lattice so no two start in the same cell
        #[allow(clippy::cast_precision_loss)]
        let (column, row) = ((slot % 4) as f32, (slot / 4) as f32);
        let position = Vec3::new(
            -12.0 + column * 8.0 + self.rng.gen_range(-1.0..1.0),
            -12.0 + row * 8.0 + self.rng.gen_range(-1.0..1.0),
            0.0,
        );
        let velocity = Vec3::new(self.rng.gen_range(-6.0..6.0), self.rng.gen_range(-6.0..6.0), 0.0);
        let radius = self.rng.gen_range(1.0..2.5);

        let id = engine.scene.spawn(
            GameObject::new(Transform::from_position(position).with_uniform_scale(radius))
                .with_metadata(1)
                .with_render(RenderObject::circle("ball").with_color([0.9, 0.4, 0.2, 1.0]))
                .with_collider(Collider::circle())
                .with_physics(
                    PhysicsObject::new(radius * radius)
                        .with_velocity(velocity)
                        .with_inertia(0.999),
                ),
        )?;
        self.balls.push(id);
        Ok(())
    }

    fn kinetic_energy(&self, engine: &Engine) -> f32 {
        self.balls
            .iter()
            .filter_map(|id| engine.scene.get(*id))
            .filter_map(|ball| ball.physics.as_ref())
            .map(PhysicsObject::kinetic_energy)
            .sum()
    }
}

impl Application for BounceDemo {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        engine.camera = Camera::new(
            Transform::from_position(Vec3::new(0.0, 0.0, 50.0)),
            Projection::Orthographic,
        );

        Self::spawn_walls(engine)?;
        for slot in 0..BALLS {
            self.spawn_ball(engine, slot)?;
        }

        log::info!("Spawned {} balls, kinetic energy {:.2}", BALLS, self.kinetic_energy(engine));
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        let colliding = self
            .balls
            .iter()
            .filter_map(|id| engine.scene.get(*id))
            .map(|ball| ball.collisions().len())
            .sum::<usize>();
        self.collisions_seen += colliding;

        let tick = engine.scene.tick_count();
        if tick > 0 && tick % 100 == 0 {
            log::info!(
                "Tick {}: kinetic energy {:.2}, last tick took {:.3} ms",
                tick,
                self.kinetic_energy(engine),
                delta_time * 1000.0
            );
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!(
            "Demo finished after {} ticks, {} collisions observed, kinetic energy {:.2}",
            engine.scene.tick_count(),
            self.collisions_seen,
            self.kinetic_energy(engine)
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            EngineConfig::load_from_file(&path)?
        }
        None => EngineConfig::default(),
    };
    if config.tick.max_ticks.is_none() {
        config.tick.max_ticks = Some(DEFAULT_TICKS);
    }

    let mut backend = RecordingBackend::new();
    let mut app = BounceDemo::new(7);
    Engine::run(config, &mut app, &mut backend)?;

    log::info!(
        "Backend presented {} frames with {} draw calls",
        backend.frames(),
        backend.draw_count()
    );
    Ok(())
}
