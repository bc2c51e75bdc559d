//! Level Orchestrator
//!
//! Owns the level state and the physics collaborator and runs one frame
//! per `tick` call: input, movement, physics step, contacts, camera.
//! Also runs the death sequence: pause on death, then rebuild the level
//! once the respawn delay has elapsed.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::hash::StateHash;
use crate::core::vec2::FixedVec2;
use crate::engine::headless::{HeadlessView, HeadlessWorld};
use crate::engine::{BodyGroup, BodySpec, PhysicsWorld, SceneView};
use crate::game::actor::EntityId;
use crate::game::camera::Camera;
use crate::game::collision::resolve_contacts;
use crate::game::config::{ConfigError, LevelConfig};
use crate::game::events::GameEvent;
use crate::game::input::{InputFrame, InputRecording};
use crate::game::level::LevelData;
use crate::game::player::PlayerController;
use crate::game::state::{LevelPhase, LevelState};

/// Time between the player's death and the level restart.
pub const RESPAWN_DELAY: Duration = Duration::from_millis(1000);

/// Groups the physics world is told about, in contact-reporting order.
const COLLIDERS: [(BodyGroup, BodyGroup); 5] = [
    (BodyGroup::Player, BodyGroup::Platform),
    (BodyGroup::Enemies, BodyGroup::Platform),
    (BodyGroup::Player, BodyGroup::Enemies),
    (BodyGroup::Bullets, BodyGroup::Enemies),
    (BodyGroup::Player, BodyGroup::Crates),
];

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Score events generated this tick
    pub events: Vec<GameEvent>,
    /// The player died this tick
    pub player_died: bool,
    /// The level was rebuilt this tick
    pub restarted: bool,
}

/// A playable level bound to a physics collaborator.
pub struct Level<P: PhysicsWorld> {
    data: LevelData,
    config: LevelConfig,
    state: LevelState,
    physics: P,
    controller: PlayerController,
    camera: Camera,
    bounds_sent: bool,
    restarts: u32,
}

impl<P: PhysicsWorld> Level<P> {
    /// Validate `config`, build the initial state and load `physics`.
    pub fn new(data: LevelData, config: LevelConfig, physics: P) -> Result<Self, ConfigError> {
        config.validate()?;

        let camera = Camera::new(
            FixedVec2::new(data.width(), data.height()),
            FixedVec2::new(config.viewport_width, config.viewport_height),
        );

        let mut level = Self {
            state: LevelState::build(&data),
            data,
            config,
            physics,
            controller: PlayerController::new(),
            camera,
            bounds_sent: false,
            restarts: 0,
        };
        level.load_physics();

        info!(
            enemies = level.state.enemies.len(),
            crates = level.state.crates.len(),
            "Level loaded"
        );
        Ok(level)
    }

    /// Current state.
    pub fn state(&self) -> &LevelState {
        &self.state
    }

    /// Level description.
    pub fn data(&self) -> &LevelData {
        &self.data
    }

    /// Active configuration.
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Physics collaborator.
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Number of restarts so far.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Hash of the current state.
    pub fn compute_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    /// Run one frame.
    ///
    /// `dt` is the host's measured frame time; the respawn delay is
    /// counted from it.
    pub fn tick(&mut self, input: &InputFrame, dt: Duration, view: &mut impl SceneView) -> TickResult {
        let mut result = TickResult::default();

        if !self.bounds_sent {
            let (min, max) = self.camera.bounds();
            view.set_camera_bounds(min, max);
            self.bounds_sent = true;
        }

        match self.state.phase {
            LevelPhase::Running => self.run_frame(input, dt, &mut result),
            LevelPhase::Dying { since_death, killer } => {
                let since_death = since_death + dt;
                if since_death >= RESPAWN_DELAY {
                    self.restart(&mut result);
                    let (min, max) = self.camera.bounds();
                    view.set_camera_bounds(min, max);
                } else {
                    self.state.phase = LevelPhase::Dying { since_death, killer };
                }
            }
        }

        self.camera.frame(self.state.player.actor.position).present(view);
        result
    }

    fn run_frame(&mut self, input: &InputFrame, dt: Duration, result: &mut TickResult) {
        self.state.tick += 1;
        self.state.elapsed += dt;

        // 1. Input → intents
        let intent = self.controller.update(&mut self.state.player, input, self.config.run_speed);
        if let Some(intent) = intent {
            self.physics.set_velocity_x(EntityId::PLAYER, intent.velocity_x);
            if intent.jump {
                self.physics.set_velocity_y(EntityId::PLAYER, self.config.jump_speed.wrapping_neg());
            }
            if let Some(order) = intent.fire {
                let id = self.state.projectiles.fire(order.origin, order.direction);
                self.physics.spawn_body(BodySpec::bullet(id, order.origin));
                debug!(%id, "Fired");
            }
        }

        // 2. Enemies and bullets move on closed-form tracks
        for enemy in self.state.enemies.values_mut() {
            enemy.advance(dt, self.config.enemy_speed);
            self.physics.set_position(enemy.id(), enemy.actor.position);
        }
        self.state.projectiles.advance(
            dt,
            self.config.bullet_speed,
            self.data.width(),
            self.config.bullet_lifetime(),
        );
        for projectile in self.state.projectiles.iter().filter(|p| p.actor.is_alive()) {
            self.physics.set_position(projectile.actor.id, projectile.actor.position);
        }

        // 3. Physics
        let contacts = self.physics.step(dt);
        match self.physics.position(EntityId::PLAYER) {
            Some(position) => self.state.player.actor.position = position,
            None => warn!("Player body missing from physics world"),
        }
        self.state.player.grounded = self.physics.is_grounded(EntityId::PLAYER);

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(
            tick = self.state.tick,
            contacts = contacts.len(),
            player = %self.state.player.actor.position,
            "Physics step"
        );

        // 4. Contacts → effects
        result.events = resolve_contacts(&mut self.state, &contacts);

        // 5. Drop dead bodies
        for id in self.state.sweep() {
            self.physics.remove_body(id);
        }

        if let LevelPhase::Dying { killer, .. } = self.state.phase {
            self.physics.set_velocity_x(EntityId::PLAYER, 0);
            self.physics.pause();
            result.player_died = true;
            info!(tick = self.state.tick, %killer, score = self.state.score, "Player killed");
        }
    }

    fn restart(&mut self, result: &mut TickResult) {
        self.state = LevelState::build(&self.data);
        self.load_physics();
        self.restarts += 1;

        result.restarted = true;
        result.events.push(GameEvent::score_changed(self.state.tick, self.state.score));
        info!(restarts = self.restarts, "Level restarted");
    }

    fn load_physics(&mut self) {
        self.physics.load(&self.data);
        for (a, b) in COLLIDERS {
            self.physics.register_collider(a, b);
        }
        for spec in self.state.body_specs() {
            self.physics.spawn_body(spec);
        }
    }
}

/// Final state of a replay.
#[derive(Debug)]
pub struct ReplayOutcome {
    /// Hash of the final state
    pub hash: StateHash,
    /// Every event, in order
    pub events: Vec<GameEvent>,
    /// Final state
    pub state: LevelState,
    /// Restarts during the replay
    pub restarts: u32,
}

/// Replay a recording against a fresh headless level.
pub fn replay_level(
    data: &LevelData,
    config: &LevelConfig,
    recording: &InputRecording,
) -> Result<ReplayOutcome, ConfigError> {
    let physics = HeadlessWorld::new(config.gravity);
    let mut level = Level::new(data.clone(), config.clone(), physics)?;
    let mut view = HeadlessView::new();
    let mut events = Vec::new();

    for (dt, frame) in recording.iter() {
        events.extend(level.tick(&frame, dt, &mut view).events);
    }

    Ok(ReplayOutcome {
        hash: level.compute_hash(),
        events,
        restarts: level.restarts(),
        state: level.state,
    })
}

// =============================================================================
// TESTS
// =============================================================================
