//! Game Logic Module
//!
//! Level simulation. Deterministic given the same inputs and frame times.
//!
//! ## Module Structure
//!
//! - `actor`: Entity ids, facing, sprites, shared actor state
//! - `input`: Input frames, fire edge detection, recordings
//! - `player`: Player controller
//! - `enemy`: Patrol paths and patrolling enemies
//! - `projectile`: Bullet pool
//! - `collision`: Contact → effect policy and scoring
//! - `level`: Level data and Tiled loading
//! - `state`: Level state and reconstruction
//! - `camera`: Camera follow and parallax
//! - `tick`: Level orchestrator and death sequence
//! - `events`: Score events

pub mod actor;
pub mod input;
pub mod player;
pub mod enemy;
pub mod projectile;
pub mod collision;
pub mod events;
pub mod level;
pub mod config;
pub mod camera;
pub mod state;
pub mod tick;

// Re-export key types
pub use actor::{Actor, ActorKind, EntityId, Facing, Sprite};
pub use input::{InputFrame, InputRecording};
pub use level::{LevelData, LevelError};
pub use config::{ConfigError, LevelConfig};
pub use state::{LevelPhase, LevelState};
pub use tick::{Level, TickResult, RESPAWN_DELAY};
pub use events::GameEvent;
