//! # Jungle Run
//!
//! Level simulation for Jungle Run, a side-scrolling platformer: player
//! movement and shooting, patrolling enemies, crates, scoring and the
//! death/restart sequence. Rendering and real physics belong to the
//! host engine, reached through the traits in [`engine`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        JUNGLE RUN                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Level logic (deterministic)               │
//! │  ├── input.rs    - Input frames and recordings               │
//! │  ├── player.rs   - Player controller                         │
//! │  ├── enemy.rs    - Patrol paths and enemies                  │
//! │  ├── projectile.rs - Bullet pool                             │
//! │  ├── collision.rs- Contact policy and scoring                │
//! │  ├── level.rs    - Level data, Tiled loading                 │
//! │  ├── state.rs    - Level state and reconstruction            │
//! │  └── tick.rs     - Orchestrator and death sequence           │
//! │                                                              │
//! │  engine/         - Host engine interface                     │
//! │  ├── mod.rs      - PhysicsWorld / SceneView traits           │
//! │  └── headless.rs - Minimal engine for tests and the demo     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules use integer math only and iterate
//! `BTreeMap`s. Motion is a function of total elapsed time, so the same
//! recorded inputs and frame times replay to the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod game;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use engine::{PhysicsWorld, SceneView};
pub use game::input::{InputFrame, InputRecording};
pub use game::level::{LevelData, LevelError};
pub use game::state::LevelState;
pub use game::tick::{Level, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal frame rate of the host (Hz)
pub const TICK_RATE: u32 = 60;
