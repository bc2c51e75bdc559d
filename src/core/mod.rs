//! Core deterministic primitives.
//!
//! Fixed-point numbers, vectors and state hashing. Everything the
//! simulation computes goes through these types so that a level
//! replays identically on every platform.

pub mod fixed;
pub mod vec2;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use hash::{compute_state_hash, StateHash, StateHasher};
