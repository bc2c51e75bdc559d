//! State Hashing
//!
//! SHA-256 digests of level state and input recordings. Two runs that
//! feed the same values in the same order produce the same digest, which
//! is how replays and tick-rate independence are checked.

use std::time::Duration;
use sha2::{Sha256, Digest};

use super::vec2::FixedVec2;

/// 32-byte SHA-256 digest.
pub type StateHash = [u8; 32];

const LEVEL_DOMAIN: &[u8] = b"JUNGLE_RUN_LEVEL_V1";
const INPUTS_DOMAIN: &[u8] = b"JUNGLE_RUN_INPUTS_V1";

/// Incremental hasher. Every value is written little-endian.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    fn with_domain(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Hasher for a level snapshot.
    pub fn for_level_state() -> Self {
        Self::with_domain(LEVEL_DOMAIN)
    }

    /// Hasher for an input recording.
    pub fn for_input_recording() -> Self {
        Self::with_domain(INPUTS_DOMAIN)
    }

    /// Write a byte.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Write a u32.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Write a u64.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Write a flag as one byte.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Durations are hashed as whole microseconds, the resolution motion uses.
    #[inline]
    pub fn update_duration(&mut self, value: Duration) {
        self.update_u64(value.as_micros() as u64);
    }

    /// Write both components, x first.
    #[inline]
    pub fn update_vec2(&mut self, value: FixedVec2) {
        self.hasher.update(value.x.to_le_bytes());
        self.hasher.update(value.y.to_le_bytes());
    }

    /// Consume the hasher.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Hash a level snapshot: the clock first, then whatever `add_state` writes.
pub fn compute_state_hash<F>(tick: u32, elapsed: Duration, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_level_state();
    hasher.update_u32(tick);
    hasher.update_duration(elapsed);
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
