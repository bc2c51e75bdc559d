//! Input Capture and Recording
//!
//! Per-frame keyboard state, fire-key edge detection, and a
//! delta-compressed recording used for replays.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Raw input state for a single frame.
///
/// Every flag means "is held". Edge detection for the fire key is
/// done by [`FireEdge`], not by the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Held keys (packed bits):
    /// - Bit 0: left
    /// - Bit 1: right
    /// - Bit 2: up (jump)
    /// - Bit 3: fire
    /// - Bit 4-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Left arrow bit
    pub const FLAG_LEFT: u8 = 0x01;

    /// Right arrow bit
    pub const FLAG_RIGHT: u8 = 0x02;

    /// Up arrow bit
    pub const FLAG_UP: u8 = 0x04;

    /// Fire (space) bit
    pub const FLAG_FIRE: u8 = 0x08;

    /// Create an idle frame.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Create a frame from individual key states.
    pub const fn from_keys(left: bool, right: bool, up: bool, fire: bool) -> Self {
        let mut flags = 0;
        if left {
            flags |= Self::FLAG_LEFT;
        }
        if right {
            flags |= Self::FLAG_RIGHT;
        }
        if up {
            flags |= Self::FLAG_UP;
        }
        if fire {
            flags |= Self::FLAG_FIRE;
        }
        Self { flags }
    }

    /// Is left held?
    #[inline]
    pub fn left(&self) -> bool {
        self.flags & Self::FLAG_LEFT != 0
    }

    /// Is right held?
    #[inline]
    pub fn right(&self) -> bool {
        self.flags & Self::FLAG_RIGHT != 0
    }

    /// Is up held?
    #[inline]
    pub fn up(&self) -> bool {
        self.flags & Self::FLAG_UP != 0
    }

    /// Is fire held?
    #[inline]
    pub fn fire(&self) -> bool {
        self.flags & Self::FLAG_FIRE != 0
    }

    /// Check if this is an idle frame (no key held).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }

    /// Builder: set left.
    #[inline]
    pub fn with_left(mut self, held: bool) -> Self {
        self.set(Self::FLAG_LEFT, held);
        self
    }

    /// Builder: set right.
    #[inline]
    pub fn with_right(mut self, held: bool) -> Self {
        self.set(Self::FLAG_RIGHT, held);
        self
    }

    /// Builder: set up.
    #[inline]
    pub fn with_up(mut self, held: bool) -> Self {
        self.set(Self::FLAG_UP, held);
        self
    }

    /// Builder: set fire.
    #[inline]
    pub fn with_fire(mut self, held: bool) -> Self {
        self.set(Self::FLAG_FIRE, held);
        self
    }

    #[inline]
    fn set(&mut self, bit: u8, held: bool) {
        if held {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
    }
}

// =============================================================================
// EDGE DETECTION
// =============================================================================

/// Rising-edge detector for the fire key.
///
/// Only frames the controller actually processes are observed; frames
/// skipped while the player is dead leave the memory untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireEdge {
    was_down: bool,
}

impl FireEdge {
    /// Observe one frame's fire state; `true` on the frame it goes down.
    #[inline]
    pub fn just_pressed(&mut self, down: bool) -> bool {
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// One change point in a recording.
///
/// Stored only when the frame or the frame time changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// Frame time in microseconds from this tick on
    pub dt_micros: u64,
    /// The new input state
    pub frame: InputFrame,
}

/// Failed to decode a recording.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Bytes are not a recording
    #[error("Failed to decode input recording: {0}")]
    Decode(#[from] bincode::Error),

    /// Change points are not strictly increasing
    #[error("Recording deltas out of order at tick {0}")]
    OutOfOrder(u32),
}

/// Complete input recording for one level session.
///
/// Used for replay playback and determinism checks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecording {
    /// Number of recorded ticks
    pub tick_count: u32,

    /// Delta-compressed change points
    deltas: Vec<InputDelta>,
}

impl InputRecording {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            deltas: Vec::with_capacity(256),
        }
    }

    /// Record the next tick's frame time and input.
    pub fn record(&mut self, dt: Duration, frame: InputFrame) {
        let tick = self.tick_count;
        self.tick_count += 1;

        let dt_micros = dt.as_micros() as u64;
        let changed = self
            .deltas
            .last()
            .is_none_or(|last| last.frame != frame || last.dt_micros != dt_micros);

        if changed {
            self.deltas.push(InputDelta { tick, dt_micros, frame });
        }
    }

    /// Frame time and input at a tick.
    ///
    /// Uses binary search over the change points.
    pub fn get_at(&self, tick: u32) -> (Duration, InputFrame) {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        match idx.checked_sub(1).and_then(|i| self.deltas.get(i)) {
            Some(delta) => (Duration::from_micros(delta.dt_micros), delta.frame),
            None => (Duration::ZERO, InputFrame::new()),
        }
    }

    /// Iterate every recorded tick in order.
    pub fn iter(&self) -> impl Iterator<Item = (Duration, InputFrame)> + '_ {
        (0..self.tick_count).map(move |tick| self.get_at(tick))
    }

    /// Number of stored change points.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Total recorded time.
    pub fn duration(&self) -> Duration {
        self.iter().map(|(dt, _)| dt).sum()
    }

    /// Hash of the recording.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_recording();
        hasher.update_u32(self.tick_count);
        for delta in &self.deltas {
            hasher.update_u32(delta.tick);
            hasher.update_u64(delta.dt_micros);
            hasher.update_u8(delta.frame.flags);
        }
        hasher.finalize()
    }

    /// Encode for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReplayError> {
        let recording: Self = bincode::deserialize(bytes)?;
        for pair in recording.deltas.windows(2) {
            if pair[1].tick <= pair[0].tick {
                return Err(ReplayError::OutOfOrder(pair[1].tick));
            }
        }
        Ok(recording)
    }
}

// =============================================================================
// TESTS
// =============================================================================
