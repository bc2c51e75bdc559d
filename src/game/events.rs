//! Game Events
//!
//! Externally observable notifications. The HUD only needs the score,
//! so that is the only event the level emits.

use serde::{Serialize, Deserialize};

/// Event emitted by the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Score changed (including the reset to 0 on restart)
    ScoreChanged {
        /// Tick of the level attempt when the change happened
        tick: u32,
        /// New score
        score: u32,
    },
}

impl GameEvent {
    /// Create score changed event.
    pub fn score_changed(tick: u32, score: u32) -> Self {
        GameEvent::ScoreChanged { tick, score }
    }

    /// Score carried by the event.
    pub fn score(&self) -> u32 {
        match self {
            GameEvent::ScoreChanged { score, .. } => *score,
        }
    }

    /// Tick when the event occurred.
    pub fn tick(&self) -> u32 {
        match self {
            GameEvent::ScoreChanged { tick, .. } => *tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = GameEvent::score_changed(42, 15);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"ScoreChanged":{"tick":42,"score":15}}"#);
        assert_eq!(event.score(), 15);
        assert_eq!(event.tick(), 42);
    }
}
