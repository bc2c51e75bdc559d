//! Enemy Patrol
//!
//! Enemies walk a level-authored path back and forth at constant speed.
//! Position is a closed-form function of total patrol time, so the
//! trajectory does not depend on how time was split into ticks.

use std::sync::Arc;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, fixed_over_duration};
use crate::core::hash::StateHasher;
use crate::core::vec2::FixedVec2;
use crate::game::actor::{Actor, EntityId, Facing, Sprite};

// =============================================================================
// PATROL PATH
// =============================================================================

/// Why a path cannot be patrolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathDefect {
    /// Fewer than two waypoints
    TooFewWaypoints,
    /// All waypoints coincide
    ZeroLength,
}

/// Ordered waypoints an enemy walks along.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatrolPath {
    waypoints: Vec<FixedVec2>,
    /// Arc length at the start of each waypoint (same length as `waypoints`)
    arc_starts: Vec<i64>,
    total_length: i64,
}

impl PatrolPath {
    /// Build a path from waypoints.
    pub fn new(waypoints: Vec<FixedVec2>) -> Result<Self, PathDefect> {
        if waypoints.len() < 2 {
            return Err(PathDefect::TooFewWaypoints);
        }

        let mut arc_starts = Vec::with_capacity(waypoints.len());
        let mut total: i64 = 0;
        arc_starts.push(0);
        for pair in waypoints.windows(2) {
            total += (pair[1] - pair[0]).length() as i64;
            arc_starts.push(total);
        }

        if total == 0 {
            return Err(PathDefect::ZeroLength);
        }

        Ok(Self {
            waypoints,
            arc_starts,
            total_length: total,
        })
    }

    /// First waypoint.
    pub fn start(&self) -> FixedVec2 {
        self.waypoints[0]
    }

    /// Last waypoint.
    pub fn end(&self) -> FixedVec2 {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Waypoints in walking order.
    pub fn waypoints(&self) -> &[FixedVec2] {
        &self.waypoints
    }

    /// Total arc length in fixed units.
    pub fn length(&self) -> i64 {
        self.total_length
    }

    /// Point at arc length `s` (clamped to the path) and the segment's
    /// horizontal delta in walking order.
    pub fn point_at(&self, s: i64) -> (FixedVec2, Fixed) {
        let s = s.clamp(0, self.total_length);

        // Last segment whose start is <= s, skipping zero-length segments at s
        let idx = self
            .arc_starts
            .partition_point(|start| *start <= s)
            .saturating_sub(1)
            .min(self.waypoints.len() - 2);

        let a = self.waypoints[idx];
        let b = self.waypoints[idx + 1];
        let seg_len = self.arc_starts[idx + 1] - self.arc_starts[idx];
        let delta = b - a;

        if seg_len == 0 {
            return (b, delta.x);
        }

        let local = s - self.arc_starts[idx];
        let x = a.x as i64 + (delta.x as i64 * local) / seg_len;
        let y = a.y as i64 + (delta.y as i64 * local) / seg_len;
        (FixedVec2::new(x as Fixed, y as Fixed), delta.x)
    }

    /// Ping-pong position after walking `distance` from the start.
    ///
    /// Returns the position and the direction of travel, if horizontal.
    pub fn ping_pong(&self, distance: i64) -> (FixedVec2, Option<Facing>) {
        let cycle = self.total_length * 2;
        let s = distance.rem_euclid(cycle);

        if s <= self.total_length {
            let (point, dx) = self.point_at(s);
            (point, Facing::from_delta(dx))
        } else {
            let (point, dx) = self.point_at(cycle - s);
            (point, Facing::from_delta(dx.wrapping_neg()))
        }
    }
}

// =============================================================================
// ENEMY PATROL
// =============================================================================

/// Enemy state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PatrolState {
    /// Walking the path
    Patrolling = 0,
    /// Touched the player; frozen in place, still present
    Stopped = 1,
    /// Shot; removed from the level
    Destroyed = 2,
}

/// A patrolling enemy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnemyPatrol {
    /// Shared actor state
    pub actor: Actor,

    /// Current state
    pub state: PatrolState,

    /// Path owned by the level data
    path: Arc<PatrolPath>,

    /// Time spent patrolling
    patrol_time: Duration,
}

impl EnemyPatrol {
    /// Place a new enemy at the start of its path.
    pub fn new(id: EntityId, path: Arc<PatrolPath>) -> Self {
        let (position, facing) = path.ping_pong(0);
        let mut actor = Actor::new(id, position, Sprite::EnemyRun);
        if let Some(facing) = facing {
            actor.facing = facing;
        }

        Self {
            actor,
            state: PatrolState::Patrolling,
            path,
            patrol_time: Duration::ZERO,
        }
    }

    /// Entity id.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.actor.id
    }

    /// Present in the level (patrolling or stopped)?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.actor.is_alive()
    }

    /// The path this enemy walks.
    pub fn path(&self) -> &PatrolPath {
        &self.path
    }

    /// Advance along the path by `dt` at `speed` (fixed px/s).
    ///
    /// No-op unless patrolling.
    pub fn advance(&mut self, dt: Duration, speed: Fixed) {
        if self.state != PatrolState::Patrolling {
            return;
        }

        self.patrol_time += dt;
        let distance = fixed_over_duration(speed, self.patrol_time);
        let (position, facing) = self.path.ping_pong(distance);

        self.actor.position = position;
        if let Some(facing) = facing {
            self.actor.facing = facing;
        }
    }

    /// Freeze after touching the player.
    ///
    /// Returns `true` only on the transition out of `Patrolling`.
    pub fn stop(&mut self) -> bool {
        if self.state != PatrolState::Patrolling {
            return false;
        }
        self.state = PatrolState::Stopped;
        true
    }

    /// Destroy after being shot.
    ///
    /// Returns `true` only for the call that destroyed it.
    pub fn destroy(&mut self) -> bool {
        if self.state == PatrolState::Destroyed {
            return false;
        }
        self.state = PatrolState::Destroyed;
        self.actor.kill()
    }

    /// Hash this enemy's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.actor.hash_into(hasher);
        hasher.update_u8(self.state as u8);
        hasher.update_duration(self.patrol_time);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, ENEMY_PATROL_SPEED};
    use proptest::prelude::*;

    fn line(ax: i32, bx: i32, y: i32) -> Arc<PatrolPath> {
        Arc::new(PatrolPath::new(vec![FixedVec2::from_ints(ax, y), FixedVec2::from_ints(bx, y)]).unwrap())
    }

    #[test]
    fn test_path_validation() {
        assert_eq!(PatrolPath::new(vec![]), Err(PathDefect::TooFewWaypoints));
        assert_eq!(
            PatrolPath::new(vec![FixedVec2::from_ints(1, 1)]),
            Err(PathDefect::TooFewWaypoints)
        );
        assert_eq!(
            PatrolPath::new(vec![FixedVec2::from_ints(1, 1), FixedVec2::from_ints(1, 1)]),
            Err(PathDefect::ZeroLength)
        );
    }

    #[test]
    fn test_ping_pong_reverses_at_ends() {
        let path = line(0, 100, 50);
        assert_eq!(path.length(), from_int(100) as i64);

        let (p, f) = path.ping_pong(from_int(40) as i64);
        assert_eq!(p, FixedVec2::from_ints(40, 50));
        assert_eq!(f, Some(Facing::Right));

        let (p, _) = path.ping_pong(from_int(100) as i64);
        assert_eq!(p, FixedVec2::from_ints(100, 50));

        let (p, f) = path.ping_pong(from_int(130) as i64);
        assert_eq!(p, FixedVec2::from_ints(70, 50));
        assert_eq!(f, Some(Facing::Left));

        let (p, f) = path.ping_pong(from_int(210) as i64);
        assert_eq!(p, FixedVec2::from_ints(10, 50));
        assert_eq!(f, Some(Facing::Right));
    }

    #[test]
    fn test_polyline_path() {
        // Right 30, then down 40
        let path = PatrolPath::new(vec![
            FixedVec2::from_ints(0, 0),
            FixedVec2::from_ints(30, 0),
            FixedVec2::from_ints(30, 40),
        ])
        .unwrap();
        assert_eq!(path.length(), from_int(70) as i64);

        let (p, f) = path.ping_pong(from_int(50) as i64);
        assert_eq!(p, FixedVec2::from_ints(30, 20));
        assert_eq!(f, None, "vertical segment has no horizontal facing");
        assert_eq!(path.end(), FixedVec2::from_ints(30, 40));
    }

    #[test]
    fn test_enemy_walks_then_turns() {
        let mut enemy = EnemyPatrol::new(EntityId::enemy(0), line(0, 40, 0));
        assert_eq!(enemy.actor.position, FixedVec2::from_ints(0, 0));

        // 40 px/s for 1.5 s = 60 px → 20 px back from the far end
        enemy.advance(Duration::from_millis(1500), ENEMY_PATROL_SPEED);
        assert_eq!(enemy.actor.position, FixedVec2::from_ints(20, 0));
        assert_eq!(enemy.actor.facing, Facing::Left);
    }

    #[test]
    fn test_stopped_enemy_freezes() {
        let mut enemy = EnemyPatrol::new(EntityId::enemy(0), line(0, 100, 0));
        enemy.advance(Duration::from_millis(500), ENEMY_PATROL_SPEED);
        let frozen = enemy.actor.position;

        assert!(enemy.stop());
        enemy.advance(Duration::from_secs(3), ENEMY_PATROL_SPEED);
        assert_eq!(enemy.actor.position, frozen);
        assert!(enemy.is_alive());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut enemy = EnemyPatrol::new(EntityId::enemy(0), line(0, 100, 0));
        assert!(enemy.stop());
        assert!(!enemy.stop());
        assert_eq!(enemy.state, PatrolState::Stopped);
    }

    #[test]
    fn test_destroy_once() {
        let mut enemy = EnemyPatrol::new(EntityId::enemy(0), line(0, 100, 0));
        assert!(enemy.destroy());
        assert!(!enemy.destroy());
        assert!(!enemy.stop(), "destroyed enemies cannot be stopped");
        assert_eq!(enemy.state, PatrolState::Destroyed);
        assert!(!enemy.is_alive());
    }

    proptest! {
        #[test]
        fn prop_patrol_stays_on_segment(
            ax in 0i32..500,
            len in 1i32..500,
            steps in prop::collection::vec(1u64..100_000, 1..200),
        ) {
            let path = line(ax, ax + len, 10);
            let mut enemy = EnemyPatrol::new(EntityId::enemy(0), path);
            for micros in steps {
                enemy.advance(Duration::from_micros(micros), ENEMY_PATROL_SPEED);
                prop_assert!(enemy.actor.position.x >= from_int(ax));
                prop_assert!(enemy.actor.position.x <= from_int(ax + len));
                prop_assert_eq!(enemy.actor.position.y, from_int(10));
            }
        }

        #[test]
        fn prop_patrol_independent_of_tick_rate(
            len in 1i32..400,
            total_ms in 1u64..20_000,
            fast_hz in 30u64..240,
            slow_hz in 5u64..30,
        ) {
            let path = line(0, len, 0);
            let mut fast = EnemyPatrol::new(EntityId::enemy(0), path.clone());
            let mut slow = EnemyPatrol::new(EntityId::enemy(0), path);

            let total = Duration::from_millis(total_ms);
            for (enemy, hz) in [(&mut fast, fast_hz), (&mut slow, slow_hz)] {
                let step = Duration::from_micros(1_000_000 / hz);
                let mut elapsed = Duration::ZERO;
                while elapsed + step <= total {
                    enemy.advance(step, ENEMY_PATROL_SPEED);
                    elapsed += step;
                }
                enemy.advance(total - elapsed, ENEMY_PATROL_SPEED);
            }

            prop_assert_eq!(fast.actor.position, slow.actor.position);
            prop_assert_eq!(fast.actor.facing, slow.actor.facing);
        }
    }
}
