//! Level State
//!
//! Everything that changes during one attempt at a level. Rebuilt from
//! the immutable [`LevelData`] on every restart.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::vec2::FixedVec2;
use crate::engine::BodySpec;
use crate::game::actor::{Actor, EntityId, Sprite};
use crate::game::enemy::EnemyPatrol;
use crate::game::level::LevelData;
use crate::game::player::PlayerState;
use crate::game::projectile::ProjectilePool;

// =============================================================================
// CRATE
// =============================================================================

/// A collectible crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Crate {
    /// Shared actor state
    pub actor: Actor,
    /// Body size
    pub size: FixedVec2,
}

impl Crate {
    /// Hash this crate's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.actor.hash_into(hasher);
        hasher.update_vec2(self.size);
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Level lifecycle.
///
/// Restarting is not stored: it happens inside the tick that ends the
/// death delay, which leaves a fresh `Running` state behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Normal play
    Running,
    /// Player died; physics paused until the respawn delay elapses
    Dying {
        /// Time accumulated since the death
        since_death: Duration,
        /// Enemy that killed the player
        killer: EntityId,
    },
}

// =============================================================================
// LEVEL STATE
// =============================================================================

/// Complete state of a level attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelState {
    /// The player
    pub player: PlayerState,

    /// Enemies present in the level (BTreeMap for deterministic order)
    pub enemies: BTreeMap<EntityId, EnemyPatrol>,

    /// Bullets
    pub projectiles: ProjectilePool,

    /// Crates not yet collected
    pub crates: BTreeMap<EntityId, Crate>,

    /// Score of this attempt
    pub score: u32,

    /// Ticks simulated while running
    pub tick: u32,

    /// Time simulated while running
    pub elapsed: Duration,

    /// Lifecycle phase
    pub phase: LevelPhase,
}

impl LevelState {
    /// Fresh state for `data`: player at the spawn, one enemy per
    /// patrol path, every crate in place, score 0.
    pub fn build(data: &LevelData) -> Self {
        let enemies = data
            .paths()
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let id = EntityId::enemy(index as u32);
                (id, EnemyPatrol::new(id, path.clone()))
            })
            .collect();

        let crates = data
            .crates()
            .iter()
            .enumerate()
            .map(|(index, placement)| {
                let id = EntityId::collectible(index as u32);
                let actor = Actor::new(id, placement.position, Sprite::Crate);
                (id, Crate { actor, size: placement.size })
            })
            .collect();

        Self {
            player: PlayerState::new(data.player_spawn()),
            enemies,
            projectiles: ProjectilePool::new(),
            crates,
            score: 0,
            tick: 0,
            elapsed: Duration::ZERO,
            phase: LevelPhase::Running,
        }
    }

    /// Physics bodies for every entity, in id order.
    pub fn body_specs(&self) -> Vec<BodySpec> {
        let mut specs = vec![BodySpec::player(self.player.actor.position)];
        specs.extend(
            self.enemies
                .values()
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| BodySpec::enemy(enemy.id(), enemy.actor.position)),
        );
        specs.extend(
            self.projectiles
                .iter()
                .filter(|p| p.actor.is_alive())
                .map(|p| BodySpec::bullet(p.actor.id, p.actor.position)),
        );
        specs.extend(
            self.crates
                .values()
                .filter(|c| c.actor.is_alive())
                .map(|c| BodySpec::crate_body(c.actor.id, c.actor.position, c.size)),
        );
        specs
    }

    /// Is gameplay running?
    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == LevelPhase::Running
    }

    /// Physics is paused exactly while dying.
    #[inline]
    pub fn is_paused(&self) -> bool {
        matches!(self.phase, LevelPhase::Dying { .. })
    }

    /// Add to the score (saturating). Returns the new score.
    pub fn add_score(&mut self, amount: u32) -> u32 {
        self.score = self.score.saturating_add(amount);
        self.score
    }

    /// Enemies still present (patrolling or stopped).
    pub fn live_enemy_count(&self) -> usize {
        self.enemies.values().filter(|e| e.is_alive()).count()
    }

    /// Crates still collectable.
    pub fn live_crate_count(&self) -> usize {
        self.crates.values().filter(|c| c.actor.is_alive()).count()
    }

    /// Remove destroyed enemies, collected crates and retired bullets.
    ///
    /// Returns every removed id exactly once, in id order.
    pub fn sweep(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();

        self.enemies.retain(|id, enemy| {
            let keep = enemy.is_alive();
            if !keep {
                removed.push(*id);
            }
            keep
        });
        removed.extend(self.projectiles.sweep());
        self.crates.retain(|id, crate_| {
            let keep = crate_.actor.is_alive();
            if !keep {
                removed.push(*id);
            }
            keep
        });

        removed
    }

    /// Compute state hash for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.elapsed, |hasher| {
            self.player.hash_into(hasher);

            // BTreeMap iteration is sorted by id
            for enemy in self.enemies.values() {
                enemy.hash_into(hasher);
            }

            self.projectiles.hash_into(hasher);

            for crate_ in self.crates.values() {
                crate_.hash_into(hasher);
            }

            hasher.update_u32(self.score);
            match self.phase {
                LevelPhase::Running => hasher.update_u8(0),
                LevelPhase::Dying { since_death, killer } => {
                    hasher.update_u8(1);
                    hasher.update_duration(since_death);
                    killer.hash_into(hasher);
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BodyGroup;
    use crate::game::enemy::PatrolState;
    use crate::game::level::tests::sample_level;

    #[test]
    fn test_build_from_level() {
        let data = sample_level();
        let state = LevelState::build(&data);

        assert!(state.player.is_alive());
        assert_eq!(state.player.actor.position, data.player_spawn());
        assert_eq!(state.enemies.len(), data.paths().len());
        assert_eq!(state.crates.len(), data.crates().len());
        assert_eq!(state.score, 0);
        assert!(state.is_running());
        assert!(!state.is_paused());

        let enemy = &state.enemies[&EntityId::enemy(0)];
        assert_eq!(enemy.state, PatrolState::Patrolling);
        assert_eq!(enemy.actor.position, data.paths()[0].start());
    }

    #[test]
    fn test_body_specs() {
        let state = LevelState::build(&sample_level());
        let specs = state.body_specs();

        let groups: Vec<BodyGroup> = specs.iter().map(|s| s.group).collect();
        assert_eq!(groups, vec![BodyGroup::Player, BodyGroup::Enemies, BodyGroup::Crates]);
        assert_eq!(specs[2].size, FixedVec2::from_ints(16, 16));
    }

    #[test]
    fn test_sweep_removes_once() {
        let mut state = LevelState::build(&sample_level());
        state.enemies.get_mut(&EntityId::enemy(0)).unwrap().destroy();
        state.crates.get_mut(&EntityId::collectible(0)).unwrap().actor.kill();
        let bullet = state.projectiles.fire(FixedVec2::ZERO, Default::default());
        state.projectiles.destroy(bullet);

        assert_eq!(
            state.sweep(),
            vec![EntityId::enemy(0), bullet, EntityId::collectible(0)]
        );
        assert!(state.sweep().is_empty());
        assert_eq!(state.live_enemy_count(), 0);
        assert_eq!(state.live_crate_count(), 0);
    }

    #[test]
    fn test_score_saturates() {
        let mut state = LevelState::build(&sample_level());
        state.score = u32::MAX - 3;
        assert_eq!(state.add_score(10), u32::MAX);
    }

    #[test]
    fn test_hash_tracks_state() {
        let data = sample_level();
        let a = LevelState::build(&data);
        let mut b = LevelState::build(&data);
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.add_score(5);
        assert_ne!(a.compute_hash(), b.compute_hash());

        let mut c = LevelState::build(&data);
        c.phase = LevelPhase::Dying { since_death: Duration::ZERO, killer: EntityId::enemy(0) };
        assert_ne!(a.compute_hash(), c.compute_hash());
    }
}
