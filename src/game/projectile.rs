//! Projectile Pool
//!
//! Bullets fired by the player. Each one flies horizontally at constant
//! speed until it hits an enemy, leaves the world, or times out.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, fixed_over_duration};
use crate::core::hash::StateHasher;
use crate::core::vec2::FixedVec2;
use crate::game::actor::{Actor, EntityId, Facing, Sprite};

/// A live or retired bullet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projectile {
    /// Shared actor state
    pub actor: Actor,

    /// Spawn point
    pub origin: FixedVec2,

    /// Time since fired
    pub age: Duration,
}

impl Projectile {
    /// Travel direction.
    #[inline]
    pub fn direction(&self) -> Facing {
        self.actor.facing
    }

    /// Hash this projectile's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.actor.hash_into(hasher);
        hasher.update_vec2(self.origin);
        hasher.update_duration(self.age);
    }
}

/// All bullets of a level attempt.
///
/// No reuse and no cap: every `fire` creates a fresh entity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectilePool {
    projectiles: BTreeMap<EntityId, Projectile>,
    next_index: u32,
}

impl ProjectilePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one bullet at `origin` travelling towards `direction`.
    pub fn fire(&mut self, origin: FixedVec2, direction: Facing) -> EntityId {
        let id = EntityId::projectile(self.next_index);
        self.next_index += 1;

        let mut actor = Actor::new(id, origin, Sprite::Bullet);
        actor.facing = direction;

        self.projectiles.insert(id, Projectile {
            actor,
            origin,
            age: Duration::ZERO,
        });
        id
    }

    /// Move every live bullet and retire the ones that left
    /// `[0, world_width]` or reached `lifetime`.
    pub fn advance(&mut self, dt: Duration, speed: Fixed, world_width: Fixed, lifetime: Duration) {
        for projectile in self.projectiles.values_mut() {
            if !projectile.actor.is_alive() {
                continue;
            }

            projectile.age += dt;
            let travelled = fixed_over_duration(speed, projectile.age);
            let x = projectile.origin.x as i64 + projectile.direction().sign() as i64 * travelled;

            let out_of_bounds = x < 0 || x > world_width as i64;
            if out_of_bounds || projectile.age >= lifetime {
                projectile.actor.kill();
                continue;
            }

            projectile.actor.position.x = x as Fixed;
        }
    }

    /// Destroy a bullet. Returns `true` only for the call that destroyed it.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        self.projectiles
            .get_mut(&id)
            .is_some_and(|projectile| projectile.actor.kill())
    }

    /// Remove every retired bullet, returning each id exactly once.
    pub fn sweep(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.projectiles.retain(|id, projectile| {
            let keep = projectile.actor.is_alive();
            if !keep {
                removed.push(*id);
            }
            keep
        });
        removed
    }

    /// Look up a bullet.
    pub fn get(&self, id: &EntityId) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    /// Is this bullet still flying?
    pub fn is_live(&self, id: &EntityId) -> bool {
        self.get(id).is_some_and(|projectile| projectile.actor.is_alive())
    }

    /// All bullets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// Number of live bullets.
    pub fn live_count(&self) -> usize {
        self.iter().filter(|p| p.actor.is_alive()).count()
    }

    /// Total bullets fired this attempt.
    pub fn fired_count(&self) -> u32 {
        self.next_index
    }

    /// Hash all bullets in id order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.next_index);
        for projectile in self.projectiles.values() {
            projectile.hash_into(hasher);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
