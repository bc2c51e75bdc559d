//! Collision Policy
//!
//! Maps physics contacts to game effects. Dispatch is pure; the
//! orchestrator applies each contact's effects before dispatching the
//! next, so an entity destroyed by one contact takes part in no later
//! contact.

use tracing::debug;

use crate::core::fixed::{SCORE_PER_CRATE, SCORE_PER_ENEMY};
use crate::engine::Contact;
use crate::game::actor::{ActorKind, EntityId};
use crate::game::events::GameEvent;
use crate::game::state::{LevelPhase, LevelState};

/// A single state change produced by a contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Remove a shot enemy
    DestroyEnemy(EntityId),
    /// Remove a bullet that hit something
    DestroyProjectile(EntityId),
    /// Remove a collected crate
    DestroyCrate(EntityId),
    /// Increase the score
    AddScore(u32),
    /// The player dies
    KillPlayer,
    /// Freeze an enemy that touched the player
    StopEnemy(EntityId),
    /// Pause and schedule the restart
    BeginDeathSequence(EntityId),
}

/// Effects of one contact. Unknown, dead or unrelated parties yield none.
pub fn dispatch(state: &LevelState, contact: Contact) -> Vec<Effect> {
    let (first, second) = contact.ordered();

    match (first.kind, second.kind) {
        (ActorKind::Player, ActorKind::Enemy) => player_meets_enemy(state, second),
        (ActorKind::Player, ActorKind::Collectible) => player_meets_crate(state, second),
        (ActorKind::Enemy, ActorKind::Projectile) => bullet_hits_enemy(state, first, second),
        _ => Vec::new(),
    }
}

fn player_meets_enemy(state: &LevelState, enemy: EntityId) -> Vec<Effect> {
    let enemy_alive = state.enemies.get(&enemy).is_some_and(|e| e.is_alive());
    if !enemy_alive {
        return Vec::new();
    }

    if state.player.is_alive() && state.is_running() {
        vec![Effect::KillPlayer, Effect::StopEnemy(enemy), Effect::BeginDeathSequence(enemy)]
    } else {
        // Player already died this tick; only freeze the enemy
        vec![Effect::StopEnemy(enemy)]
    }
}

fn player_meets_crate(state: &LevelState, crate_id: EntityId) -> Vec<Effect> {
    let crate_alive = state.crates.get(&crate_id).is_some_and(|c| c.actor.is_alive());
    if !crate_alive || !state.player.is_alive() || !state.is_running() {
        return Vec::new();
    }
    vec![Effect::DestroyCrate(crate_id), Effect::AddScore(SCORE_PER_CRATE)]
}

fn bullet_hits_enemy(state: &LevelState, enemy: EntityId, bullet: EntityId) -> Vec<Effect> {
    let enemy_alive = state.enemies.get(&enemy).is_some_and(|e| e.is_alive());
    if !enemy_alive || !state.projectiles.is_live(&bullet) || !state.is_running() {
        return Vec::new();
    }
    vec![
        Effect::DestroyEnemy(enemy),
        Effect::DestroyProjectile(bullet),
        Effect::AddScore(SCORE_PER_ENEMY),
    ]
}

/// Apply one effect. Returns the score event when the score changed.
pub fn apply(state: &mut LevelState, effect: Effect) -> Option<GameEvent> {
    debug!(?effect, tick = state.tick, "Applying effect");

    match effect {
        Effect::DestroyEnemy(id) => {
            if let Some(enemy) = state.enemies.get_mut(&id) {
                enemy.destroy();
            }
        }
        Effect::DestroyProjectile(id) => {
            state.projectiles.destroy(id);
        }
        Effect::DestroyCrate(id) => {
            if let Some(crate_) = state.crates.get_mut(&id) {
                crate_.actor.kill();
            }
        }
        Effect::AddScore(amount) => {
            let score = state.add_score(amount);
            return Some(GameEvent::score_changed(state.tick, score));
        }
        Effect::KillPlayer => {
            state.player.kill();
        }
        Effect::StopEnemy(id) => {
            if let Some(enemy) = state.enemies.get_mut(&id) {
                enemy.stop();
            }
        }
        Effect::BeginDeathSequence(killer) => {
            if state.is_running() {
                state.phase = LevelPhase::Dying {
                    since_death: std::time::Duration::ZERO,
                    killer,
                };
            }
        }
    }
    None
}

/// Dispatch and apply a batch of contacts in order.
///
/// Returns the score events produced.
pub fn resolve_contacts(state: &mut LevelState, contacts: &[Contact]) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for contact in contacts {
        for effect in dispatch(state, *contact) {
            events.extend(apply(state, effect));
        }
    }
    events
}

// =============================================================================
// TESTS
// =============================================================================
