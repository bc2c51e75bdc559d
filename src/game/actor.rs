//! Actor Definitions
//!
//! The state shared by every positioned, collidable entity:
//! player, enemies, projectiles and crates.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::hash::StateHasher;
use crate::core::vec2::FixedVec2;

// =============================================================================
// ACTOR KIND / ENTITY ID
// =============================================================================

/// What an actor is.
///
/// Ordering is used for deterministic iteration across kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActorKind {
    /// The player character
    Player = 0,
    /// A patrolling enemy
    Enemy = 1,
    /// A bullet fired by the player
    Projectile = 2,
    /// A collectible crate
    Collectible = 3,
}

/// Unique entity identifier within one level attempt.
///
/// Indices are allocated per kind, so the kind of the other party in a
/// contact is known without a lookup.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// Kind of the entity
    pub kind: ActorKind,
    /// Per-kind index (monotonic within a level attempt)
    pub index: u32,
}

impl EntityId {
    /// The single player of a level.
    pub const PLAYER: Self = Self::new(ActorKind::Player, 0);

    /// Create an id.
    pub const fn new(kind: ActorKind, index: u32) -> Self {
        Self { kind, index }
    }

    /// Enemy id.
    pub const fn enemy(index: u32) -> Self {
        Self::new(ActorKind::Enemy, index)
    }

    /// Projectile id.
    pub const fn projectile(index: u32) -> Self {
        Self::new(ActorKind::Projectile, index)
    }

    /// Crate id.
    pub const fn collectible(index: u32) -> Self {
        Self::new(ActorKind::Collectible, index)
    }

    /// Hash this id.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.kind as u8);
        hasher.update_u32(self.index);
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            ActorKind::Player => "player",
            ActorKind::Enemy => "enemy",
            ActorKind::Projectile => "bullet",
            ActorKind::Collectible => "crate",
        };
        write!(f, "{}#{}", tag, self.index)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// FACING
// =============================================================================

/// Horizontal facing direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum Facing {
    /// Facing -x
    Left,
    /// Facing +x (initial facing of every sprite)
    #[default]
    Right,
}

impl Facing {
    /// Direction sign: -1 for left, +1 for right.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    /// Whether the sprite is drawn mirrored.
    #[inline]
    pub fn flip_x(self) -> bool {
        self == Facing::Left
    }

    /// Apply the direction to a magnitude.
    #[inline]
    pub fn apply(self, magnitude: Fixed) -> Fixed {
        match self {
            Facing::Left => magnitude.wrapping_neg(),
            Facing::Right => magnitude,
        }
    }

    /// Facing implied by a horizontal delta; `None` when there is none.
    #[inline]
    pub fn from_delta(dx: Fixed) -> Option<Facing> {
        match dx {
            dx if dx < 0 => Some(Facing::Left),
            dx if dx > 0 => Some(Facing::Right),
            _ => None,
        }
    }
}

// =============================================================================
// SPRITE
// =============================================================================

/// Sprite / animation identity of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Sprite {
    /// Player standing still
    PlayerIdle = 0,
    /// Player running animation
    PlayerRun = 1,
    /// Player airborne animation
    PlayerJump = 2,
    /// Enemy walking animation
    EnemyRun = 3,
    /// Bullet animation
    Bullet = 4,
    /// Static crate
    Crate = 5,
}

impl Sprite {
    /// Texture key the scene engine loads this sprite under.
    pub fn texture_key(self) -> &'static str {
        match self {
            Sprite::PlayerIdle => "player",
            Sprite::PlayerRun => "player-run",
            Sprite::PlayerJump => "player-jump",
            Sprite::EnemyRun => "enemy-run",
            Sprite::Bullet => "bullet",
            Sprite::Crate => "crate",
        }
    }

    /// Collision body size in pixels (frame size of the sheet).
    pub fn body_size(self) -> FixedVec2 {
        match self {
            Sprite::PlayerIdle | Sprite::PlayerRun | Sprite::PlayerJump | Sprite::EnemyRun => {
                FixedVec2::from_ints(22, 22)
            }
            Sprite::Bullet => FixedVec2::from_ints(8, 8),
            Sprite::Crate => FixedVec2::from_ints(16, 16),
        }
    }
}

// =============================================================================
// ACTOR
// =============================================================================

/// Common entity state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    /// Entity id (carries the kind)
    pub id: EntityId,

    /// Body center in world pixels
    pub position: FixedVec2,

    /// Current facing
    pub facing: Facing,

    /// Still part of the simulation?
    alive: bool,

    /// Current sprite / animation
    pub sprite: Sprite,
}

impl Actor {
    /// Create a live actor facing right.
    pub fn new(id: EntityId, position: FixedVec2, sprite: Sprite) -> Self {
        Self {
            id,
            position,
            facing: Facing::Right,
            alive: true,
            sprite,
        }
    }

    /// Kind of this actor.
    #[inline]
    pub fn kind(&self) -> ActorKind {
        self.id.kind
    }

    /// Is the actor still live?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the actor dead.
    ///
    /// Returns `true` only for the call that actually killed it, so
    /// callers can schedule removal exactly once.
    pub fn kill(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    /// Hash this actor's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.id.hash_into(hasher);
        hasher.update_vec2(self.position);
        hasher.update_bool(self.facing.flip_x());
        hasher.update_bool(self.alive);
        hasher.update_u8(self.sprite as u8);
    }
}

// =============================================================================
// TESTS
// =============================================================================
