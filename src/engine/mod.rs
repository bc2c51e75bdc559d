//! Scene Engine Interface
//!
//! Capabilities the level needs from the host engine: a physics world
//! that moves bodies and reports contacts, and a view that shows the
//! camera. The level drives both; it never renders or integrates
//! physics itself.
//!
//! [`headless`] provides a minimal implementation for tests and the
//! demo binary.

pub mod headless;

use std::time::Duration;

use crate::core::fixed::Fixed;
use crate::core::vec2::FixedVec2;
use crate::game::actor::{EntityId, Sprite};
use crate::game::level::LevelData;

/// Collision group of a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyGroup {
    /// The player body
    Player,
    /// Enemy bodies
    Enemies,
    /// Bullet bodies
    Bullets,
    /// Crate bodies
    Crates,
    /// Solid tiles of the platform layer
    Platform,
}

/// How the physics world moves a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyMotion {
    /// Moved by velocity and gravity, blocked by solid tiles
    Dynamic,
    /// Placed by the level each tick
    Kinematic,
    /// Never moves
    Static,
}

/// Request to create a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodySpec {
    /// Entity the body belongs to
    pub id: EntityId,
    /// Collision group
    pub group: BodyGroup,
    /// Motion model
    pub motion: BodyMotion,
    /// Initial center
    pub position: FixedVec2,
    /// Width and height
    pub size: FixedVec2,
}

impl BodySpec {
    /// The player body.
    pub fn player(position: FixedVec2) -> Self {
        Self {
            id: EntityId::PLAYER,
            group: BodyGroup::Player,
            motion: BodyMotion::Dynamic,
            position,
            size: Sprite::PlayerIdle.body_size(),
        }
    }

    /// An enemy body.
    pub fn enemy(id: EntityId, position: FixedVec2) -> Self {
        Self {
            id,
            group: BodyGroup::Enemies,
            motion: BodyMotion::Kinematic,
            position,
            size: Sprite::EnemyRun.body_size(),
        }
    }

    /// A bullet body.
    pub fn bullet(id: EntityId, position: FixedVec2) -> Self {
        Self {
            id,
            group: BodyGroup::Bullets,
            motion: BodyMotion::Kinematic,
            position,
            size: Sprite::Bullet.body_size(),
        }
    }

    /// A crate body.
    pub fn crate_body(id: EntityId, position: FixedVec2, size: FixedVec2) -> Self {
        Self {
            id,
            group: BodyGroup::Crates,
            motion: BodyMotion::Static,
            position,
            size,
        }
    }
}

/// Two bodies overlapping after a physics step.
///
/// Unordered: `(a, b)` and `(b, a)` describe the same contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Contact {
    /// One party
    pub a: EntityId,
    /// The other party
    pub b: EntityId,
}

impl Contact {
    /// Create a contact.
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self { a, b }
    }

    /// Both parties, lower kind first.
    pub fn ordered(&self) -> (EntityId, EntityId) {
        if self.a.kind <= self.b.kind {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

/// Physics collaborator.
///
/// Velocities are fixed px/s, y down. Contacts must come back in a
/// stable order so a level is reproducible.
pub trait PhysicsWorld {
    /// Replace the world with a fresh one for `level`: solid tiles and
    /// world bounds, no bodies, no colliders, not paused.
    fn load(&mut self, level: &LevelData);

    /// Add a body.
    fn spawn_body(&mut self, spec: BodySpec);

    /// Remove a body. Unknown ids are ignored.
    fn remove_body(&mut self, id: EntityId);

    /// Set horizontal velocity.
    fn set_velocity_x(&mut self, id: EntityId, velocity: Fixed);

    /// Set vertical velocity.
    fn set_velocity_y(&mut self, id: EntityId, velocity: Fixed);

    /// Teleport a body.
    fn set_position(&mut self, id: EntityId, position: FixedVec2);

    /// Current body center.
    fn position(&self, id: EntityId) -> Option<FixedVec2>;

    /// Is the body standing on something?
    fn is_grounded(&self, id: EntityId) -> bool;

    /// Make two groups interact. With [`BodyGroup::Platform`] on one side
    /// the other group is blocked by tiles; otherwise overlaps are
    /// reported as contacts.
    fn register_collider(&mut self, a: BodyGroup, b: BodyGroup);

    /// Advance by `dt` and return this step's contacts.
    /// A paused world returns none and moves nothing.
    fn step(&mut self, dt: Duration) -> Vec<Contact>;

    /// Freeze the world until the next `load`.
    fn pause(&mut self);

    /// Is the world frozen?
    fn is_paused(&self) -> bool;
}

/// Presentation collaborator.
pub trait SceneView {
    /// Limit the camera to `[min, max]`.
    fn set_camera_bounds(&mut self, min: FixedVec2, max: FixedVec2);

    /// Follow `target` with the viewport's top-left at `scroll`.
    fn follow(&mut self, target: FixedVec2, scroll: FixedVec2);

    /// Horizontal offset of a parallax layer.
    fn set_parallax(&mut self, layer: &'static str, offset_x: Fixed);
}
