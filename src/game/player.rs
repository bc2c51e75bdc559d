//! Player Controller
//!
//! Maps one frame of keyboard input plus the grounded flag to
//! movement, jump and fire intents.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIRE_OFFSET_X, FIRE_OFFSET_Y};
use crate::core::hash::StateHasher;
use crate::core::vec2::FixedVec2;
use crate::game::actor::{Actor, EntityId, Facing, Sprite};
use crate::game::input::{FireEdge, InputFrame};

/// State of the player in a level attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Shared actor state
    pub actor: Actor,

    /// Was the body standing on something after the last physics step?
    pub grounded: bool,
}

impl PlayerState {
    /// Create a live player at the spawn point.
    pub fn new(spawn: FixedVec2) -> Self {
        Self {
            actor: Actor::new(EntityId::PLAYER, spawn, Sprite::PlayerIdle),
            grounded: false,
        }
    }

    /// Is the player alive?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.actor.is_alive()
    }

    /// Kill the player. Returns `true` only on the first call.
    pub fn kill(&mut self) -> bool {
        self.actor.kill()
    }

    /// Where a bullet fired now would appear.
    pub fn muzzle(&self) -> FixedVec2 {
        let position = self.actor.position;
        FixedVec2::new(
            position.x.wrapping_add(self.actor.facing.apply(FIRE_OFFSET_X)),
            position.y.wrapping_add(FIRE_OFFSET_Y),
        )
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.actor.hash_into(hasher);
        hasher.update_bool(self.grounded);
    }
}

/// Request to spawn one bullet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FireOrder {
    /// Spawn point
    pub origin: FixedVec2,
    /// Travel direction
    pub direction: Facing,
}

/// Everything the controller wants done this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    /// Horizontal velocity to set (always set, 0 when idle)
    pub velocity_x: Fixed,
    /// Issue a jump impulse
    pub jump: bool,
    /// Spawn a bullet
    pub fire: Option<FireOrder>,
}

/// Turns input into intents.
///
/// Lives across level restarts: it models the keyboard, not the level.
#[derive(Clone, Debug, Default)]
pub struct PlayerController {
    fire_edge: FireEdge,
}

impl PlayerController {
    /// Create a controller with no key history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one frame.
    ///
    /// Returns `None` without touching anything when the player is dead.
    /// Otherwise updates facing and sprite and returns the intents.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        input: &InputFrame,
        run_speed: Fixed,
    ) -> Option<PlayerIntent> {
        if !player.is_alive() {
            return None;
        }

        let mut intent = PlayerIntent::default();

        // Jump may combine with running
        intent.jump = input.up() && player.grounded;

        // Left is checked first and wins a tie
        if input.left() {
            intent.velocity_x = Facing::Left.apply(run_speed);
            player.actor.facing = Facing::Left;
        } else if input.right() {
            intent.velocity_x = Facing::Right.apply(run_speed);
            player.actor.facing = Facing::Right;
        }

        player.actor.sprite = select_sprite(player.grounded && !intent.jump, intent.velocity_x);

        if self.fire_edge.just_pressed(input.fire()) {
            intent.fire = Some(FireOrder {
                origin: player.muzzle(),
                direction: player.actor.facing,
            });
        }

        Some(intent)
    }
}

/// Animation for the current movement.
fn select_sprite(grounded: bool, velocity_x: Fixed) -> Sprite {
    if !grounded {
        Sprite::PlayerJump
    } else if velocity_x != 0 {
        Sprite::PlayerRun
    } else {
        Sprite::PlayerIdle
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, PLAYER_RUN_SPEED};

    fn grounded_player(x: i32, y: i32) -> PlayerState {
        let mut player = PlayerState::new(FixedVec2::from_ints(x, y));
        player.grounded = true;
        player
    }

    #[test]
    fn test_idle_stops() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(100, 50);

        let intent = controller.update(&mut player, &InputFrame::new(), PLAYER_RUN_SPEED).unwrap();
        assert_eq!(intent, PlayerIntent::default());
        assert_eq!(player.actor.sprite, Sprite::PlayerIdle);
        assert_eq!(player.actor.facing, Facing::Right);
    }

    #[test]
    fn test_run_left_and_right() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(100, 50);

        let left = controller
            .update(&mut player, &InputFrame::new().with_left(true), PLAYER_RUN_SPEED)
            .unwrap();
        assert_eq!(left.velocity_x, -PLAYER_RUN_SPEED);
        assert_eq!(player.actor.facing, Facing::Left);
        assert_eq!(player.actor.sprite, Sprite::PlayerRun);

        // Releasing keeps the last facing
        controller.update(&mut player, &InputFrame::new(), PLAYER_RUN_SPEED);
        assert_eq!(player.actor.facing, Facing::Left);

        let right = controller
            .update(&mut player, &InputFrame::new().with_right(true), PLAYER_RUN_SPEED)
            .unwrap();
        assert_eq!(right.velocity_x, PLAYER_RUN_SPEED);
        assert_eq!(player.actor.facing, Facing::Right);
    }

    #[test]
    fn test_left_wins_tie() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(0, 0);

        let both = InputFrame::new().with_left(true).with_right(true);
        let intent = controller.update(&mut player, &both, PLAYER_RUN_SPEED).unwrap();
        assert_eq!(intent.velocity_x, -PLAYER_RUN_SPEED);
        assert_eq!(player.actor.facing, Facing::Left);
    }

    #[test]
    fn test_jump_requires_ground() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(0, 0);
        let up = InputFrame::new().with_up(true);

        let intent = controller.update(&mut player, &up, PLAYER_RUN_SPEED).unwrap();
        assert!(intent.jump);
        assert_eq!(player.actor.sprite, Sprite::PlayerJump);

        player.grounded = false;
        let intent = controller.update(&mut player, &up, PLAYER_RUN_SPEED).unwrap();
        assert!(!intent.jump, "no jump while airborne");
    }

    #[test]
    fn test_fire_right_offset() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(100, 50);

        let intent = controller
            .update(&mut player, &InputFrame::new().with_fire(true), PLAYER_RUN_SPEED)
            .unwrap();
        let order = intent.fire.unwrap();
        assert_eq!(order.origin, FixedVec2::from_ints(110, 55));
        assert_eq!(order.direction, Facing::Right);
    }

    #[test]
    fn test_fire_left_offset_uses_new_facing() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(100, 50);

        let input = InputFrame::new().with_left(true).with_fire(true);
        let intent = controller.update(&mut player, &input, PLAYER_RUN_SPEED).unwrap();
        let order = intent.fire.unwrap();
        assert_eq!(order.origin, FixedVec2::new(from_int(90), from_int(55)));
        assert_eq!(order.direction, Facing::Left);
    }

    #[test]
    fn test_fire_held_does_not_repeat() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(0, 0);
        let fire = InputFrame::new().with_fire(true);

        assert!(controller.update(&mut player, &fire, PLAYER_RUN_SPEED).unwrap().fire.is_some());
        for _ in 0..10 {
            assert!(controller.update(&mut player, &fire, PLAYER_RUN_SPEED).unwrap().fire.is_none());
        }
        controller.update(&mut player, &InputFrame::new(), PLAYER_RUN_SPEED);
        assert!(controller.update(&mut player, &fire, PLAYER_RUN_SPEED).unwrap().fire.is_some());
    }

    #[test]
    fn test_dead_player_skipped() {
        let mut controller = PlayerController::new();
        let mut player = grounded_player(0, 0);
        player.kill();

        let input = InputFrame::new().with_left(true).with_fire(true);
        assert!(controller.update(&mut player, &input, PLAYER_RUN_SPEED).is_none());
        assert_eq!(player.actor.facing, Facing::Right, "dead player keeps its facing");
        assert_eq!(controller.fire_edge, FireEdge::default(), "edge memory untouched");
    }
}
