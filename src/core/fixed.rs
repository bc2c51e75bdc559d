//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the level simulation.
//! All gameplay quantities are integers; floats only appear at load
//! time (Tiled coordinates) and in log/render output.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 world pixels               │
//! │  Precision: 1/65536 pixel                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A level is at most a few thousand pixels wide, so the integer
//! range is comfortably large and sub-pixel motion stays exact.

use std::time::Duration;

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// Microseconds per second, for time-proportional motion.
pub const MICROS_PER_SECOND: i128 = 1_000_000;

// =============================================================================
// GAME CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Player horizontal run speed: 160 px/s = 160 * 65536
pub const PLAYER_RUN_SPEED: Fixed = 10485760;

/// Player jump speed (applied upwards): 330 px/s = 330 * 65536
pub const PLAYER_JUMP_SPEED: Fixed = 21626880;

/// Gravity acceleration: 800 px/s² = 800 * 65536
pub const GRAVITY: Fixed = 52428800;

/// Enemy patrol speed: 40 px/s = 40 * 65536
pub const ENEMY_PATROL_SPEED: Fixed = 2621440;

/// Bullet speed: 300 px/s = 300 * 65536
pub const BULLET_SPEED: Fixed = 19660800;

/// Horizontal offset of a fired bullet from the player: 10 px
pub const FIRE_OFFSET_X: Fixed = 655360;

/// Vertical offset of a fired bullet from the player: 5 px
pub const FIRE_OFFSET_Y: Fixed = 327680;

/// Points for shooting an enemy
pub const SCORE_PER_ENEMY: u32 = 10;

/// Points for collecting a crate
pub const SCORE_PER_CRATE: u32 = 5;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a float to fixed-point.
///
/// # Warning
/// Only use at compile-time or at load time. NEVER in the tick loop.
///
/// # Example
/// ```
/// use jungle_run::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Integer pixels to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then shifts back.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Integer square root (floor) using Newton-Raphson iteration.
#[inline]
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    let mut guess = n;
    let mut next = (guess + n / guess) >> 1;
    while next < guess {
        guess = next;
        next = (guess + n / guess) >> 1;
    }
    guess
}

/// Euclidean length of `(x, y)` without intermediate overflow.
#[inline]
pub fn fixed_hypot(x: Fixed, y: Fixed) -> Fixed {
    let xx = (x as i128) * (x as i128);
    let yy = (y as i128) * (y as i128);
    isqrt((xx + yy) as u128).min(i32::MAX as u128) as Fixed
}

/// Clamp a fixed-point number to a range.
///
/// When `min > max` the result is `min`, so an empty range pins to its start.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    if value > max { max.max(min) } else if value < min { min } else { value }
}

/// Distance covered at `rate` (fixed units per second) over `elapsed`.
///
/// Returned as i64 so long-running patrols cannot overflow.
/// Depends only on the total elapsed time, never on how it was split
/// into ticks.
#[inline]
pub fn fixed_over_duration(rate: Fixed, elapsed: Duration) -> i64 {
    let micros = elapsed.as_micros() as i128;
    ((rate as i128) * micros / MICROS_PER_SECOND) as i64
}

// =============================================================================
// TESTS
// =============================================================================
