//! Camera Follow
//!
//! Keeps the player centred in the viewport, clamped to the world, and
//! derives the parallax offsets of the background layers.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, fixed_clamp, fixed_mul, to_fixed};
use crate::core::vec2::FixedVec2;
use crate::engine::SceneView;

/// A background layer scrolled at a fraction of the camera speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallaxLayer {
    /// Texture key of the layer
    pub name: &'static str,
    /// Fraction of camera scroll applied to the layer
    pub factor: Fixed,
}

/// Background layers, back to front.
pub const PARALLAX_LAYERS: [ParallaxLayer; 3] = [
    ParallaxLayer { name: "clouds", factor: to_fixed(0.1) },
    ParallaxLayer { name: "jungle-background", factor: to_fixed(0.2) },
    ParallaxLayer { name: "jungle-foreground", factor: to_fixed(0.3) },
];

/// Camera over a fixed-size world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    world: FixedVec2,
    viewport: FixedVec2,
}

/// Everything the view needs for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraFrame {
    /// Follow target (player body center)
    pub target: FixedVec2,
    /// Top-left corner of the viewport
    pub scroll: FixedVec2,
    /// Horizontal offset of each entry of [`PARALLAX_LAYERS`]
    pub parallax: [Fixed; 3],
}

impl Camera {
    /// Camera for a world of `world` size seen through `viewport`.
    pub fn new(world: FixedVec2, viewport: FixedVec2) -> Self {
        Self { world, viewport }
    }

    /// Camera bounds: the whole world.
    pub fn bounds(&self) -> (FixedVec2, FixedVec2) {
        (FixedVec2::ZERO, self.world)
    }

    /// Frame centred on `target`.
    pub fn frame(&self, target: FixedVec2) -> CameraFrame {
        let half = FixedVec2::new(self.viewport.x / 2, self.viewport.y / 2);
        let max = self.world - self.viewport;

        // A world smaller than the viewport pins the scroll to 0
        let scroll = FixedVec2::new(
            fixed_clamp(target.x.wrapping_sub(half.x), 0, max.x),
            fixed_clamp(target.y.wrapping_sub(half.y), 0, max.y),
        );

        let mut parallax = [0; 3];
        for (offset, layer) in parallax.iter_mut().zip(PARALLAX_LAYERS.iter()) {
            *offset = fixed_mul(scroll.x, layer.factor);
        }

        CameraFrame { target, scroll, parallax }
    }
}

impl CameraFrame {
    /// Push this frame to a view.
    pub fn present(&self, view: &mut impl SceneView) {
        view.follow(self.target, self.scroll);
        for (layer, offset) in PARALLAX_LAYERS.iter().zip(self.parallax) {
            view.set_parallax(layer.name, offset);
        }
    }
}
