//! Player-following camera clamped to the map
//!
//! The camera centre tracks the player but never shows past the map edges.
//! When the map is smaller than the viewport on an axis, the camera sits
//! at the map centre on that axis.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Allowed range for the camera centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl CameraBounds {
    pub fn new(map_size: Vec2, viewport: Vec2) -> Self {
        let half = viewport * 0.5;
        Self {
            min: half,
            max: map_size - half,
        }
    }

    /// Clamp a point into the bounds, axis by axis
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            clamp_axis(p.x, self.min.x, self.max.x),
            clamp_axis(p.y, self.min.y, self.max.y),
        )
    }
}

/// Clamp one coordinate; an inverted range collapses to its midpoint
fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        return (min + max) * 0.5;
    }
    value.clamp(min, max)
}

/// Camera position for a player position on a given map and viewport
pub fn compute(
    player_x: f32,
    player_y: f32,
    map_width: f32,
    map_height: f32,
    viewport_width: f32,
    viewport_height: f32,
) -> (f32, f32) {
    let bounds = CameraBounds::new(
        Vec2::new(map_width, map_height),
        Vec2::new(viewport_width, viewport_height),
    );
    let p = bounds.clamp(Vec2::new(player_x, player_y));
    (p.x, p.y)
}

/// Camera state for one level instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraClamp {
    bounds: CameraBounds,
    position: Vec2,
}

impl CameraClamp {
    pub fn new(map_size: Vec2, viewport: Vec2) -> Self {
        let bounds = CameraBounds::new(map_size, viewport);
        Self {
            bounds,
            position: bounds.clamp(Vec2::ZERO),
        }
    }

    /// Recompute from the player position
    pub fn update(&mut self, player: Vec2) -> Vec2 {
        self.position = self.bounds.clamp(player);
        self.position
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn bounds(&self) -> CameraBounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamps_to_edges() {
        // 3000x800 map, 800x600 viewport
        assert_eq!(compute(100.0, 100.0, 3000.0, 800.0, 800.0, 600.0), (400.0, 300.0));
        assert_eq!(compute(2900.0, 700.0, 3000.0, 800.0, 800.0, 600.0), (2600.0, 500.0));
        assert_eq!(compute(1200.0, 420.0, 3000.0, 800.0, 800.0, 600.0), (1200.0, 420.0));
    }

    #[test]
    fn test_narrow_map_centres() {
        // Map narrower and shorter than the viewport
        let (x, y) = compute(50.0, 10.0, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(x, 200.0);
        assert_eq!(y, 150.0);
    }

    #[test]
    fn test_camera_clamp_tracks_player() {
        let mut cam = CameraClamp::new(Vec2::new(2000.0, 600.0), Vec2::new(800.0, 600.0));
        assert_eq!(cam.position(), Vec2::new(400.0, 300.0));
        assert_eq!(cam.update(Vec2::new(1000.0, 50.0)), Vec2::new(1000.0, 300.0));
        assert_eq!(cam.bounds().max, Vec2::new(1600.0, 300.0));
    }

    proptest! {
        #[test]
        fn prop_output_in_bounds_and_identity_inside(
            px in -5000.0f32..5000.0,
            map_w in 800.0f32..10000.0,
            vp_w in 100.0f32..800.0,
        ) {
            let (x, _) = compute(px, 0.0, map_w, 600.0, vp_w, 600.0);
            let min = vp_w / 2.0;
            let max = map_w - vp_w / 2.0;
            prop_assert!(x >= min && x <= max);
            if px >= min && px <= max {
                prop_assert_eq!(x, px);
            }
        }
    }
}
