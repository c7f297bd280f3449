//! Player sprite animation
//!
//! Picks the player's facing and frame from how far the physics step moved
//! the body. Airborne motion shows the jump or fall frame, standing still
//! cycles the idle frames slowly, and walking advances one walk frame per
//! `WALK_DISTANCE_PER_FRAME` pixels of horizontal travel.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    ANIMATION_DEAD_ZONE, IDLE_TICKS_PER_FRAME, PLAYER_IDLE_FRAME_COUNT, PLAYER_WALK_FRAME_COUNT,
    WALK_DISTANCE_PER_FRAME,
};

/// Which way the sprite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Frame to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pose {
    Idle(usize),
    Walk(usize),
    Jump,
    Fall,
}

/// Player animation state, fed once per simulation step
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAnimation {
    facing: Facing,
    pose: Pose,
    /// Idle ticks, wraps at `PLAYER_IDLE_FRAME_COUNT * IDLE_TICKS_PER_FRAME`
    idle_counter: usize,
    walk_frame: usize,
    /// Horizontal travel since the last walk frame change
    x_odometer: f32,
}

impl Default for PlayerAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerAnimation {
    pub fn new() -> Self {
        Self {
            facing: Facing::Right,
            pose: Pose::Idle(0),
            idle_counter: 0,
            walk_frame: 0,
            x_odometer: 0.0,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Advance from one step's displacement. `walking` is whether a
    /// horizontal control is held; walk frames only advance while it is.
    pub fn update(&mut self, delta: Vec2, grounded: bool, walking: bool) {
        if delta.x < -ANIMATION_DEAD_ZONE {
            self.facing = Facing::Left;
        } else if delta.x > ANIMATION_DEAD_ZONE {
            self.facing = Facing::Right;
        }

        self.x_odometer += delta.x;

        if !grounded {
            if delta.y > ANIMATION_DEAD_ZONE {
                self.pose = Pose::Jump;
                return;
            }
            if delta.y < -ANIMATION_DEAD_ZONE {
                self.pose = Pose::Fall;
                return;
            }
        }

        if delta.x.abs() <= ANIMATION_DEAD_ZONE {
            self.idle_counter = (self.idle_counter + 1) % (PLAYER_IDLE_FRAME_COUNT * IDLE_TICKS_PER_FRAME);
            self.pose = Pose::Idle(self.idle_counter / IDLE_TICKS_PER_FRAME);
            return;
        }

        // Moving but not far enough yet: keep the current frame
        if walking && self.x_odometer.abs() > WALK_DISTANCE_PER_FRAME {
            self.x_odometer = 0.0;
            self.walk_frame = (self.walk_frame + 1) % PLAYER_WALK_FRAME_COUNT;
            self.pose = Pose::Walk(self.walk_frame);
        }
    }
}
