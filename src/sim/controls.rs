//! Abstract control flags sampled once per frame
//!
//! The input collaborator (keyboard, gamepad) translates raw device events
//! into this fixed set of flags. The simulation never sees device codes.

use serde::{Deserialize, Serialize};

/// Control state for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    /// Move left
    pub left: bool,
    /// Move right
    pub right: bool,
    /// Full jump
    pub up: bool,
    /// Reduced jump
    pub soft_jump: bool,
    /// Show/hide the minimap
    pub map_toggle: bool,
    /// Open the menu
    pub menu_select: bool,
}

impl Controls {
    /// Horizontal intent: -1 (left), +1 (right) or 0 (neither or both)
    pub fn horizontal(&self) -> i8 {
        match (self.left, self.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    /// Flags that went from released to pressed since `previous`
    pub fn pressed_since(&self, previous: &Controls) -> Controls {
        Controls {
            left: self.left && !previous.left,
            right: self.right && !previous.right,
            up: self.up && !previous.up,
            soft_jump: self.soft_jump && !previous.soft_jump,
            map_toggle: self.map_toggle && !previous.map_toggle,
            menu_select: self.menu_select && !previous.menu_select,
        }
    }
}
