//! Level state and lifecycle types
//!
//! Everything the owning view needs to know about a running level: the
//! mutable counters, the lifecycle phase, and the events one update emits.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the level controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Tilemap and bodies being constructed
    Loading,
    /// Active gameplay
    Playing,
    /// Player fell with lives left; momentary, resolved in the same frame
    Respawning,
    /// Player reached the right edge of the map
    LevelComplete,
    /// Terminal: lives exhausted or time up
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Fell below the map with no lives left
    FellOut,
    /// Level timer ran out
    TimeUp,
}

/// Transitions and side effects of a single update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelEvent {
    /// Player fell and was put back at the spawn point
    Respawned { life_points: u32 },
    /// Map edge reached; `next_level` is now loaded
    LevelComplete { completed: u32, next_level: u32 },
    GameOver { final_score: u64, reason: GameOverReason },
    /// The fruit-gated wall opened
    WallRemoved,
    Jumped,
    /// Some gatherables were picked up this frame
    Collected { coins: u32, fruits: u32, hearts: u32 },
}

/// Counters of the running level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelState {
    pub score: u64,
    /// Always within `[0, max_life_points]`
    pub life_points: u32,
    pub max_life_points: u32,
    pub coins_collected: u32,
    pub coins_total: u32,
    pub fruit_collected: u32,
    pub fruit_total: u32,
    /// Current level index
    pub level: u32,
    /// Map size in world pixels
    pub map_width: f32,
    pub map_height: f32,
    /// Player x at or past this completes the level
    pub end_of_map: f32,
    pub phase: LevelPhase,
}

impl LevelState {
    pub fn new(level: u32, life_points: u32, max_life_points: u32) -> Self {
        Self {
            score: 0,
            life_points: life_points.min(max_life_points),
            max_life_points,
            coins_collected: 0,
            coins_total: 0,
            fruit_collected: 0,
            fruit_total: 0,
            level,
            map_width: 0.0,
            map_height: 0.0,
            end_of_map: 0.0,
            phase: LevelPhase::Loading,
        }
    }

    /// Add lives, capped at the maximum. Returns the lives actually gained.
    pub fn gain_lives(&mut self, amount: u32) -> u32 {
        let before = self.life_points;
        self.life_points = self.life_points.saturating_add(amount).min(self.max_life_points);
        self.life_points - before
    }

    /// Spend one life. Returns false (and changes nothing) with none left.
    pub fn lose_life(&mut self) -> bool {
        if self.life_points == 0 {
            return false;
        }
        self.life_points -= 1;
        true
    }

    pub fn is_over(&self) -> bool {
        self.phase == LevelPhase::GameOver
    }
}

/// Read-only view of the HUD for the rendering collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score_text: String,
    /// One heart glyph per life point
    pub hearts: String,
    pub coins_text: String,
    pub fruit_text: String,
    pub level_text: String,
    pub timer_text: String,
    pub text_color: [u8; 4],
    pub minimap_visible: bool,
}

pub const HEART_GLYPH: char = '♥';

impl HudSnapshot {
    pub fn new(state: &LevelState, timer_text: String, text_color: [u8; 4], minimap_visible: bool) -> Self {
        Self {
            score_text: format!("Score: {}", state.score),
            hearts: std::iter::repeat_n(HEART_GLYPH, state.life_points as usize).collect(),
            coins_text: format!("{}/{}", state.coins_collected, state.coins_total),
            fruit_text: format!("{}/{}", state.fruit_collected, state.fruit_total),
            level_text: format!("Lvl: {}", state.level),
            timer_text,
            text_color,
            minimap_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_points_stay_in_range() {
        let mut state = LevelState::new(1, 9, 7);
        assert_eq!(state.life_points, 7);
        assert_eq!(state.gain_lives(3), 0);

        state.life_points = 5;
        assert_eq!(state.gain_lives(4), 2);
        assert_eq!(state.life_points, 7);

        state.life_points = 1;
        assert!(state.lose_life());
        assert!(!state.lose_life());
        assert_eq!(state.life_points, 0);
    }

    #[test]
    fn test_hud_snapshot_text() {
        let mut state = LevelState::new(2, 3, 7);
        state.score = 250;
        state.coins_collected = 3;
        state.coins_total = 5;
        state.fruit_total = 4;
        let hud = HudSnapshot::new(&state, "01:05".into(), [255, 255, 255, 255], false);
        assert_eq!(hud.score_text, "Score: 250");
        assert_eq!(hud.hearts.chars().count(), 3);
        assert_eq!(hud.coins_text, "3/5");
        assert_eq!(hud.fruit_text, "0/4");
        assert_eq!(hud.level_text, "Lvl: 2");
        assert_eq!(hud.timer_text, "01:05");
    }
}
