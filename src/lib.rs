//! Cat Platformer - a side-scrolling physics platformer
//!
//! Core modules:
//! - `sim`: Frame-by-frame simulation (physics, collectibles, timer, level lifecycle)
//! - `map`: Tilemap data and level sources
//! - `session`: Menu / playing / game-over state driven by UI commands
//! - `audio`: Sound cue triggers behind a playback backend
//! - `settings`: Data-driven configuration

pub mod audio;
pub mod map;
pub mod session;
pub mod settings;
pub mod sim;

pub use map::{LevelError, LevelMap, LevelSource};
pub use session::{Session, SessionCommand, SessionView};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Player centre below this y has fallen out of the map
    pub const FALL_THRESHOLD: f32 = 16.0;
    /// Hard cap on life points
    pub const MAX_LIFE_POINTS: u32 = 7;

    /// Score per collected item
    pub const COIN_SCORE_COEFFICIENT: u64 = 50;
    pub const FRUIT_SCORE_COEFFICIENT: u64 = 100;
    /// Hearts give a life point instead of score
    pub const HEART_SCORE_COEFFICIENT: u64 = 0;

    /// Coin spin animation
    pub const COIN_FRAME_COUNT: u64 = 12;
    pub const COIN_TICKS_PER_FRAME: u64 = 20;

    /// Player sprite animation
    pub const PLAYER_WALK_FRAME_COUNT: usize = 32;
    pub const PLAYER_IDLE_FRAME_COUNT: usize = 16;
    pub const IDLE_TICKS_PER_FRAME: usize = 50;
    /// Per-step movement (pixels) below this counts as standing still
    pub const ANIMATION_DEAD_ZONE: f32 = 0.1;
    /// Horizontal travel (pixels) per walk frame
    pub const WALK_DISTANCE_PER_FRAME: f32 = 3.5;
}
