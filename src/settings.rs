//! Game settings
//!
//! Loaded once per process from JSON and passed explicitly to whoever needs
//! them. Missing fields fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings loading/validation failure
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Rigid-body tuning. Forces and impulses are in pixel units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Linear damping applied to the player and dynamic items
    pub damping: f32,
    pub player_friction: f32,
    pub wall_friction: f32,
    pub dynamic_item_friction: f32,
    pub player_mass: f32,
    pub player_max_horizontal_speed: f32,
    pub player_max_vertical_speed: f32,
    /// Horizontal force while grounded
    pub player_move_force_on_ground: f32,
    /// Horizontal force while airborne
    pub player_move_force_in_air: f32,
    pub player_jump_impulse: f32,
    /// Pixels per simulation metre
    pub length_unit: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 750.0,
            damping: 0.4,
            player_friction: 1.0,
            wall_friction: 0.7,
            dynamic_item_friction: 0.6,
            player_mass: 2.0,
            player_max_horizontal_speed: 200.0,
            player_max_vertical_speed: 600.0,
            player_move_force_on_ground: 1250.0,
            player_move_force_in_air: 150.0,
            player_jump_impulse: 900.0,
            length_unit: 64.0,
        }
    }
}

/// Minimap layout and content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapSettings {
    /// Minimap width as a fraction of the viewport width
    pub width_fraction: f32,
    /// Right edge of the screen (else left)
    pub anchor_right: bool,
    /// Near the top of the screen (else bottom)
    pub anchor_top: bool,
    /// Scene layers drawn, in order
    pub layers: Vec<String>,
    pub background: [u8; 4],
    /// Player marker edge length (world pixels)
    pub marker_size: f32,
    /// Marker vertical offset from the player centre (world pixels)
    pub marker_offset_y: f32,
}

impl Default for MinimapSettings {
    fn default() -> Self {
        Self {
            width_fraction: 0.3,
            anchor_right: true,
            anchor_top: true,
            layers: ["Platforms", "Edge", "Lvl Wall", "Moving Sprites", "Coins", "Fruits"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            background: [25, 25, 40, 255],
            marker_size: 50.0,
            marker_offset_y: -32.0,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Edge of one spawn grid cell (pixels)
    pub tile_size: f32,

    // === Session ===
    pub base_level: u32,
    pub base_life_points: u32,
    pub max_life_points: u32,
    /// Player centre below this y counts as a fall
    pub fall_threshold: f32,
    pub timer_enabled: bool,

    // === Player ===
    /// Spawn grid cell used when a map has none
    pub player_spawn: [i32; 2],
    pub player_half_extents: [f32; 2],

    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    pub physics: PhysicsTuning,
    pub minimap: MinimapSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            tile_size: 64.0,

            base_level: 1,
            base_life_points: 3,
            max_life_points: crate::consts::MAX_LIFE_POINTS,
            fall_threshold: crate::consts::FALL_THRESHOLD,
            timer_enabled: true,

            player_spawn: [2, 3],
            player_half_extents: [24.0, 30.0],

            music_volume: 0.2,
            sfx_volume: 1.0,

            physics: PhysicsTuning::default(),
            minimap: MinimapSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return Err(SettingsError::Invalid("viewport must have a positive size".into()));
        }
        if self.tile_size <= 0.0 {
            return Err(SettingsError::Invalid("tile_size must be positive".into()));
        }
        if self.base_life_points > self.max_life_points {
            return Err(SettingsError::Invalid(format!(
                "base_life_points {} exceeds max_life_points {}",
                self.base_life_points, self.max_life_points
            )));
        }
        let fraction = self.minimap.width_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(SettingsError::Invalid(format!(
                "minimap width_fraction {fraction} must be in (0, 1]"
            )));
        }
        Ok(())
    }

    /// Volumes clamped to the accepted range
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }
}
