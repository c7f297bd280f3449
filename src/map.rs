//! Level maps
//!
//! A map is a set of named object layers plus per-level properties. Object
//! coordinates are object centres in unscaled map pixels with y up; the
//! map's `scaling` is applied when a level instance is built.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::collision::Aabb;

/// Layer names understood by the level loader
pub mod layers {
    pub const PLATFORMS: &str = "Platforms";
    pub const EDGE: &str = "Edge";
    pub const LEVEL_WALL: &str = "Lvl Wall";
    pub const DYNAMIC_ITEMS: &str = "Dynamic Items";
    pub const MOVING_SPRITES: &str = "Moving Sprites";
    pub const COINS: &str = "Coins";
    pub const FRUITS: &str = "Fruits";
    pub const HEARTS: &str = "Hearts";
}

/// Level loading failure. Always fatal for the level being loaded.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {level} not found")]
    NotFound { level: u32 },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed map {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("level {level} is missing property `{property}`")]
    MissingProperty { level: u32, property: &'static str },

    #[error("level {level} has an empty map")]
    InvalidDimensions { level: u32 },
}

/// One object in a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub name: Option<String>,
    /// Per-frame displacement (moving platforms)
    #[serde(default)]
    pub change_x: f32,
    #[serde(default)]
    pub change_y: f32,
    #[serde(default)]
    pub boundary_left: Option<f32>,
    #[serde(default)]
    pub boundary_right: Option<f32>,
    #[serde(default)]
    pub boundary_top: Option<f32>,
    #[serde(default)]
    pub boundary_bottom: Option<f32>,
}

impl MapObject {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            name: None,
            change_x: 0.0,
            change_y: 0.0,
            boundary_left: None,
            boundary_right: None,
            boundary_top: None,
            boundary_bottom: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Moving platform: per-frame delta and oscillation bounds
    pub fn moving(
        mut self,
        change: Vec2,
        left: Option<f32>,
        right: Option<f32>,
        top: Option<f32>,
        bottom: Option<f32>,
    ) -> Self {
        self.change_x = change.x;
        self.change_y = change.y;
        self.boundary_left = left;
        self.boundary_right = right;
        self.boundary_top = top;
        self.boundary_bottom = bottom;
        self
    }

    /// World box after scaling
    pub fn bounds(&self, scaling: f32) -> Aabb {
        Aabb::from_center(
            Vec2::new(self.x, self.y) * scaling,
            Vec2::new(self.width, self.height) * scaling * 0.5,
        )
    }
}

/// Per-level scalar properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapProperties {
    /// Timer budget; required
    #[serde(default)]
    pub seconds: Option<u32>,
    #[serde(default)]
    pub text_color: Option<[u8; 4]>,
    /// Spawn grid cell
    #[serde(default)]
    pub spawn: Option<[i32; 2]>,
}

/// Validated properties of a loaded map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMeta {
    pub seconds: u32,
    pub text_color: [u8; 4],
    pub spawn: Option<[i32; 2]>,
    pub pixel_size: Vec2,
}

fn default_scaling() -> f32 {
    1.0
}

/// A level's tilemap as delivered by the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMap {
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default = "default_scaling")]
    pub scaling: f32,
    #[serde(default)]
    pub properties: MapProperties,
    #[serde(default)]
    pub layers: BTreeMap<String, Vec<MapObject>>,
}

impl LevelMap {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_width: tile_size,
            tile_height: tile_size,
            scaling: 1.0,
            properties: MapProperties::default(),
            layers: BTreeMap::new(),
        }
    }

    pub fn with_seconds(mut self, seconds: u32) -> Self {
        self.properties.seconds = Some(seconds);
        self
    }

    pub fn with_layer(mut self, name: &str, objects: Vec<MapObject>) -> Self {
        self.layers.insert(name.to_string(), objects);
        self
    }

    /// Map size in world pixels
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            (self.width * self.tile_width) as f32,
            (self.height * self.tile_height) as f32,
        ) * self.scaling
    }

    /// Objects of a layer; empty when the layer is absent
    pub fn layer(&self, name: &str) -> &[MapObject] {
        self.layers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_layer(&self, name: &str) -> bool {
        !self.layer(name).is_empty()
    }

    pub fn validate(&self, level: u32) -> Result<MapMeta, LevelError> {
        let pixel_size = self.pixel_size();
        if pixel_size.x <= 0.0 || pixel_size.y <= 0.0 {
            return Err(LevelError::InvalidDimensions { level });
        }
        let seconds = self.properties.seconds.ok_or(LevelError::MissingProperty {
            level,
            property: "seconds",
        })?;
        Ok(MapMeta {
            seconds,
            text_color: self.properties.text_color.unwrap_or([0, 0, 0, 255]),
            spawn: self.properties.spawn,
            pixel_size,
        })
    }
}

/// Tilemap loader collaborator
pub trait LevelSource {
    fn load(&self, level: u32) -> Result<LevelMap, LevelError>;
}

/// Reads `map_<level>.json` files from a directory
#[derive(Debug, Clone)]
pub struct JsonLevelSource {
    dir: PathBuf,
}

impl JsonLevelSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, level: u32) -> PathBuf {
        self.dir.join(format!("map_{level}.json"))
    }

    fn read(path: &Path) -> Result<LevelMap, LevelError> {
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| LevelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl LevelSource for JsonLevelSource {
    fn load(&self, level: u32) -> Result<LevelMap, LevelError> {
        let path = self.path_for(level);
        if !path.exists() {
            return Err(LevelError::NotFound { level });
        }
        log::info!("map_path: {}", path.display());
        Self::read(&path)
    }
}

/// In-memory maps, keyed by level index
#[derive(Debug, Clone, Default)]
pub struct MemoryLevelSource {
    maps: BTreeMap<u32, LevelMap>,
}

impl MemoryLevelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: u32, map: LevelMap) -> Self {
        self.maps.insert(level, map);
        self
    }

    pub fn insert(&mut self, level: u32, map: LevelMap) {
        self.maps.insert(level, map);
    }
}

impl LevelSource for MemoryLevelSource {
    fn load(&self, level: u32) -> Result<LevelMap, LevelError> {
        self.maps.get(&level).cloned().ok_or(LevelError::NotFound { level })
    }
}
