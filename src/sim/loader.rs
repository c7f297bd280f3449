//! Level instance construction
//!
//! A [`LevelInstance`] is everything that lives for exactly one load of a
//! level: the physics world with its bodies, the collectible sets, the
//! timer, the camera and the minimap. It is built completely before the
//! controller swaps it in, so a failed load never leaves half a level.

use std::rc::Rc;

use glam::Vec2;

use super::camera::CameraClamp;
use super::collision::Aabb;
use super::engine::{BodyId, PhysicsEngine, PlatformDesc, PlatformLimits};
use super::gatherable::{Gatherable, GatherableCollection, GatherableKind};
use super::minimap::{MinimapProjector, Rgba, SceneLayer, colors};
use super::timer::{Clock, Timer};
use crate::map::{LevelError, LevelMap, MapMeta, MapObject, layers};
use crate::settings::Settings;

/// Bodies drawn as one minimap layer
#[derive(Debug, Clone)]
pub struct BodyLayer {
    pub name: String,
    pub color: Rgba,
    pub bodies: Vec<BodyId>,
}

/// One loaded playthrough of a level
#[derive(Debug)]
pub struct LevelInstance {
    pub level: u32,
    pub meta: MapMeta,
    pub engine: PhysicsEngine,
    pub player: BodyId,
    /// Player centre on (re)spawn
    pub spawn: Vec2,
    pub player_half_extents: Vec2,
    pub coins: GatherableCollection,
    pub fruits: GatherableCollection,
    pub hearts: GatherableCollection,
    /// Fruit-gated walls still standing
    pub level_walls: Vec<BodyId>,
    /// Set once the gate has opened
    pub wall_opened: bool,
    pub body_layers: Vec<BodyLayer>,
    pub timer: Timer,
    pub camera: CameraClamp,
    pub minimap: MinimapProjector,
}

/// Spawn point of a grid cell: the cell's centre
pub fn spawn_position(cell: [i32; 2], tile_size: f32) -> Vec2 {
    Vec2::new(
        tile_size * cell[0] as f32 + tile_size / 2.0,
        tile_size * cell[1] as f32 + tile_size / 2.0,
    )
}

fn gatherables(map: &LevelMap, layer: &str, kind: GatherableKind) -> GatherableCollection {
    let members = map
        .layer(layer)
        .iter()
        .enumerate()
        .map(|(i, obj)| Gatherable {
            id: i as u32,
            bounds: obj.bounds(map.scaling),
            name: obj.name.clone(),
        })
        .collect();
    GatherableCollection::new(kind, members)
}

fn boxes(map: &LevelMap, layer: &str) -> Vec<Aabb> {
    map.layer(layer).iter().map(|o| o.bounds(map.scaling)).collect()
}

fn platform(obj: &MapObject, scaling: f32) -> PlatformDesc {
    let scale = |b: Option<f32>| b.map(|v| v * scaling);
    PlatformDesc {
        bounds: obj.bounds(scaling),
        change: Vec2::new(obj.change_x, obj.change_y),
        limits: PlatformLimits {
            left: scale(obj.boundary_left),
            right: scale(obj.boundary_right),
            top: scale(obj.boundary_top),
            bottom: scale(obj.boundary_bottom),
        },
    }
}

/// Build a complete level instance from a loaded map
pub fn build_level(
    map: &LevelMap,
    level: u32,
    settings: &Settings,
    clock: Rc<dyn Clock>,
) -> Result<LevelInstance, LevelError> {
    let meta = map.validate(level)?;
    let mut engine = PhysicsEngine::new(settings.physics.clone());

    let cell = meta.spawn.unwrap_or(settings.player_spawn);
    let spawn = spawn_position(cell, settings.tile_size);
    let half = Vec2::from(settings.player_half_extents);
    let player = engine.register_player(Aabb::from_center(spawn, half));

    let mut body_layers = Vec::new();
    for (name, color) in [
        (layers::PLATFORMS, colors::PLATFORMS),
        (layers::EDGE, colors::EDGE),
    ] {
        let bodies = engine.register_static(&boxes(map, name), None);
        body_layers.push(BodyLayer {
            name: name.to_string(),
            color,
            bodies,
        });
    }

    let level_walls = engine.register_static(&boxes(map, layers::LEVEL_WALL), None);
    body_layers.push(BodyLayer {
        name: layers::LEVEL_WALL.to_string(),
        color: colors::LEVEL_WALL,
        bodies: level_walls.clone(),
    });

    let items = engine.register_dynamic_items(&boxes(map, layers::DYNAMIC_ITEMS));
    body_layers.push(BodyLayer {
        name: layers::DYNAMIC_ITEMS.to_string(),
        color: colors::ITEMS,
        bodies: items,
    });

    let platforms: Vec<PlatformDesc> = map
        .layer(layers::MOVING_SPRITES)
        .iter()
        .map(|o| platform(o, map.scaling))
        .collect();
    let moving = engine.register_kinematic(&platforms);
    body_layers.push(BodyLayer {
        name: layers::MOVING_SPRITES.to_string(),
        color: colors::MOVING,
        bodies: moving,
    });

    let coins = gatherables(map, layers::COINS, GatherableKind::Coin);
    let fruits = gatherables(map, layers::FRUITS, GatherableKind::Fruit);
    let hearts = gatherables(map, layers::HEARTS, GatherableKind::Heart);

    let mut timer = Timer::new(meta.seconds, settings.timer_enabled, clock);
    if timer.is_enabled() {
        timer.start();
    }

    let viewport = Vec2::new(settings.viewport_width, settings.viewport_height);
    let mut camera = CameraClamp::new(meta.pixel_size, viewport);
    camera.update(spawn);
    let minimap = MinimapProjector::new(meta.pixel_size, viewport, &settings.minimap);

    log::info!(
        "Built level {}: {} bodies, {} coins, {} fruit, {} hearts, {} s",
        level,
        engine.body_count(),
        coins.len(),
        fruits.len(),
        hearts.len(),
        meta.seconds
    );

    Ok(LevelInstance {
        level,
        meta,
        engine,
        player,
        spawn,
        player_half_extents: half,
        coins,
        fruits,
        hearts,
        level_walls,
        wall_opened: false,
        body_layers,
        timer,
        camera,
        minimap,
    })
}

impl LevelInstance {
    /// Current player centre.
    ///
    /// # Panics
    ///
    /// If the player body is missing, which only a bug can cause.
    pub fn player_position(&self) -> Vec2 {
        match self.engine.position(self.player) {
            Some(p) => p,
            None => panic!("level {} has no player body", self.level),
        }
    }

    pub fn player_bounds(&self) -> Aabb {
        Aabb::from_center(self.player_position(), self.player_half_extents)
    }

    /// Destroy the player body and create a fresh one at the spawn point
    pub fn respawn_player(&mut self) -> BodyId {
        self.engine.remove_body(self.player);
        self.player = self
            .engine
            .register_player(Aabb::from_center(self.spawn, self.player_half_extents));
        self.player
    }

    /// Open the fruit gate: remove one wall body for good.
    /// Returns false if the gate has already opened or there is none.
    pub fn open_wall(&mut self) -> bool {
        if self.wall_opened {
            return false;
        }
        let Some(wall) = self.level_walls.pop() else {
            return false;
        };
        self.engine.remove_body(wall);
        for layer in &mut self.body_layers {
            layer.bodies.retain(|b| *b != wall);
        }
        self.wall_opened = true;
        true
    }

    /// Current boxes of every drawable layer
    pub fn scene_layers(&self) -> Vec<SceneLayer> {
        let mut scene: Vec<SceneLayer> = self
            .body_layers
            .iter()
            .map(|layer| SceneLayer {
                name: layer.name.clone(),
                color: layer.color,
                rects: layer.bodies.iter().filter_map(|b| self.engine.bounds(*b)).collect(),
            })
            .collect();

        for (name, color, set) in [
            (layers::COINS, colors::COINS, &self.coins),
            (layers::FRUITS, colors::FRUITS, &self.fruits),
            (layers::HEARTS, colors::HEARTS, &self.hearts),
        ] {
            scene.push(SceneLayer {
                name: name.to_string(),
                color,
                rects: set.members().iter().map(|g| g.bounds).collect(),
            });
        }
        scene
    }
}
