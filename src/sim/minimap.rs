//! Minimap projection into an off-screen surface
//!
//! The whole map (not the viewport) is projected orthographically onto a
//! small RGBA surface. Layers are drawn in the configured order, then a
//! marker at the player. The rendering collaborator uploads the bytes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::settings::MinimapSettings;

/// 8-bit RGBA pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_array(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// Default layer colours
pub mod colors {
    use super::Rgba;

    pub const PLATFORMS: Rgba = Rgba::new(90, 70, 50, 255);
    pub const EDGE: Rgba = Rgba::new(60, 60, 60, 255);
    pub const LEVEL_WALL: Rgba = Rgba::new(150, 40, 40, 255);
    pub const MOVING: Rgba = Rgba::new(40, 110, 160, 255);
    pub const ITEMS: Rgba = Rgba::new(140, 140, 140, 255);
    pub const COINS: Rgba = Rgba::new(255, 215, 0, 255);
    pub const FRUITS: Rgba = Rgba::new(60, 200, 60, 255);
    pub const HEARTS: Rgba = Rgba::new(230, 30, 60, 255);
    pub const MARKER: Rgba = Rgba::new(255, 0, 255, 255);
    pub const OTHER: Rgba = Rgba::new(200, 200, 200, 255);
}

/// A named set of boxes to draw
#[derive(Debug, Clone)]
pub struct SceneLayer {
    pub name: String,
    pub color: Rgba,
    pub rects: Vec<Aabb>,
}

/// Row-major RGBA surface, row 0 at the top
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::default(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw bytes for texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Fill the pixel rectangle covering `[min, max]`, clipped to the
    /// surface. Anything that lands on the surface covers at least one pixel.
    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, color: Rgba) {
        if max.x < 0.0 || max.y < 0.0 || min.x >= self.width as f32 || min.y >= self.height as f32 {
            return;
        }
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil() as u32).clamp(x0 + 1, self.width);
        let y1 = (max.y.ceil() as u32).clamp(y0 + 1, self.height);
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            self.pixels[row + x0 as usize..row + x1 as usize].fill(color);
        }
    }
}

/// Surface size for a map: a fraction of the viewport wide, map aspect tall
pub fn minimap_size(map_size: Vec2, viewport_width: f32, width_fraction: f32) -> UVec2 {
    let width = ((viewport_width * width_fraction) as u32).max(1);
    let aspect = map_size.x / map_size.y.max(1.0);
    let height = ((width as f32 / aspect.max(f32::EPSILON)) as u32).max(1);
    UVec2::new(width, height)
}

/// Renders the minimap for one level instance
#[derive(Debug, Clone)]
pub struct MinimapProjector {
    map_size: Vec2,
    projection: Mat4,
    surface: Surface,
    screen_position: Vec2,
    background: Rgba,
    layer_names: Vec<String>,
    marker_half: f32,
    marker_offset: Vec2,
}

impl MinimapProjector {
    pub fn new(map_size: Vec2, viewport: Vec2, settings: &MinimapSettings) -> Self {
        let map_size = map_size.max(Vec2::ONE);
        let size = minimap_size(map_size, viewport.x, settings.width_fraction);
        let screen_position = Vec2::new(
            if settings.anchor_right {
                viewport.x - size.x as f32 / 2.0
            } else {
                (size.x / 2) as f32
            },
            if settings.anchor_top {
                viewport.y * 7.0 / 8.0 - size.y as f32 / 2.0
            } else {
                (size.y / 2) as f32
            },
        );
        log::info!("minimap size {} x {}", size.x, size.y);

        Self {
            map_size,
            projection: Mat4::orthographic_rh(0.0, map_size.x, 0.0, map_size.y, -1.0, 1.0),
            surface: Surface::new(size.x, size.y),
            screen_position,
            background: Rgba::from_array(settings.background),
            layer_names: settings.layers.clone(),
            marker_half: settings.marker_size / 2.0,
            marker_offset: Vec2::new(0.0, settings.marker_offset_y),
        }
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.surface.width(), self.surface.height())
    }

    pub fn map_size(&self) -> Vec2 {
        self.map_size
    }

    /// Centre of the minimap on screen
    pub fn screen_position(&self) -> Vec2 {
        self.screen_position
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Layers drawn, in order
    pub fn layer_names(&self) -> &[String] {
        &self.layer_names
    }

    /// World point to surface pixel (row 0 at the top)
    pub fn world_to_pixel(&self, p: Vec2) -> Vec2 {
        project(&self.projection, &self.surface, p)
    }

    /// Redraw the configured layers and the player marker
    pub fn render(&mut self, player: Vec2, layers: &[SceneLayer]) -> &Surface {
        let Self {
            projection,
            surface,
            background,
            layer_names,
            marker_half,
            marker_offset,
            ..
        } = self;
        surface.clear(*background);

        for name in layer_names.iter() {
            let Some(layer) = layers.iter().find(|l| &l.name == name) else {
                continue;
            };
            for rect in &layer.rects {
                fill_world_rect(surface, projection, rect, layer.color);
            }
        }

        let marker = Aabb::from_center(player + *marker_offset, Vec2::splat(*marker_half));
        fill_world_rect(surface, projection, &marker, colors::MARKER);

        &self.surface
    }
}

/// World point to surface pixel through `projection` (row 0 at the top)
fn project(projection: &Mat4, surface: &Surface, p: Vec2) -> Vec2 {
    let ndc = projection.project_point3(p.extend(0.0));
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * surface.width() as f32,
        (1.0 - ndc.y) * 0.5 * surface.height() as f32,
    )
}

fn fill_world_rect(surface: &mut Surface, projection: &Mat4, rect: &Aabb, color: Rgba) {
    // y flips: world top maps to the smaller pixel row
    let a = project(projection, surface, Vec2::new(rect.min.x, rect.max.y));
    let b = project(projection, surface, Vec2::new(rect.max.x, rect.min.y));
    surface.fill_rect(a, b, color);
}
