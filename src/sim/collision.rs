//! Axis-aligned box geometry
//!
//! Pickups are not physics bodies; touching one is a plain box overlap test
//! against the player's box after the physics step has placed it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world pixels (y up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.max.y
    }

    /// Same box moved so its center sits at `center`
    pub fn with_center(&self, center: Vec2) -> Self {
        Self::from_center(center, self.half_extents())
    }

    /// True when the interiors intersect. Boxes that only share an edge do
    /// not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Overlap region, if any
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_and_touching_edges() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_center(Vec2::new(15.0, 0.0), Vec2::splat(10.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        // Shares only the x = 10 edge
        let c = Aabb::from_center(Vec2::new(20.0, 0.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_intersection_region() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(5.0, -5.0), Vec2::new(20.0, 5.0));
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.min, Vec2::new(5.0, 0.0));
        assert_eq!(i.max, Vec2::new(10.0, 5.0));
        assert!(a.intersection(&Aabb::from_center(Vec2::splat(100.0), Vec2::ONE)).is_none());
    }

    #[test]
    fn test_new_normalizes_corners() {
        let a = Aabb::new(Vec2::new(10.0, 10.0), Vec2::new(0.0, 0.0));
        assert_eq!(a.min, Vec2::ZERO);
        assert_eq!(a.center(), Vec2::splat(5.0));
        assert_eq!(a.half_extents(), Vec2::splat(5.0));
        assert_eq!(a.with_center(Vec2::splat(100.0)).left(), 95.0);
    }
}
