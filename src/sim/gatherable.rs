//! Collectible sets (coins, fruit, hearts)
//!
//! A member present in a collection has not been touched yet. Touching
//! removes it for good and yields the collection's score coefficient.

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::{
    COIN_FRAME_COUNT, COIN_SCORE_COEFFICIENT, COIN_TICKS_PER_FRAME, FRUIT_SCORE_COEFFICIENT,
    HEART_SCORE_COEFFICIENT,
};

/// Kind of collectible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatherableKind {
    Coin,
    Fruit,
    /// Grants a life point instead of score
    Heart,
}

impl GatherableKind {
    pub fn score_coefficient(&self) -> u64 {
        match self {
            GatherableKind::Coin => COIN_SCORE_COEFFICIENT,
            GatherableKind::Fruit => FRUIT_SCORE_COEFFICIENT,
            GatherableKind::Heart => HEART_SCORE_COEFFICIENT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GatherableKind::Coin => "coin",
            GatherableKind::Fruit => "fruit",
            GatherableKind::Heart => "heart",
        }
    }
}

/// A single collectible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gatherable {
    pub id: u32,
    pub bounds: Aabb,
    pub name: Option<String>,
}

/// Outcome of one `resolve_touches` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchResolution {
    pub score_delta: u64,
    /// Live members left after removal
    pub remaining_count: usize,
    pub collected_delta: u32,
}

/// Ordered set of untouched collectibles of one kind
#[derive(Debug, Clone)]
pub struct GatherableCollection {
    kind: GatherableKind,
    score_coefficient: u64,
    members: Vec<Gatherable>,
    /// Updates seen, drives the coin frame cycle
    tick_count: u64,
}

impl GatherableCollection {
    pub fn new(kind: GatherableKind, members: Vec<Gatherable>) -> Self {
        Self::with_coefficient(kind, kind.score_coefficient(), members)
    }

    pub fn with_coefficient(kind: GatherableKind, score_coefficient: u64, members: Vec<Gatherable>) -> Self {
        Self {
            kind,
            score_coefficient,
            members,
            tick_count: 0,
        }
    }

    pub fn kind(&self) -> GatherableKind {
        self.kind
    }

    pub fn score_coefficient(&self) -> u64 {
        self.score_coefficient
    }

    /// Untouched members, in original order
    pub fn members(&self) -> &[Gatherable] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.members.iter().any(|g| g.id == id)
    }

    /// Remove every member overlapping `player`
    pub fn resolve_touches(&mut self, player: &Aabb) -> TouchResolution {
        let touched: Vec<u32> = self
            .members
            .iter()
            .filter(|g| g.bounds.overlaps(player))
            .map(|g| g.id)
            .collect();

        let mut collected_delta = 0;
        for id in touched {
            let item = self.remove(id);
            log::debug!(
                "{} {} ({}) collected",
                self.kind.as_str(),
                item.id,
                item.name.as_deref().unwrap_or("unnamed")
            );
            collected_delta += 1;
        }

        TouchResolution {
            score_delta: u64::from(collected_delta) * self.score_coefficient,
            remaining_count: self.members.len(),
            collected_delta,
        }
    }

    /// Remove a live member by id.
    ///
    /// # Panics
    ///
    /// If `id` is not live: a collected member can never be collected again.
    pub fn remove(&mut self, id: u32) -> Gatherable {
        let Some(index) = self.members.iter().position(|g| g.id == id) else {
            panic!("{} {id} is not live (already collected?)", self.kind.as_str());
        };
        self.members.remove(index)
    }

    /// Advance the animation counter by one update
    pub fn tick_animation(&mut self) -> usize {
        self.tick_count += 1;
        self.frame_index()
    }

    /// Current frame of the 12-frame coin cycle
    pub fn frame_index(&self) -> usize {
        ((self.tick_count / COIN_TICKS_PER_FRAME) % COIN_FRAME_COUNT) as usize
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    fn coins_at(xs: &[f32]) -> GatherableCollection {
        let members = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| Gatherable {
                id: i as u32 + 1,
                bounds: Aabb::from_center(Vec2::new(x, 0.0), Vec2::splat(8.0)),
                name: None,
            })
            .collect();
        GatherableCollection::new(GatherableKind::Coin, members)
    }

    #[test]
    fn test_three_of_five_coins() {
        let mut coins = coins_at(&[0.0, 20.0, 40.0, 500.0, 600.0]);
        let player = Aabb::new(Vec2::new(-10.0, -10.0), Vec2::new(45.0, 10.0));
        let r = coins.resolve_touches(&player);
        assert_eq!(r.score_delta, 150);
        assert_eq!(r.collected_delta, 3);
        assert_eq!(r.remaining_count, 2);
    }

    #[test]
    fn test_touch_is_idempotent() {
        let mut fruit = GatherableCollection::new(
            GatherableKind::Fruit,
            vec![Gatherable {
                id: 7,
                bounds: Aabb::from_center(Vec2::ZERO, Vec2::splat(4.0)),
                name: Some("melon".into()),
            }],
        );
        let player = Aabb::from_center(Vec2::ZERO, Vec2::splat(10.0));
        let first = fruit.resolve_touches(&player);
        assert_eq!(first.score_delta, 100);
        let second = fruit.resolve_touches(&player);
        assert_eq!(second, TouchResolution::default());
        assert!(!fruit.contains(7));
    }

    #[test]
    fn test_hearts_score_nothing() {
        let mut hearts = GatherableCollection::new(
            GatherableKind::Heart,
            vec![Gatherable {
                id: 1,
                bounds: Aabb::from_center(Vec2::ZERO, Vec2::splat(4.0)),
                name: None,
            }],
        );
        let r = hearts.resolve_touches(&Aabb::from_center(Vec2::ZERO, Vec2::ONE));
        assert_eq!(r.score_delta, 0);
        assert_eq!(r.collected_delta, 1);
    }

    #[test]
    #[should_panic(expected = "not live")]
    fn test_double_remove_panics() {
        let mut coins = coins_at(&[0.0]);
        coins.remove(1);
        coins.remove(1);
    }

    #[test]
    fn test_coin_frame_cycle() {
        let mut coins = coins_at(&[0.0]);
        assert_eq!(coins.frame_index(), 0);
        for _ in 0..19 {
            coins.tick_animation();
        }
        assert_eq!(coins.frame_index(), 0);
        assert_eq!(coins.tick_animation(), 1);
        for _ in 0..(20 * 11) {
            coins.tick_animation();
        }
        // 240 ticks: wrapped back to the first frame
        assert_eq!(coins.tick_count(), 240);
        assert_eq!(coins.frame_index(), 0);
    }

    proptest! {
        #[test]
        fn prop_collected_members_never_return(
            xs in prop::collection::vec(-500.0f32..500.0, 0..30),
            probes in prop::collection::vec(-500.0f32..500.0, 1..10),
        ) {
            let total = xs.len();
            let mut coins = coins_at(&xs);
            let mut collected = 0usize;
            let mut score = 0u64;
            for px in probes {
                let before: Vec<u32> = coins.members().iter().map(|g| g.id).collect();
                let r = coins.resolve_touches(&Aabb::from_center(Vec2::new(px, 0.0), Vec2::splat(30.0)));
                collected += r.collected_delta as usize;
                score += r.score_delta;
                prop_assert_eq!(r.remaining_count, coins.len());
                // Survivors are a subset of the previous live set
                for g in coins.members() {
                    prop_assert!(before.contains(&g.id));
                }
            }
            prop_assert_eq!(collected + coins.len(), total);
            prop_assert_eq!(score, collected as u64 * 50);
        }
    }
}
