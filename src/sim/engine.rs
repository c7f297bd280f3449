//! Rigid-body simulation adapter
//!
//! Owns a rapier2d world and exposes only what the level needs: body
//! registration per category, player movement forces, kinematic platform
//! oscillation and stepping. Rapier types stay inside this module; the
//! rest of the crate talks in glam vectors and [`BodyId`]s.
//!
//! Friction coefficients combine multiplicatively, so a player with zero
//! friction slides freely over any surface.

use std::collections::BTreeMap;

use glam::Vec2;
use rapier2d::prelude::*;

use super::collision::Aabb;
use super::controls::Controls;
use crate::settings::PhysicsTuning;

/// Player friction while no horizontal input is held
pub const FULL_FRICTION: f32 = 1.0;

/// Contact normals steeper than this (y component, pointing at the player)
/// count as standing on something
const GROUND_NORMAL_MIN_Y: f32 = 0.5;

/// What a body is in the level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCategory {
    Player,
    StaticWall,
    KinematicPlatform,
    DynamicItem,
}

impl BodyCategory {
    pub fn collision_tag(&self) -> CollisionTag {
        match self {
            BodyCategory::Player => CollisionTag::Player,
            BodyCategory::StaticWall | BodyCategory::KinematicPlatform => CollisionTag::Wall,
            BodyCategory::DynamicItem => CollisionTag::Item,
        }
    }
}

/// Collision category tag, stored in collider user data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CollisionTag {
    Player = 1,
    Wall = 2,
    Item = 3,
}

impl CollisionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionTag::Player => "player",
            CollisionTag::Wall => "wall",
            CollisionTag::Item => "item",
        }
    }
}

/// Stable handle for a registered body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// Which jump was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Full,
    /// About a seventh of the full impulse
    Soft,
}

/// Oscillation limits of a kinematic platform; `None` means unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlatformLimits {
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

impl PlatformLimits {
    /// Per-frame delta after bouncing off any limit the leading edge has
    /// passed while moving toward it
    pub fn reflect(&self, body: &Aabb, change: Vec2) -> Vec2 {
        let mut change = change;

        if self.right.is_some_and(|r| change.x > 0.0 && body.right() > r)
            || self.left.is_some_and(|l| change.x < 0.0 && body.left() < l)
        {
            change.x = -change.x;
        }

        if self.top.is_some_and(|t| change.y > 0.0 && body.top() > t)
            || self.bottom.is_some_and(|b| change.y < 0.0 && body.bottom() < b)
        {
            change.y = -change.y;
        }

        change
    }
}

/// Kinematic platform registration data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformDesc {
    pub bounds: Aabb,
    /// Displacement per frame
    pub change: Vec2,
    pub limits: PlatformLimits,
}

/// A registered kinematic platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicPlatform {
    pub id: BodyId,
    pub change: Vec2,
    pub limits: PlatformLimits,
}

#[derive(Debug, Clone, Copy)]
struct TrackedBody {
    handle: RigidBodyHandle,
    collider: ColliderHandle,
    category: BodyCategory,
    half_extents: Vec2,
}

/// Physics world for one level instance
pub struct PhysicsEngine {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    tuning: PhysicsTuning,
    bodies: BTreeMap<BodyId, TrackedBody>,
    player: Option<BodyId>,
    platforms: Vec<KinematicPlatform>,
    /// Last frame's controls, for jump edges
    previous_controls: Controls,
    next_id: u32,
}

impl std::fmt::Debug for PhysicsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsEngine")
            .field("bodies", &self.bodies.len())
            .field("player", &self.player)
            .field("platforms", &self.platforms.len())
            .finish()
    }
}

impl PhysicsEngine {
    pub fn new(tuning: PhysicsTuning) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.length_unit = tuning.length_unit;

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, -tuning.gravity],
            integration_params,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            tuning,
            bodies: BTreeMap::new(),
            player: None,
            platforms: Vec::new(),
            previous_controls: Controls::default(),
            next_id: 1,
        }
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    /// Attach the player body.
    ///
    /// # Panics
    ///
    /// If a player body is already registered.
    pub fn register_player(&mut self, bounds: Aabb) -> BodyId {
        assert!(
            self.player.is_none(),
            "a player body is already registered with this engine"
        );
        let half = bounds.half_extents();
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(bounds.center()))
            .lock_rotations()
            .linear_damping(self.tuning.damping)
            .can_sleep(false)
            .build();
        let collider = ColliderBuilder::cuboid(half.x, half.y)
            .friction(self.tuning.player_friction)
            .mass(self.tuning.player_mass);

        let id = self.insert(body, collider, BodyCategory::Player, half);
        self.player = Some(id);
        self.previous_controls = Controls::default();
        id
    }

    /// Attach immovable bodies. Friction defaults to the wall friction.
    pub fn register_static(&mut self, bodies: &[Aabb], friction: Option<f32>) -> Vec<BodyId> {
        let friction = friction.unwrap_or(self.tuning.wall_friction);
        bodies
            .iter()
            .map(|b| {
                let half = b.half_extents();
                let body = RigidBodyBuilder::fixed().translation(to_vector(b.center())).build();
                let collider = ColliderBuilder::cuboid(half.x, half.y).friction(friction);
                self.insert(body, collider, BodyCategory::StaticWall, half)
            })
            .collect()
    }

    /// Attach freely movable items
    pub fn register_dynamic_items(&mut self, bodies: &[Aabb]) -> Vec<BodyId> {
        bodies
            .iter()
            .map(|b| {
                let half = b.half_extents();
                let body = RigidBodyBuilder::dynamic()
                    .translation(to_vector(b.center()))
                    .linear_damping(self.tuning.damping)
                    .build();
                let collider =
                    ColliderBuilder::cuboid(half.x, half.y).friction(self.tuning.dynamic_item_friction);
                self.insert(body, collider, BodyCategory::DynamicItem, half)
            })
            .collect()
    }

    /// Attach velocity-driven platforms
    pub fn register_kinematic(&mut self, platforms: &[PlatformDesc]) -> Vec<BodyId> {
        platforms
            .iter()
            .map(|p| {
                let half = p.bounds.half_extents();
                let body = RigidBodyBuilder::kinematic_velocity_based()
                    .translation(to_vector(p.bounds.center()))
                    .build();
                let collider = ColliderBuilder::cuboid(half.x, half.y).friction(self.tuning.wall_friction);
                let id = self.insert(body, collider, BodyCategory::KinematicPlatform, half);
                self.platforms.push(KinematicPlatform {
                    id,
                    change: p.change,
                    limits: p.limits,
                });
                id
            })
            .collect()
    }

    fn insert(
        &mut self,
        body: RigidBody,
        collider: ColliderBuilder,
        category: BodyCategory,
        half_extents: Vec2,
    ) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;

        let collider = collider
            .friction_combine_rule(CoefficientCombineRule::Multiply)
            .user_data(category.collision_tag() as u128)
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = self
            .collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.bodies.insert(
            id,
            TrackedBody {
                handle,
                collider,
                category,
                half_extents,
            },
        );
        id
    }

    /// Remove a body and its collider. Unknown ids are ignored.
    pub fn remove_body(&mut self, id: BodyId) {
        let Some(tracked) = self.bodies.remove(&id) else {
            return;
        };
        self.rigid_body_set.remove(
            tracked.handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        if self.player == Some(id) {
            self.player = None;
        }
        self.platforms.retain(|p| p.id != id);
    }

    /// Apply this frame's player forces and jump impulses.
    ///
    /// Exactly one of left/right pushes the player (harder on the ground)
    /// and drops its friction to zero; otherwise friction goes back to
    /// [`FULL_FRICTION`] so the player stops. A fresh `up` press while
    /// grounded jumps; a fresh soft-jump press does a reduced jump.
    ///
    /// # Panics
    ///
    /// If no player body is registered.
    pub fn apply_player_movement(&mut self, controls: &Controls) -> Option<Jump> {
        let Some(player) = self.player.and_then(|id| self.bodies.get(&id).copied()) else {
            panic!("apply_player_movement called with no player body registered");
        };

        let grounded = self.is_on_ground();
        let pressed = controls.pressed_since(&self.previous_controls);
        self.previous_controls = *controls;

        let direction = controls.horizontal();
        let move_force = if grounded {
            self.tuning.player_move_force_on_ground
        } else {
            self.tuning.player_move_force_in_air
        };

        let jump = if pressed.up && grounded {
            Some(Jump::Full)
        } else if !controls.up && pressed.soft_jump && grounded {
            Some(Jump::Soft)
        } else {
            None
        };
        let impulse = jump.map(|j| self.jump_impulse(j));

        if let Some(body) = self.rigid_body_set.get_mut(player.handle) {
            // User forces persist across steps
            body.reset_forces(true);
            if direction != 0 {
                body.add_force(vector![move_force * f32::from(direction), 0.0], true);
            }
            if let Some(impulse) = impulse {
                body.apply_impulse(vector![0.0, impulse], true);
            }
        }

        let friction = if direction != 0 { 0.0 } else { FULL_FRICTION };
        if let Some(collider) = self.collider_set.get_mut(player.collider) {
            collider.set_friction(friction);
        }

        if let Some(j) = jump {
            log::debug!("jump {:?} (grounded, impulse {:?})", j, impulse);
        }
        jump
    }

    pub fn jump_impulse(&self, jump: Jump) -> f32 {
        match jump {
            Jump::Full => self.tuning.player_jump_impulse,
            Jump::Soft => (self.tuning.player_jump_impulse / 7.0).floor(),
        }
    }

    /// Player is touching something below it
    pub fn is_on_ground(&self) -> bool {
        let Some(player) = self.player.and_then(|id| self.bodies.get(&id)) else {
            return false;
        };
        let collider = player.collider;
        self.narrow_phase.contact_pairs_with(collider).any(|pair| {
            if !pair.has_any_active_contact {
                return false;
            }
            // Manifold normals point from collider1 to collider2
            let toward_player = if pair.collider1 == collider { -1.0 } else { 1.0 };
            pair.manifolds
                .iter()
                .any(|m| !m.points.is_empty() && m.data.normal.y * toward_player > GROUND_NORMAL_MIN_Y)
        })
    }

    /// Bounce platforms off their limits and turn each per-frame delta into
    /// a velocity for the next step
    pub fn rotate_moving(&mut self, delta_time: f32) {
        if delta_time <= 0.0 {
            return;
        }
        for platform in &mut self.platforms {
            let Some(tracked) = self.bodies.get(&platform.id) else {
                continue;
            };
            let Some(body) = self.rigid_body_set.get_mut(tracked.handle) else {
                continue;
            };
            let bounds = Aabb::from_center(from_vector(body.translation()), tracked.half_extents);
            platform.change = platform.limits.reflect(&bounds, platform.change);
            body.set_linvel(to_vector(platform.change / delta_time), true);
        }
    }

    /// Advance the simulation by one frame
    pub fn step(&mut self, delta_time: f32) {
        self.integration_params.dt = delta_time;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.clamp_player_velocity();
    }

    fn clamp_player_velocity(&mut self) {
        let Some(player) = self.player.and_then(|id| self.bodies.get(&id)) else {
            return;
        };
        let max_h = self.tuning.player_max_horizontal_speed;
        let max_v = self.tuning.player_max_vertical_speed;
        if let Some(body) = self.rigid_body_set.get_mut(player.handle) {
            let v = *body.linvel();
            let clamped = vector![v.x.clamp(-max_h, max_h), v.y.clamp(-max_v, max_v)];
            if clamped != v {
                body.set_linvel(clamped, true);
            }
        }
    }

    pub fn player_id(&self) -> Option<BodyId> {
        self.player
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player.and_then(|id| self.position(id))
    }

    pub fn player_bounds(&self) -> Option<Aabb> {
        self.player.and_then(|id| self.bounds(id))
    }

    pub fn player_velocity(&self) -> Option<Vec2> {
        self.player.and_then(|id| self.velocity(id))
    }

    pub fn position(&self, id: BodyId) -> Option<Vec2> {
        let tracked = self.bodies.get(&id)?;
        self.rigid_body_set
            .get(tracked.handle)
            .map(|b| from_vector(b.translation()))
    }

    pub fn velocity(&self, id: BodyId) -> Option<Vec2> {
        let tracked = self.bodies.get(&id)?;
        self.rigid_body_set.get(tracked.handle).map(|b| from_vector(b.linvel()))
    }

    /// Current box of a body (ignores rotation of dynamic items)
    pub fn bounds(&self, id: BodyId) -> Option<Aabb> {
        let tracked = self.bodies.get(&id)?;
        self.position(id)
            .map(|c| Aabb::from_center(c, tracked.half_extents))
    }

    pub fn category(&self, id: BodyId) -> Option<BodyCategory> {
        self.bodies.get(&id).map(|t| t.category)
    }

    pub fn collision_tag(&self, id: BodyId) -> Option<CollisionTag> {
        let tracked = self.bodies.get(&id)?;
        let collider = self.collider_set.get(tracked.collider)?;
        match collider.user_data {
            1 => Some(CollisionTag::Player),
            2 => Some(CollisionTag::Wall),
            3 => Some(CollisionTag::Item),
            _ => None,
        }
    }

    pub fn friction(&self, id: BodyId) -> Option<f32> {
        let tracked = self.bodies.get(&id)?;
        self.collider_set.get(tracked.collider).map(|c| c.friction())
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn platforms(&self) -> &[KinematicPlatform] {
        &self.platforms
    }

    /// Teleport a body, keeping its velocity
    pub fn set_position(&mut self, id: BodyId, position: Vec2) {
        let Some(tracked) = self.bodies.get(&id) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(tracked.handle) {
            body.set_translation(to_vector(position), true);
        }
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        let Some(tracked) = self.bodies.get(&id) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(tracked.handle) {
            body.set_linvel(to_vector(velocity), true);
        }
    }
}

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}
