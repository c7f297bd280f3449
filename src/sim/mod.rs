//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module renders, reads
//! devices or plays sound directly:
//! - Time comes from an injected clock
//! - Input arrives as abstract control flags
//! - Sound goes through the audio manager

pub mod animation;
pub mod camera;
pub mod collision;
pub mod controls;
pub mod engine;
pub mod gatherable;
pub mod level;
pub mod loader;
pub mod minimap;
pub mod state;
pub mod timer;

pub use animation::{Facing, PlayerAnimation, Pose};
pub use camera::{CameraBounds, CameraClamp};
pub use collision::Aabb;
pub use controls::Controls;
pub use engine::{BodyCategory, BodyId, CollisionTag, Jump, PhysicsEngine, PlatformDesc, PlatformLimits};
pub use gatherable::{Gatherable, GatherableCollection, GatherableKind, TouchResolution};
pub use level::{LevelController, SharedAudio};
pub use loader::{LevelInstance, build_level};
pub use minimap::{MinimapProjector, Rgba, SceneLayer, Surface};
pub use state::{GameOverReason, HudSnapshot, LevelEvent, LevelPhase, LevelState};
pub use timer::{Clock, ManualClock, MonotonicClock, Timer, TimerState};
