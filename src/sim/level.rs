//! Level controller
//!
//! Runs one play session's levels frame by frame. Each `update` evaluates,
//! in order: falling out of the map, timer expiry, reaching the end of the
//! map, collectibles, the fruit gate, then physics, camera and minimap.
//! Positions read by the checks are those left by the previous frame's
//! physics step.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::animation::PlayerAnimation;
use super::controls::Controls;
use super::loader::{LevelInstance, build_level};
use super::minimap::{SceneLayer, Surface};
use super::state::{GameOverReason, HudSnapshot, LevelEvent, LevelPhase, LevelState};
use super::timer::{Clock, TimerState};
use crate::audio::{AudioManager, SoundEffect};
use crate::map::{LevelError, LevelSource};
use crate::settings::Settings;

/// Shared handle to the audio manager
pub type SharedAudio = Rc<RefCell<AudioManager>>;

/// Level state machine for one play session
pub struct LevelController {
    settings: Settings,
    source: Rc<dyn LevelSource>,
    clock: Rc<dyn Clock>,
    audio: SharedAudio,
    state: LevelState,
    instance: LevelInstance,
    previous_controls: Controls,
    minimap_visible: bool,
    animation: PlayerAnimation,
}

impl std::fmt::Debug for LevelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelController")
            .field("state", &self.state)
            .field("minimap_visible", &self.minimap_visible)
            .finish()
    }
}

impl LevelController {
    /// Start a session at the configured base level
    pub fn new(
        settings: Settings,
        source: Rc<dyn LevelSource>,
        clock: Rc<dyn Clock>,
        audio: SharedAudio,
    ) -> Result<Self, LevelError> {
        let level = settings.base_level;
        let map = source.load(level)?;
        let instance = build_level(&map, level, &settings, clock.clone())?;
        let state = LevelState::new(level, settings.base_life_points, settings.max_life_points);

        let mut controller = Self {
            settings,
            source,
            clock,
            audio,
            state,
            instance,
            previous_controls: Controls::default(),
            minimap_visible: false,
            animation: PlayerAnimation::new(),
        };
        controller.enter_level();
        Ok(controller)
    }

    /// Load `level`, keeping score and life points. The current level stays
    /// in place if the load fails.
    pub fn load_level(&mut self, level: u32) -> Result<(), LevelError> {
        let map = self.source.load(level)?;
        let instance = build_level(&map, level, &self.settings, self.clock.clone())?;
        self.state.phase = LevelPhase::Loading;
        self.instance = instance;
        self.state.level = level;
        self.enter_level();
        Ok(())
    }

    fn enter_level(&mut self) {
        let meta = &self.instance.meta;
        self.state.map_width = meta.pixel_size.x;
        self.state.map_height = meta.pixel_size.y;
        self.state.end_of_map = meta.pixel_size.x;
        self.state.coins_collected = 0;
        self.state.coins_total = self.instance.coins.len() as u32;
        self.state.fruit_collected = 0;
        self.state.fruit_total = self.instance.fruits.len() as u32;
        self.state.phase = LevelPhase::Playing;
        self.animation = PlayerAnimation::new();
        self.audio.borrow_mut().play_music();
        log::info!(
            "Level {} loaded: map {} x {}, end_of_map {}",
            self.state.level,
            self.state.map_width,
            self.state.map_height,
            self.state.end_of_map
        );
    }

    /// Advance one frame. After game over this does nothing.
    pub fn update(&mut self, controls: &Controls, delta_time: f32) -> Result<Vec<LevelEvent>, LevelError> {
        let mut events = Vec::new();
        if self.state.is_over() {
            return Ok(events);
        }

        let pressed = controls.pressed_since(&self.previous_controls);
        self.previous_controls = *controls;
        if pressed.map_toggle {
            self.toggle_minimap();
        }

        let timer = &mut self.instance.timer;
        if timer.is_enabled() && timer.state() == TimerState::Stopped {
            timer.start();
        }

        // Fell out of the map
        let player = self.instance.player_position();
        if player.y < self.settings.fall_threshold {
            if !self.state.lose_life() {
                events.push(self.game_over(GameOverReason::FellOut));
                return Ok(events);
            }
            self.state.phase = LevelPhase::Respawning;
            self.instance.respawn_player();
            self.animation = PlayerAnimation::new();
            self.state.phase = LevelPhase::Playing;
            log::info!("Respawned, {} life points left", self.state.life_points);
            events.push(LevelEvent::Respawned {
                life_points: self.state.life_points,
            });
        }

        if self.instance.timer.is_expired() {
            events.push(self.game_over(GameOverReason::TimeUp));
            return Ok(events);
        }

        let player = self.instance.player_position();
        if player.x >= self.state.end_of_map {
            let completed = self.state.level;
            self.state.phase = LevelPhase::LevelComplete;
            log::info!("Level {completed} complete, score {}", self.state.score);
            self.load_level(completed + 1)?;
            events.push(LevelEvent::LevelComplete {
                completed,
                next_level: completed + 1,
            });
            return Ok(events);
        }

        if let Some(collected) = self.resolve_collectibles() {
            events.push(collected);
        }

        if !self.instance.wall_opened
            && !self.instance.level_walls.is_empty()
            && self.state.fruit_collected >= self.state.fruit_total
            && self.instance.open_wall()
        {
            log::info!("All fruit collected, level wall removed");
            events.push(LevelEvent::WallRemoved);
        }

        let before = self.instance.player_position();
        let engine = &mut self.instance.engine;
        if engine.apply_player_movement(controls).is_some() {
            self.audio.borrow_mut().play(SoundEffect::Jump);
            events.push(LevelEvent::Jumped);
        }
        engine.step(delta_time);
        engine.rotate_moving(delta_time);
        let grounded = engine.is_on_ground();

        let player = self.instance.player_position();
        self.animation
            .update(player - before, grounded, controls.left || controls.right);
        self.instance.camera.update(player);
        if self.minimap_visible {
            let layers = self.instance.scene_layers();
            self.instance.minimap.render(player, &layers);
        }

        Ok(events)
    }

    fn resolve_collectibles(&mut self) -> Option<LevelEvent> {
        let bounds = self.instance.player_bounds();

        let coins = self.instance.coins.resolve_touches(&bounds);
        self.state.score += coins.score_delta;
        self.state.coins_collected += coins.collected_delta;

        let fruits = self.instance.fruits.resolve_touches(&bounds);
        self.state.score += fruits.score_delta;
        self.state.fruit_collected += fruits.collected_delta;

        let hearts = self.instance.hearts.resolve_touches(&bounds);
        self.state.score += hearts.score_delta;
        if hearts.collected_delta > 0 {
            let gained = self.state.gain_lives(hearts.collected_delta);
            log::debug!("{} heart(s), gained {gained} life points", hearts.collected_delta);
        }

        self.instance.coins.tick_animation();

        if coins.collected_delta + fruits.collected_delta + hearts.collected_delta == 0 {
            return None;
        }
        Some(LevelEvent::Collected {
            coins: coins.collected_delta,
            fruits: fruits.collected_delta,
            hearts: hearts.collected_delta,
        })
    }

    fn game_over(&mut self, reason: GameOverReason) -> LevelEvent {
        self.state.phase = LevelPhase::GameOver;
        self.instance.timer.pause();
        self.audio.borrow_mut().stop_music();
        log::info!("Game over ({reason:?}), final score {}", self.state.score);
        LevelEvent::GameOver {
            final_score: self.state.score,
            reason,
        }
    }

    /// Menu opened: freeze the clock and the music
    pub fn pause(&mut self) {
        self.instance.timer.pause();
        self.audio.borrow_mut().stop_music();
    }

    /// Back from the menu
    pub fn resume(&mut self) {
        if self.state.is_over() {
            return;
        }
        if self.instance.timer.is_enabled() {
            self.instance.timer.start();
        }
        self.audio.borrow_mut().play_music();
    }

    pub fn toggle_minimap(&mut self) -> bool {
        self.minimap_visible = !self.minimap_visible;
        log::debug!("minimap visible: {}", self.minimap_visible);
        self.minimap_visible
    }

    pub fn minimap_visible(&self) -> bool {
        self.minimap_visible
    }

    /// The minimap surface, when shown
    pub fn minimap(&self) -> Option<&Surface> {
        self.minimap_visible.then(|| self.instance.minimap.surface())
    }

    pub fn minimap_screen_position(&self) -> Vec2 {
        self.instance.minimap.screen_position()
    }

    pub fn set_timer_enabled(&mut self, enabled: bool) {
        self.settings.timer_enabled = enabled;
        self.instance.timer.set_enabled(enabled);
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn instance(&self) -> &LevelInstance {
        &self.instance
    }

    pub fn camera_position(&self) -> Vec2 {
        self.instance.camera.position()
    }

    pub fn player_position(&self) -> Vec2 {
        self.instance.player_position()
    }

    /// Facing and frame for the player sprite
    pub fn player_animation(&self) -> &PlayerAnimation {
        &self.animation
    }

    pub fn coin_frame(&self) -> usize {
        self.instance.coins.frame_index()
    }

    pub fn scene_layers(&self) -> Vec<SceneLayer> {
        self.instance.scene_layers()
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::new(
            &self.state,
            self.instance.timer.remaining_text(),
            self.instance.meta.text_color,
            self.minimap_visible,
        )
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_over()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCall, RecordingBackend};
    use crate::consts::SIM_DT;
    use crate::map::{LevelMap, MapObject, MemoryLevelSource, layers};
    use crate::sim::timer::ManualClock;

    fn floor_map() -> LevelMap {
        LevelMap::new(40, 10, 64)
            .with_seconds(30)
            .with_layer(layers::PLATFORMS, vec![MapObject::new(1280.0, 16.0, 2560.0, 32.0)])
    }

    struct Harness {
        controller: LevelController,
        clock: ManualClock,
        audio: RecordingBackend,
    }

    fn harness(settings: Settings, source: MemoryLevelSource) -> Harness {
        let clock = ManualClock::new();
        let audio = RecordingBackend::new();
        let manager = AudioManager::new(Box::new(audio.clone()), 0.2, 1.0);
        let controller = LevelController::new(
            settings,
            Rc::new(source),
            Rc::new(clock.clone()),
            Rc::new(RefCell::new(manager)),
        )
        .unwrap();
        Harness {
            controller,
            clock,
            audio,
        }
    }

    fn two_levels() -> MemoryLevelSource {
        MemoryLevelSource::new()
            .with_level(1, floor_map())
            .with_level(2, floor_map().with_seconds(45))
    }

    fn idle(h: &mut Harness, frames: usize) -> Vec<LevelEvent> {
        let mut events = Vec::new();
        for _ in 0..frames {
            events.extend(h.controller.update(&Controls::default(), SIM_DT).unwrap());
        }
        events
    }

    fn drop_player(h: &mut Harness) {
        let player = h.controller.instance.player;
        h.controller
            .instance
            .engine
            .set_position(player, Vec2::new(300.0, -100.0));
    }

    #[test]
    fn test_missing_base_level_is_error() {
        let clock = ManualClock::new();
        let err = LevelController::new(
            Settings::default(),
            Rc::new(MemoryLevelSource::new()),
            Rc::new(clock),
            Rc::new(RefCell::new(AudioManager::default())),
        )
        .unwrap_err();
        assert!(matches!(err, LevelError::NotFound { level: 1 }));
    }

    #[test]
    fn test_load_starts_music_once() {
        let mut h = harness(Settings::default(), two_levels());
        assert_eq!(h.controller.state().phase, LevelPhase::Playing);
        h.controller.load_level(2).unwrap();
        assert_eq!(h.audio.count(|c| matches!(c, AudioCall::StartMusic(_))), 1);
        assert_eq!(h.controller.state().level, 2);
    }

    #[test]
    fn test_fall_respawns_and_costs_a_life() {
        let mut h = harness(Settings::default(), two_levels());
        let old_player = h.controller.instance.player;
        drop_player(&mut h);

        let events = h.controller.update(&Controls::default(), SIM_DT).unwrap();
        assert_eq!(events, vec![LevelEvent::Respawned { life_points: 2 }]);
        assert_eq!(h.controller.state().life_points, 2);
        assert_eq!(h.controller.state().phase, LevelPhase::Playing);
        assert_ne!(h.controller.instance.player, old_player);
    }

    #[test]
    fn test_fall_with_no_lives_is_game_over() {
        let mut settings = Settings::default();
        settings.base_life_points = 0;
        let mut h = harness(settings, two_levels());
        h.controller.state.score = 400;
        drop_player(&mut h);

        let events = h.controller.update(&Controls::default(), SIM_DT).unwrap();
        assert_eq!(
            events,
            vec![LevelEvent::GameOver {
                final_score: 400,
                reason: GameOverReason::FellOut
            }]
        );
        assert!(h.controller.is_game_over());
        assert!(!h.audio.calls().is_empty());
        assert_eq!(h.audio.calls().last(), Some(&AudioCall::StopMusic));

        // Nothing moves after game over
        let before = h.controller.state().clone();
        assert!(idle(&mut h, 5).is_empty());
        assert_eq!(h.controller.state(), &before);
    }

    #[test]
    fn test_timer_expiry_is_game_over_regardless_of_lives() {
        let mut h = harness(Settings::default(), two_levels());
        idle(&mut h, 1);
        h.clock.advance_secs(31.0);

        let events = h.controller.update(&Controls::default(), SIM_DT).unwrap();
        assert_eq!(
            events,
            vec![LevelEvent::GameOver {
                final_score: 0,
                reason: GameOverReason::TimeUp
            }]
        );
        assert_eq!(h.controller.state().life_points, 3);
    }

    #[test]
    fn test_disabled_timer_never_expires() {
        let mut settings = Settings::default();
        settings.timer_enabled = false;
        let mut h = harness(settings, two_levels());
        h.clock.advance_secs(1000.0);
        assert!(idle(&mut h, 3).is_empty());
        assert_eq!(h.controller.hud().timer_text, "--:--");
    }

    #[test]
    fn test_reaching_map_end_advances_level_once() {
        let mut h = harness(Settings::default(), two_levels());
        h.controller.state.score = 250;
        let end = h.controller.state().end_of_map;
        let player = h.controller.instance.player;
        h.controller
            .instance
            .engine
            .set_position(player, Vec2::new(end - 1.0, 300.0));
        h.controller
            .instance
            .engine
            .set_velocity(player, Vec2::new(180.0, 0.0));

        let right = Controls {
            right: true,
            ..Default::default()
        };
        let mut completions = Vec::new();
        for _ in 0..3 {
            for event in h.controller.update(&right, SIM_DT).unwrap() {
                if let LevelEvent::LevelComplete { .. } = event {
                    completions.push(event);
                }
            }
        }

        assert_eq!(
            completions,
            vec![LevelEvent::LevelComplete {
                completed: 1,
                next_level: 2
            }]
        );
        let state = h.controller.state();
        assert_eq!(state.level, 2);
        assert_eq!(state.score, 250);
        assert_eq!(state.life_points, 3);
        assert!(h.controller.player_position().x < 1000.0);
    }

    #[test]
    fn test_missing_next_level_propagates() {
        let mut h = harness(Settings::default(), MemoryLevelSource::new().with_level(1, floor_map()));
        let end = h.controller.state().end_of_map;
        let player = h.controller.instance.player;
        h.controller
            .instance
            .engine
            .set_position(player, Vec2::new(end + 5.0, 300.0));

        let err = h.controller.update(&Controls::default(), SIM_DT).unwrap_err();
        assert!(matches!(err, LevelError::NotFound { level: 2 }));
        assert_eq!(h.controller.state().level, 1);
    }

    #[test]
    fn test_collecting_three_of_five_coins() {
        // Spawn cell [2, 3] -> player centred at (160, 224)
        let coins = vec![
            MapObject::new(150.0, 220.0, 32.0, 32.0),
            MapObject::new(170.0, 230.0, 32.0, 32.0),
            MapObject::new(160.0, 200.0, 16.0, 16.0),
            MapObject::new(900.0, 200.0, 32.0, 32.0),
            MapObject::new(1200.0, 200.0, 32.0, 32.0),
        ];
        let source = MemoryLevelSource::new().with_level(1, floor_map().with_layer(layers::COINS, coins));
        let mut h = harness(Settings::default(), source);

        let events = h.controller.update(&Controls::default(), SIM_DT).unwrap();
        assert_eq!(
            events,
            vec![LevelEvent::Collected {
                coins: 3,
                fruits: 0,
                hearts: 0
            }]
        );
        let state = h.controller.state();
        assert_eq!(state.score, 150);
        assert_eq!(state.coins_collected, 3);
        assert_eq!(h.controller.instance().coins.len(), 2);
        assert_eq!(h.controller.hud().coins_text, "3/5");

        // Collected coins never count again
        idle(&mut h, 2);
        assert_eq!(h.controller.state().score, 150);
    }

    #[test]
    fn test_hearts_capped_at_max_life_points() {
        let hearts = vec![
            MapObject::new(160.0, 224.0, 16.0, 16.0),
            MapObject::new(165.0, 224.0, 16.0, 16.0),
        ];
        let source = MemoryLevelSource::new().with_level(1, floor_map().with_layer(layers::HEARTS, hearts));
        let mut settings = Settings::default();
        settings.base_life_points = 6;
        let mut h = harness(settings, source);

        idle(&mut h, 1);
        assert_eq!(h.controller.state().life_points, 7);
        assert_eq!(h.controller.state().score, 0);
    }

    #[test]
    fn test_wall_removed_once_after_all_fruit() {
        let map = floor_map()
            .with_layer(layers::FRUITS, vec![MapObject::new(160.0, 224.0, 16.0, 16.0)])
            .with_layer(
                layers::LEVEL_WALL,
                vec![
                    MapObject::new(1500.0, 200.0, 32.0, 300.0),
                    MapObject::new(1600.0, 200.0, 32.0, 300.0),
                ],
            );
        let mut h = harness(Settings::default(), MemoryLevelSource::new().with_level(1, map));
        let bodies = h.controller.instance().engine.body_count();

        let events = idle(&mut h, 10);
        let removed = events.iter().filter(|e| **e == LevelEvent::WallRemoved).count();
        assert_eq!(removed, 1);
        assert_eq!(h.controller.instance().engine.body_count(), bodies - 1);
        assert_eq!(h.controller.state().score, 100);
    }

    #[test]
    fn test_jump_plays_sound() {
        let mut h = harness(Settings::default(), two_levels());
        // Land on the floor
        idle(&mut h, 90);
        assert!(h.controller.instance().engine.is_on_ground());

        let up = Controls {
            up: true,
            ..Default::default()
        };
        let events = h.controller.update(&up, SIM_DT).unwrap();
        assert!(events.contains(&LevelEvent::Jumped));
        assert_eq!(
            h.audio.count(|c| matches!(c, AudioCall::Effect(SoundEffect::Jump, _))),
            1
        );
    }

    #[test]
    fn test_player_animation_follows_movement() {
        use crate::sim::animation::{Facing, Pose};

        let mut h = harness(Settings::default(), two_levels());
        idle(&mut h, 90);
        assert!(matches!(h.controller.player_animation().pose(), Pose::Idle(_)));
        assert_eq!(h.controller.player_animation().facing(), Facing::Right);

        let left = Controls {
            left: true,
            ..Default::default()
        };
        for _ in 0..30 {
            h.controller.update(&left, SIM_DT).unwrap();
        }
        assert_eq!(h.controller.player_animation().facing(), Facing::Left);
        assert!(matches!(h.controller.player_animation().pose(), Pose::Walk(_)));

        let up = Controls {
            up: true,
            ..Default::default()
        };
        for _ in 0..5 {
            h.controller.update(&up, SIM_DT).unwrap();
        }
        assert_eq!(h.controller.player_animation().pose(), Pose::Jump);

        // Respawn starts from a fresh state
        drop_player(&mut h);
        h.controller.update(&Controls::default(), SIM_DT).unwrap();
        assert_eq!(h.controller.player_animation().facing(), Facing::Right);
    }

    #[test]
    fn test_map_toggle_edge_and_minimap_render() {
        let mut h = harness(Settings::default(), two_levels());
        let toggle = Controls {
            map_toggle: true,
            ..Default::default()
        };
        h.controller.update(&toggle, SIM_DT).unwrap();
        h.controller.update(&toggle, SIM_DT).unwrap();
        assert!(h.controller.minimap_visible());

        let surface = h.controller.minimap().unwrap();
        assert!(surface.pixels().contains(&crate::sim::minimap::colors::MARKER));

        h.controller.update(&Controls::default(), SIM_DT).unwrap();
        h.controller.update(&toggle, SIM_DT).unwrap();
        assert!(h.controller.minimap().is_none());
    }

    #[test]
    fn test_camera_follows_clamped_player() {
        let mut h = harness(Settings::default(), two_levels());
        idle(&mut h, 1);
        // Spawn is left of the first half viewport
        assert_eq!(h.controller.camera_position().x, 640.0);
    }

    #[test]
    fn test_pause_and_resume_keep_remaining_time() {
        let mut h = harness(Settings::default(), two_levels());
        h.clock.advance_secs(10.0);
        h.controller.pause();
        h.clock.advance_secs(100.0);
        h.controller.resume();
        assert_eq!(h.controller.hud().timer_text, "00:20");
        assert_eq!(h.audio.count(|c| matches!(c, AudioCall::StartMusic(_))), 2);
    }
}
