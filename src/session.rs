//! Play session: menu, gameplay and game-over views
//!
//! UI actions arrive as [`SessionCommand`] values and are applied
//! synchronously. The session owns the level controller while a game is in
//! progress and keeps user-facing settings (timer, volumes) across games.

use std::cell::RefCell;
use std::rc::Rc;

use crate::audio::AudioManager;
use crate::map::{LevelError, LevelSource};
use crate::settings::Settings;
use crate::sim::controls::Controls;
use crate::sim::level::{LevelController, SharedAudio};
use crate::sim::state::LevelEvent;
use crate::sim::timer::Clock;

/// Discrete UI action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Start over at the base level
    NewGame,
    /// Pause gameplay and show the menu
    OpenMenu,
    /// Resume the paused game
    Continue,
    ToggleMinimap,
    SetTimerEnabled(bool),
    SetMusicVolume(f32),
    SetEffectsVolume(f32),
    /// Leave the game-over screen
    ReturnToMenu,
}

/// What the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    Menu { continue_enabled: bool },
    Playing,
    GameOver { final_score: u64 },
}

pub struct Session {
    settings: Settings,
    source: Rc<dyn LevelSource>,
    clock: Rc<dyn Clock>,
    audio: SharedAudio,
    controller: Option<LevelController>,
    view: SessionView,
    menu_held: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("view", &self.view)
            .field("controller", &self.controller)
            .finish()
    }
}

impl Session {
    pub fn new(settings: Settings, source: Rc<dyn LevelSource>, clock: Rc<dyn Clock>, audio: AudioManager) -> Self {
        Self {
            settings,
            source,
            clock,
            audio: Rc::new(RefCell::new(audio)),
            controller: None,
            view: SessionView::Menu {
                continue_enabled: false,
            },
            menu_held: false,
        }
    }

    pub fn view(&self) -> SessionView {
        self.view
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn controller(&self) -> Option<&LevelController> {
        self.controller.as_ref()
    }

    pub fn audio(&self) -> &SharedAudio {
        &self.audio
    }

    /// Apply a UI command. Commands that make no sense in the current view
    /// are ignored.
    pub fn dispatch(&mut self, command: SessionCommand) -> Result<(), LevelError> {
        log::debug!("session command {command:?} in {:?}", self.view);
        match command {
            SessionCommand::NewGame => {
                // The running game stays untouched if the base level fails to load
                let controller = LevelController::new(
                    self.settings.clone(),
                    self.source.clone(),
                    self.clock.clone(),
                    self.audio.clone(),
                )?;
                // Dropping the old controller drops its timer; music carries over
                self.controller = Some(controller);
                self.view = SessionView::Playing;
                log::info!("New game at level {}", self.settings.base_level);
            }
            SessionCommand::OpenMenu => {
                if self.view != SessionView::Playing {
                    log::warn!("OpenMenu ignored in {:?}", self.view);
                    return Ok(());
                }
                if let Some(controller) = self.controller.as_mut() {
                    controller.pause();
                }
                self.view = SessionView::Menu {
                    continue_enabled: true,
                };
            }
            SessionCommand::Continue => match (self.view, self.controller.as_mut()) {
                (
                    SessionView::Menu {
                        continue_enabled: true,
                    },
                    Some(controller),
                ) => {
                    controller.resume();
                    self.view = SessionView::Playing;
                }
                _ => log::warn!("Continue ignored: no paused game"),
            },
            SessionCommand::ToggleMinimap => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.toggle_minimap();
                }
            }
            SessionCommand::SetTimerEnabled(enabled) => {
                self.settings.timer_enabled = enabled;
                if let Some(controller) = self.controller.as_mut() {
                    controller.set_timer_enabled(enabled);
                }
            }
            SessionCommand::SetMusicVolume(volume) => {
                self.settings.set_music_volume(volume);
                self.audio.borrow_mut().set_music_volume(volume);
            }
            SessionCommand::SetEffectsVolume(volume) => {
                self.settings.set_sfx_volume(volume);
                self.audio.borrow_mut().set_sfx_volume(volume);
            }
            SessionCommand::ReturnToMenu => {
                if !matches!(self.view, SessionView::GameOver { .. }) {
                    log::warn!("ReturnToMenu ignored in {:?}", self.view);
                    return Ok(());
                }
                self.controller = None;
                self.view = SessionView::Menu {
                    continue_enabled: false,
                };
            }
        }
        Ok(())
    }

    /// Run one frame of gameplay. Outside the playing view this only
    /// tracks the menu key.
    pub fn update(&mut self, controls: &Controls, delta_time: f32) -> Result<Vec<LevelEvent>, LevelError> {
        let menu_pressed = controls.menu_select && !self.menu_held;
        self.menu_held = controls.menu_select;

        if self.view != SessionView::Playing {
            return Ok(Vec::new());
        }
        if menu_pressed {
            self.dispatch(SessionCommand::OpenMenu)?;
            return Ok(Vec::new());
        }
        let Some(controller) = self.controller.as_mut() else {
            return Ok(Vec::new());
        };

        let events = controller.update(controls, delta_time)?;
        for event in &events {
            if let LevelEvent::GameOver { final_score, .. } = event {
                self.view = SessionView::GameOver {
                    final_score: *final_score,
                };
            }
        }
        Ok(events)
    }
}
