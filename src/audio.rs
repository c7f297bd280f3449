//! Audio triggers
//!
//! The simulation fires sound cues and starts/stops music; actual playback
//! lives behind [`AudioBackend`]. Music and effects have separate volumes.

use std::cell::RefCell;
use std::rc::Rc;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player jumped (full or soft)
    Jump,
}

/// Playback collaborator. Calls are fire-and-forget.
pub trait AudioBackend {
    fn play_effect(&mut self, effect: SoundEffect, volume: f32);
    fn start_music(&mut self, volume: f32);
    fn stop_music(&mut self);
    /// Volume change for music already playing
    fn set_music_volume(&mut self, _volume: f32) {}
}

/// Backend that plays nothing
#[derive(Debug, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn play_effect(&mut self, _effect: SoundEffect, _volume: f32) {}
    fn start_music(&mut self, _volume: f32) {}
    fn stop_music(&mut self) {}
}

/// What a [`RecordingBackend`] saw
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Effect(SoundEffect, f32),
    StartMusic(f32),
    StopMusic,
    MusicVolume(f32),
}

/// Backend that records calls; clones share the log
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    calls: Rc<RefCell<Vec<AudioCall>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&AudioCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }
}

impl AudioBackend for RecordingBackend {
    fn play_effect(&mut self, effect: SoundEffect, volume: f32) {
        self.calls.borrow_mut().push(AudioCall::Effect(effect, volume));
    }

    fn start_music(&mut self, volume: f32) {
        self.calls.borrow_mut().push(AudioCall::StartMusic(volume));
    }

    fn stop_music(&mut self) {
        self.calls.borrow_mut().push(AudioCall::StopMusic);
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.calls.borrow_mut().push(AudioCall::MusicVolume(volume));
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    music_volume: f32,
    sfx_volume: f32,
    music_playing: bool,
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("music_volume", &self.music_volume)
            .field("sfx_volume", &self.sfx_volume)
            .field("music_playing", &self.music_playing)
            .finish()
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(SilentBackend), 0.2, 1.0)
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>, music_volume: f32, sfx_volume: f32) -> Self {
        Self {
            backend,
            music_volume: music_volume.clamp(0.0, 1.0),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
            music_playing: false,
        }
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.sfx_volume
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
        log::debug!("music volume set to {}", self.music_volume);
        if self.music_playing {
            self.backend.set_music_volume(self.music_volume);
        }
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
        log::debug!("sfx volume set to {}", self.sfx_volume);
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        if self.sfx_volume <= 0.0 {
            return;
        }
        self.backend.play_effect(effect, self.sfx_volume);
    }

    /// Start the looping track unless it is already playing
    pub fn play_music(&mut self) {
        if self.music_playing {
            return;
        }
        log::debug!("start playing music: vol={}", self.music_volume);
        self.backend.start_music(self.music_volume);
        self.music_playing = true;
    }

    pub fn stop_music(&mut self) {
        if !self.music_playing {
            return;
        }
        log::debug!("stop playing music");
        self.backend.stop_music();
        self.music_playing = false;
    }
}
