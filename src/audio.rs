//! Audio hooks
//!
//! The simulation only names sounds; a host-provided [`SoundSink`] turns them
//! into noise. [`AudioManager`] sits between the two and applies the player's
//! mute and volume preferences. Playback is fire-and-forget: nothing in the
//! game waits for, or reacts to, a sound.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player fired
    PlayerShoot,
    /// Enemy fired
    EnemyShoot,
    /// Stray missile volley launched
    MissileLaunch,
    /// Stray missile struck a tank
    MissileHit,
    /// Enemy tank destroyed
    EnemyDestroy,
    /// Explosive round detonated
    Explosion,
    /// Lightning arced between tanks
    Thunder,
    /// Bullet ricocheted or was deflected by the shield
    Bounce,
    /// Health pickup collected
    HealthPickup,
    /// Weapon pickup collected
    WeaponPickup,
    /// Shield pickup collected
    Shield,
    /// Any other pickup collected
    PowerUp,
    /// A life moved between players
    LifeTransfer,
    /// Level cleared
    LevelComplete,
    /// Game over
    GameOver,
}

impl SoundEffect {
    /// Stable identifier for sound banks keyed by name
    pub fn id(&self) -> &'static str {
        match self {
            SoundEffect::PlayerShoot => "playerShoot",
            SoundEffect::EnemyShoot => "shoot",
            SoundEffect::MissileLaunch => "missileLaunch",
            SoundEffect::MissileHit => "missileHit",
            SoundEffect::EnemyDestroy => "enemyDestroy",
            SoundEffect::Explosion => "explosion",
            SoundEffect::Thunder => "thunder",
            SoundEffect::Bounce => "bounce",
            SoundEffect::HealthPickup => "healthPickup",
            SoundEffect::WeaponPickup => "weaponPickup",
            SoundEffect::Shield => "shield",
            SoundEffect::PowerUp => "powerUp",
            SoundEffect::LifeTransfer => "lifeTransfer",
            SoundEffect::LevelComplete => "levelComplete",
            SoundEffect::GameOver => "gameOver",
        }
    }
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Menu,
    Battle,
}

impl MusicTrack {
    pub fn id(&self) -> &'static str {
        match self {
            MusicTrack::Menu => "menu",
            MusicTrack::Battle => "battle",
        }
    }
}

/// Host audio backend
pub trait SoundSink {
    fn play_sound(&mut self, effect: SoundEffect, volume: f32);
    fn play_music(&mut self, track: MusicTrack, volume: f32);
    fn stop_music(&mut self);
}

/// Logs every request at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SoundSink for LogSink {
    fn play_sound(&mut self, effect: SoundEffect, volume: f32) {
        log::debug!("sound {} @ {volume:.2}", effect.id());
    }

    fn play_music(&mut self, track: MusicTrack, volume: f32) {
        log::debug!("music {} @ {volume:.2}", track.id());
    }

    fn stop_music(&mut self) {
        log::debug!("music stopped");
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Box<dyn SoundSink>,
    sound_volume: f32,
    music_volume: f32,
    muted: bool,
    current_track: Option<MusicTrack>,
}

impl AudioManager {
    pub fn new(sink: Box<dyn SoundSink>, settings: &Settings) -> Self {
        let mut manager = Self {
            sink,
            sound_volume: 0.0,
            music_volume: 0.0,
            muted: false,
            current_track: None,
        };
        manager.apply_settings(settings);
        manager
    }

    /// Pick up new volume/enable preferences
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sound_volume = settings.effective_sound_volume();
        self.music_volume = settings.effective_music_volume();
        if self.music_volume <= 0.0 && self.current_track.is_some() {
            self.stop_music();
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.sink.stop_music();
        } else if let Some(track) = self.current_track {
            self.sink.play_music(track, self.music_volume);
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        if self.muted || self.sound_volume <= 0.0 {
            return;
        }
        self.sink.play_sound(effect, self.sound_volume);
    }

    pub fn play_music(&mut self, track: MusicTrack) {
        if self.music_volume <= 0.0 {
            return;
        }
        self.current_track = Some(track);
        if !self.muted {
            self.sink.play_music(track, self.music_volume);
        }
    }

    pub fn stop_music(&mut self) {
        self.current_track = None;
        self.sink.stop_music();
    }
}
