//! Game composition root
//!
//! [`Game`] owns the simulation state plus the injected outer services
//! (audio sink, input source) and runs one frame at a time: poll input,
//! tick, dispatch events, render.

use std::sync::Arc;

use serde::Serialize;

use crate::audio::{AudioManager, MusicTrack, SoundSink};
use crate::config::GameConfig;
use crate::consts::MAX_FRAME_DT;
use crate::platform::{InputSource, Rumble};
use crate::renderer::{EntityView, RenderSink, tank_visible, trail_alpha};
use crate::settings::Settings;
use crate::sim::{
    GameEvent, GamePhase, GameState, LevelReport, PlayerRecord, PlayerSlot, TickInput, tick,
};

/// End-of-run numbers, serializable for the native runner
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub frames: u64,
    pub skipped_frames: u64,
    pub phase: GamePhase,
    pub level: u32,
    pub team_score: u64,
    pub total_kills: u32,
    pub eagle_health: i32,
    pub players: [PlayerRecord; 2],
    pub last_report: Option<LevelReport>,
}

pub struct Game {
    state: GameState,
    settings: Settings,
    audio: AudioManager,
    input: Box<dyn InputSource>,
    frames: u64,
    skipped_frames: u64,
    last_report: Option<LevelReport>,
}

impl Game {
    pub fn new(
        config: Arc<GameConfig>,
        settings: Settings,
        seed: u64,
        sink: Box<dyn SoundSink>,
        input: Box<dyn InputSource>,
    ) -> Self {
        let mut audio = AudioManager::new(sink, &settings);
        audio.play_music(MusicTrack::Menu);
        log::info!("Game initialized with seed: {seed}");
        Self {
            state: GameState::new(seed, config),
            settings,
            audio,
            input,
            frames: 0,
            skipped_frames: 0,
            last_report: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap in new preferences (audio levels apply immediately)
    pub fn apply_settings(&mut self, settings: Settings) {
        self.audio.apply_settings(&settings);
        self.settings = settings;
    }

    /// Throw the current run away and return to the menu with a new seed
    pub fn restart(&mut self, seed: u64) {
        let config = Arc::clone(&self.state.config);
        self.state = GameState::new(seed, config);
        self.last_report = None;
        self.audio.play_music(MusicTrack::Menu);
        log::info!("Restarted with seed: {seed}");
    }

    /// Host lost focus (tab hidden, window blurred): go quiet and pause
    pub fn focus_lost(&mut self) {
        self.audio.set_muted(true);
        if self.state.phase == GamePhase::Playing {
            self.state.phase = GamePhase::Paused;
            log::info!("Auto-paused (focus lost)");
        }
    }

    /// Focus is back. Audio resumes; the game stays paused until a player
    /// presses pause.
    pub fn focus_gained(&mut self) {
        self.audio.set_muted(false);
    }

    /// Run one frame: update unless `dt` is out of range, then always render
    pub fn frame(&mut self, dt: f32, renderer: &mut dyn RenderSink) {
        self.update(dt);
        self.render(renderer);
    }

    /// Poll input, tick and dispatch events. Returns false when the frame
    /// was skipped because `dt` was unusable.
    pub fn update(&mut self, dt: f32) -> bool {
        self.frames += 1;
        if !dt.is_finite() || !(0.0..=MAX_FRAME_DT).contains(&dt) {
            self.skipped_frames += 1;
            log::debug!("Skipping update, dt {dt}");
            return false;
        }

        let input = TickInput::from_players(
            self.input.poll(PlayerSlot::One),
            self.input.poll(PlayerSlot::Two),
        );
        tick(&mut self.state, &input, dt);

        for event in self.state.drain_events() {
            self.dispatch(event);
        }
        true
    }

    fn dispatch(&mut self, event: GameEvent) {
        match event {
            GameEvent::Sound(effect) => self.audio.play(effect),
            GameEvent::Music(Some(track)) => self.audio.play_music(track),
            GameEvent::Music(None) => self.audio.stop_music(),
            GameEvent::PlayerDamaged { slot, amount, max_health, fatal } => {
                let rumble = if fatal { Rumble::death() } else { Rumble::damage(amount, max_health) };
                self.rumble(slot, rumble);
            }
            GameEvent::PlayerRespawned { slot } => self.rumble(slot, Rumble::respawn()),
            GameEvent::LevelComplete(report) | GameEvent::Victory(report) => {
                self.last_report = Some(report);
            }
            GameEvent::EnemyKilled { .. }
            | GameEvent::ExtraLife { .. }
            | GameEvent::LifeTransferred { .. }
            | GameEvent::GameOver(_) => {}
        }
    }

    fn rumble(&mut self, slot: PlayerSlot, rumble: Rumble) {
        if self.settings.vibration_enabled {
            self.input.rumble(slot, rumble);
        }
    }

    /// Hand every visible entity to `renderer`, back to front
    pub fn render(&self, renderer: &mut dyn RenderSink) {
        let state = &self.state;
        renderer.begin_frame(state);

        for obstacle in state.obstacles.iter().filter(|o| !o.destroyed) {
            renderer.draw(EntityView::Obstacle(obstacle));
        }
        renderer.draw(EntityView::Eagle { eagle: &state.eagle, shielded: state.shield_active() });
        for power_up in &state.power_ups {
            renderer.draw(EntityView::PowerUp(power_up));
        }
        for tank in state.living_tanks() {
            renderer.draw(EntityView::Tank { tank, visible: tank_visible(tank) });
        }
        for bullet in state.bullets.iter().filter(|b| !b.marked_for_deletion) {
            renderer.draw(EntityView::Bullet(bullet));
        }
        for missile in &state.missiles {
            let len = missile.trail.len();
            for (i, &point) in missile.trail.iter().enumerate() {
                renderer.draw(EntityView::Trail { point, alpha: trail_alpha(i, len) });
            }
        }
        for missile in &state.missiles {
            renderer.draw(EntityView::Missile(missile));
        }

        renderer.end_frame();
    }

    pub fn summary(&self) -> RunSummary {
        let state = &self.state;
        RunSummary {
            seed: state.seed,
            frames: self.frames,
            skipped_frames: self.skipped_frames,
            phase: state.phase,
            level: state.progress.level,
            team_score: state.progress.team_score,
            total_kills: state.progress.total_kills,
            eagle_health: state.eagle.health,
            players: state.records.clone(),
            last_report: self.last_report.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundEffect;
    use crate::audio::tests::RecordingSink;
    use crate::platform::ScriptedInput;
    use crate::renderer::FrameCounter;
    use crate::sim::PlayerInput;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scripted input whose rumble log the test can still read
    #[derive(Default, Clone)]
    struct SharedInput(Rc<RefCell<ScriptedInput>>);

    impl InputSource for SharedInput {
        fn poll(&mut self, slot: PlayerSlot) -> Option<PlayerInput> {
            self.0.borrow_mut().poll(slot)
        }

        fn rumble(&mut self, slot: PlayerSlot, rumble: Rumble) {
            self.0.borrow_mut().rumble(slot, rumble);
        }
    }

    const DT: f32 = 1.0 / 60.0;

    fn game_with(settings: Settings) -> (Game, RecordingSink, SharedInput) {
        let sink = RecordingSink::default();
        let input = SharedInput::default();
        let game = Game::new(
            Arc::new(GameConfig::default()),
            settings,
            9,
            Box::new(sink.clone()),
            Box::new(input.clone()),
        );
        (game, sink, input)
    }

    fn confirm() -> PlayerInput {
        PlayerInput { confirm: true, ..Default::default() }
    }

    #[test]
    fn test_confirm_starts_battle_music() {
        let (mut game, sink, input) = game_with(Settings::default());
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        let mut counter = FrameCounter::default();
        game.frame(DT, &mut counter);

        assert_eq!(game.state().phase, GamePhase::Playing);
        assert_eq!(
            *sink.music.borrow(),
            vec![Some(MusicTrack::Menu), Some(MusicTrack::Battle)]
        );
        // Two players and the first enemy
        assert_eq!(counter.tanks, 3);
        assert_eq!(counter.eagles, 1);
    }

    #[test]
    fn test_long_frame_skips_update_but_renders() {
        let (mut game, _sink, input) = game_with(Settings::default());
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        let mut counter = FrameCounter::default();
        game.frame(0.5, &mut counter);

        assert_eq!(game.state().phase, GamePhase::Menu);
        assert_eq!(counter.frames, 1);
        assert!(counter.obstacles > 0);
        assert_eq!(game.summary().skipped_frames, 1);
        // The confirm was never polled
        assert_eq!(input.0.borrow().pending(PlayerSlot::One), 1);
    }

    #[test]
    fn test_sounds_reach_sink() {
        let (mut game, sink, input) = game_with(Settings::default());
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        game.update(DT);
        input
            .0
            .borrow_mut()
            .push(PlayerSlot::Two, PlayerInput { shoot: true, ..Default::default() });
        game.update(DT);
        assert!(sink.sounds.borrow().contains(&SoundEffect::PlayerShoot));
    }

    #[test]
    fn test_disabled_sound_is_silent() {
        let settings = Settings { sound_enabled: false, ..Settings::default() };
        let (mut game, sink, input) = game_with(settings);
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        game.update(DT);
        input
            .0
            .borrow_mut()
            .push(PlayerSlot::One, PlayerInput { shoot: true, ..Default::default() });
        game.update(DT);
        assert!(sink.sounds.borrow().is_empty());
    }

    #[test]
    fn test_damage_rumbles_controller() {
        let (mut game, _sink, input) = game_with(Settings::default());
        game.dispatch(GameEvent::PlayerDamaged {
            slot: PlayerSlot::Two,
            amount: 25,
            max_health: 100,
            fatal: false,
        });
        game.dispatch(GameEvent::PlayerDamaged {
            slot: PlayerSlot::One,
            amount: 100,
            max_health: 100,
            fatal: true,
        });
        game.dispatch(GameEvent::PlayerRespawned { slot: PlayerSlot::One });

        assert_eq!(
            input.0.borrow().rumbles,
            vec![
                (PlayerSlot::Two, Rumble::damage(25, 100)),
                (PlayerSlot::One, Rumble::death()),
                (PlayerSlot::One, Rumble::respawn()),
            ]
        );
    }

    #[test]
    fn test_vibration_disabled_suppresses_rumble() {
        let settings = Settings { vibration_enabled: false, ..Settings::default() };
        let (mut game, _sink, input) = game_with(settings);
        game.dispatch(GameEvent::PlayerRespawned { slot: PlayerSlot::One });
        assert!(input.0.borrow().rumbles.is_empty());
    }

    #[test]
    fn test_music_none_stops_track() {
        let (mut game, sink, _input) = game_with(Settings::default());
        game.dispatch(GameEvent::Music(None));
        assert_eq!(*sink.music.borrow(), vec![Some(MusicTrack::Menu), None]);
    }

    #[test]
    fn test_focus_lost_pauses_only_while_playing() {
        let (mut game, _sink, input) = game_with(Settings::default());
        game.focus_lost();
        assert_eq!(game.state().phase, GamePhase::Menu);

        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        game.update(DT);
        game.focus_lost();
        assert_eq!(game.state().phase, GamePhase::Paused);
    }

    #[test]
    fn test_focus_mutes_and_restores_music() {
        let (mut game, sink, input) = game_with(Settings::default());
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        game.update(DT);
        game.focus_lost();
        game.focus_gained();

        assert_eq!(game.state().phase, GamePhase::Paused);
        assert_eq!(
            *sink.music.borrow(),
            vec![Some(MusicTrack::Menu), Some(MusicTrack::Battle), None, Some(MusicTrack::Battle)]
        );

        // Sounds are dropped while unfocused
        game.focus_lost();
        let heard = sink.sounds.borrow().len();
        game.dispatch(GameEvent::Sound(SoundEffect::PlayerShoot));
        assert_eq!(sink.sounds.borrow().len(), heard);
    }

    /// Keeps the alpha of every trail point it is shown
    #[derive(Default)]
    struct TrailRecorder(Vec<f32>);

    impl RenderSink for TrailRecorder {
        fn draw(&mut self, view: EntityView<'_>) {
            if let EntityView::Trail { alpha, .. } = view {
                self.0.push(alpha);
            }
        }
    }

    #[test]
    fn test_missile_trail_fades_toward_tail() {
        let (mut game, _sink, input) = game_with(Settings::default());
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        game.update(DT);

        let owner = game.state.player(PlayerSlot::One).unwrap().owner();
        let config = Arc::clone(&game.state.config);
        let mut missile =
            crate::sim::StrayMissile::launch(glam::Vec2::new(400.0, 300.0), owner, &config.missile)
                .unwrap();
        missile.trail = (0..4).map(|i| glam::Vec2::new(400.0, 300.0 + i as f32)).collect();
        game.state.missiles.push(missile);

        let mut recorder = TrailRecorder::default();
        game.render(&mut recorder);
        assert_eq!(recorder.0.len(), 4);
        assert!((recorder.0[0] - 0.8).abs() < 1e-6);
        assert!(recorder.0.windows(2).all(|w| w[0] > w[1]));

        let mut counter = FrameCounter::default();
        game.render(&mut counter);
        assert_eq!((counter.trail_points, counter.missiles), (4, 1));
    }

    #[test]
    fn test_restart_returns_to_menu() {
        let (mut game, _sink, input) = game_with(Settings::default());
        input.0.borrow_mut().push(PlayerSlot::One, confirm());
        game.update(DT);
        game.restart(77);
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert_eq!(game.summary().seed, 77);
    }
}
