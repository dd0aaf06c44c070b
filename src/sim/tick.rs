//! Main simulation tick
//!
//! One call advances the whole battle by `dt`. The order is fixed:
//! sweep, timers, players, AI, firing, projectile flight, collisions,
//! bookkeeping. Nothing here knows about audio, rendering or devices;
//! side effects leave through `state.events`.

use std::sync::Arc;

use glam::Vec2;

use super::ai::AiContext;
use super::level;
use super::powerup;
use super::state::{GamePhase, GameState, PlayerSlot};
use super::tank::{Control, Footprint, Tank, World};
use super::weapons;
use crate::audio::SoundEffect;

/// Where a player wants the turret to point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    /// Relative direction, e.g. a gamepad stick
    Direction(Vec2),
    /// Absolute arena point, e.g. a mouse cursor
    Point(Vec2),
}

/// One player's controls for a single frame.
///
/// `shoot` is a held signal; every other flag is an edge and should be true
/// for exactly one frame per press.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Movement intent, clamped to unit length by the tank
    pub movement: Vec2,
    /// `None` leaves the turret where it is
    pub aim: Option<Aim>,
    pub shoot: bool,
    pub launch_missiles: bool,
    pub transfer_life: bool,
    pub pause: bool,
    pub confirm: bool,
}

/// Input for a single simulation tick. A missing player is treated as idle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub players: [Option<PlayerInput>; 2],
}

impl TickInput {
    pub fn from_players(one: Option<PlayerInput>, two: Option<PlayerInput>) -> Self {
        Self { players: [one, two] }
    }

    pub fn player(&self, slot: PlayerSlot) -> Option<&PlayerInput> {
        self.players[slot.index()].as_ref()
    }

    /// Either player pressed pause
    pub fn pause(&self) -> bool {
        self.players.iter().flatten().any(|p| p.pause)
    }

    /// Either player pressed confirm
    pub fn confirm(&self) -> bool {
        self.players.iter().flatten().any(|p| p.confirm)
    }
}

/// Advance the game by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    match state.phase {
        GamePhase::Menu => {
            if input.confirm() {
                state.start();
            }
            return;
        }
        GamePhase::LevelComplete => {
            if input.confirm() {
                level::next_level(state);
            }
            return;
        }
        GamePhase::Paused => {
            if input.pause() {
                state.phase = GamePhase::Playing;
                log::debug!("Resumed");
            }
            return;
        }
        GamePhase::GameOver(_) | GamePhase::Victory => return,
        GamePhase::Playing => {
            if input.pause() {
                state.phase = GamePhase::Paused;
                log::debug!("Paused");
                return;
            }
        }
    }

    state.time += dt;

    // Bullets that hit something last frame
    state.bullets.retain(|b| !b.marked_for_deletion);

    update_timers(state, dt);

    let mut footprints: Vec<Footprint> = state.living_tanks().map(Tank::footprint).collect();
    update_players(state, input, dt, &mut footprints);
    update_enemies(state, dt, &mut footprints);

    fire_weapons(state, input);

    weapons::advance_projectiles(state, dt);
    weapons::resolve_bullets(state);
    weapons::resolve_missiles(state);

    powerup::update_and_collect(state, dt);
    level::check_life_rewards(state);
    // Losing the eagle outranks a kill target reached on the same frame
    if !level::check_game_over(state) {
        level::check_level_complete(state);
    }
    level::keep_tanks_in_bounds(state);

    state.normalize_order();
}

fn update_timers(state: &mut GameState, dt: f32) {
    let spawn_interval = state.progress.current.enemy_spawn_interval;
    let power_up_interval = state.progress.current.power_up_frequency;

    state.enemy_spawn_timer += dt;
    if state.enemy_spawn_timer >= spawn_interval {
        state.enemy_spawn_timer = 0.0;
        level::spawn_enemy(state);
    }

    state.power_up_timer += dt;
    if state.power_up_timer >= power_up_interval {
        state.power_up_timer = 0.0;
        powerup::spawn(state);
    }

    if let Some(remaining) = state.eagle_shield {
        let remaining = remaining - dt;
        state.eagle_shield = (remaining > 0.0).then_some(remaining);
        if state.eagle_shield.is_none() {
            log::info!("Eagle shield expired");
        }
    }

    level::tick_respawns(state, dt);
    state.progress.level_elapsed += dt;
}

fn update_footprint(footprints: &mut [Footprint], tank: &Tank) {
    if let Some(footprint) = footprints.iter_mut().find(|f| f.id == tank.id) {
        footprint.rect = tank.bounds();
    }
}

fn update_players(state: &mut GameState, input: &TickInput, dt: f32, footprints: &mut [Footprint]) {
    for slot in PlayerSlot::ALL {
        if input.player(slot).is_some_and(|p| p.transfer_life) {
            level::transfer_life(state, slot);
        }
    }

    let idle = PlayerInput::default();
    for slot in PlayerSlot::ALL {
        let i = slot.index();
        let Some(tank) = state.players[i].as_mut() else {
            continue;
        };
        if !tank.alive {
            state.players[i] = None;
            continue;
        }
        let control = input.player(slot).unwrap_or(&idle);
        let world = World { obstacles: &state.obstacles, tanks: &*footprints };
        tank.update(dt, Control::Player(control), &world, &mut state.rng);
        update_footprint(footprints, tank);
    }
}

fn update_enemies(state: &mut GameState, dt: f32, footprints: &mut [Footprint]) {
    let players = state.living_players();
    let config = Arc::clone(&state.config);
    let context = AiContext {
        players: &players,
        detection_range: config.enemy.detection_range,
        direction_change_interval: config.enemy.direction_change_interval,
    };

    for tank in state.enemies.iter_mut().filter(|t| t.alive) {
        let world = World { obstacles: &state.obstacles, tanks: &*footprints };
        tank.update(dt, Control::Ai(&context), &world, &mut state.rng);
        update_footprint(footprints, tank);
    }
    state.enemies.retain(|t| t.alive);
}

fn fire_weapons(state: &mut GameState, input: &TickInput) {
    let config = Arc::clone(&state.config);

    let mut enemy_shots = Vec::new();
    for tank in state.enemies.iter_mut().filter(|t| t.alive && t.ready_to_fire()) {
        enemy_shots.extend(tank.shoot(&config));
    }
    if !enemy_shots.is_empty() {
        state.bullets.append(&mut enemy_shots);
        state.sound(SoundEffect::EnemyShoot);
    }

    let enemies = state.living_enemies();
    for slot in PlayerSlot::ALL {
        if !input.player(slot).is_some_and(|p| p.launch_missiles) {
            continue;
        }
        let Some(tank) = state.players[slot.index()].as_mut() else {
            continue;
        };
        let volley = tank.launch_stray_missiles(&enemies, &config.missile);
        if !volley.is_empty() {
            state.missiles.extend(volley);
            state.sound(SoundEffect::MissileLaunch);
        }
    }

    for slot in PlayerSlot::ALL {
        if !input.player(slot).is_some_and(|p| p.shoot) {
            continue;
        }
        let Some(tank) = state.players[slot.index()].as_mut() else {
            continue;
        };
        let mut shots = tank.shoot(&config);
        if !shots.is_empty() {
            state.bullets.append(&mut shots);
            state.sound(SoundEffect::PlayerShoot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::bullet::{Bullet, Payload};
    use crate::sim::state::{GameEvent, GameOverReason};

    const DT: f32 = 1.0 / 60.0;

    fn playing_state() -> GameState {
        let mut state = GameState::new(42, Arc::new(GameConfig::default()));
        tick(&mut state, &confirm(), DT);
        state.drain_events();
        state
    }

    fn confirm() -> TickInput {
        TickInput::from_players(Some(PlayerInput { confirm: true, ..Default::default() }), None)
    }

    fn pause() -> TickInput {
        TickInput::from_players(None, Some(PlayerInput { pause: true, ..Default::default() }))
    }

    fn p1(input: PlayerInput) -> TickInput {
        TickInput::from_players(Some(input), None)
    }

    #[test]
    fn test_confirm_starts_from_menu() {
        let mut state = GameState::new(42, Arc::new(GameConfig::default()));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.players.iter().all(Option::is_none));

        tick(&mut state, &confirm(), DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.players.iter().all(Option::is_some));
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut state = playing_state();
        tick(&mut state, &pause(), DT);
        assert_eq!(state.phase, GamePhase::Paused);

        let time = state.time;
        let pos = state.enemies[0].pos;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.time, time);
        assert_eq!(state.enemies[0].pos, pos);

        tick(&mut state, &pause(), DT);
        assert_eq!(state.phase, GamePhase::Playing);
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.time > time);
    }

    #[test]
    fn test_player_moves_and_aims() {
        let mut state = playing_state();
        let start = state.player(PlayerSlot::One).unwrap().pos;
        let input = PlayerInput {
            movement: Vec2::new(0.0, -1.0),
            aim: Some(Aim::Direction(Vec2::new(1.0, 0.0))),
            ..Default::default()
        };
        tick(&mut state, &p1(input), 0.1);

        let tank = state.player(PlayerSlot::One).unwrap();
        assert!((tank.pos.y - (start.y - 10.0)).abs() < 1e-3);
        assert_eq!(tank.turret_angle, 0.0);
    }

    #[test]
    fn test_held_shoot_respects_cooldown() {
        let mut state = playing_state();
        state.enemies.clear();
        let input = PlayerInput { shoot: true, ..Default::default() };

        tick(&mut state, &p1(input), DT);
        assert_eq!(state.bullets.iter().filter(|b| b.owner.is_player()).count(), 1);
        assert!(state.drain_events().contains(&GameEvent::Sound(SoundEffect::PlayerShoot)));

        tick(&mut state, &p1(input), DT);
        assert!(!state.drain_events().contains(&GameEvent::Sound(SoundEffect::PlayerShoot)));
    }

    #[test]
    fn test_missile_launch_is_an_edge() {
        let mut state = playing_state();
        let input = PlayerInput { launch_missiles: true, ..Default::default() };
        tick(&mut state, &p1(input), DT);
        assert_eq!(state.missiles.len(), 3);
        assert_eq!(state.player(PlayerSlot::One).unwrap().missiles.unwrap().count, 9);

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.player(PlayerSlot::One).unwrap().missiles.unwrap().count, 9);
    }

    #[test]
    fn test_enemy_fires_when_ready() {
        let mut state = playing_state();
        let enemy = &mut state.enemies[0];
        enemy.last_shot = enemy.shoot_cooldown;
        tick(&mut state, &TickInput::default(), DT);

        assert!(state.bullets.iter().any(|b| !b.owner.is_player()));
        assert!(state.drain_events().contains(&GameEvent::Sound(SoundEffect::EnemyShoot)));
        assert_eq!(state.enemies[0].ammo, Some(49));
    }

    #[test]
    fn test_marked_bullets_swept_next_frame() {
        let mut state = playing_state();
        state.enemies.clear();
        let owner = state.player(PlayerSlot::One).unwrap().owner();
        let mut bullet = Bullet::new(
            Vec2::new(400.0, 300.0),
            Vec2::new(0.0, -300.0),
            owner,
            Payload::default(),
            &state.config.bullet,
        );
        bullet.marked_for_deletion = true;
        state.bullets.push(bullet);

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_killed_enemy_compacted_next_frame() {
        let mut state = playing_state();
        state.enemies[0].take_damage(1000);
        assert!(!state.enemies[0].alive);
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.enemies.iter().all(|t| t.alive));
    }

    #[test]
    fn test_dead_player_respawns_after_delay() {
        let mut state = playing_state();
        state.enemies.clear();
        if let Some(tank) = state.player_mut(PlayerSlot::One) {
            tank.invulnerable = 0.0;
            tank.take_damage(1000);
        }

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.player(PlayerSlot::One).is_none());

        for _ in 0..130 {
            tick(&mut state, &TickInput::default(), DT);
        }
        let tank = state.player(PlayerSlot::One).unwrap();
        assert!(tank.alive);
        assert_eq!(state.records[0].lives, 2);
    }

    #[test]
    fn test_transfer_life_edge() {
        let mut state = playing_state();
        tick(&mut state, &p1(PlayerInput { transfer_life: true, ..Default::default() }), DT);
        assert_eq!(state.records[0].lives, 2);
        assert_eq!(state.records[1].lives, 4);
    }

    #[test]
    fn test_eagle_destroyed_ends_game() {
        let mut state = playing_state();
        state.eagle.health = 0;
        state.eagle.destroyed = true;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::GameOver(GameOverReason::EagleDestroyed));

        let time = state.time;
        tick(&mut state, &confirm(), DT);
        assert_eq!(state.time, time);
    }

    #[test]
    fn test_eagle_shield_counts_down() {
        let mut state = playing_state();
        state.eagle_shield = Some(0.01);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.eagle_shield, None);
    }

    #[test]
    fn test_level_complete_then_confirm() {
        let mut state = playing_state();
        state.progress.level_kills = state.progress.kill_target();
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::LevelComplete(_))));

        tick(&mut state, &confirm(), DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.progress.level, 2);
    }

    #[test]
    fn test_same_seed_same_battle() {
        let run = || {
            let mut state = GameState::new(1234, Arc::new(GameConfig::default()));
            tick(&mut state, &confirm(), DT);
            let input = PlayerInput { movement: Vec2::new(1.0, -1.0), shoot: true, ..Default::default() };
            for _ in 0..600 {
                tick(&mut state, &p1(input), DT);
            }
            let enemies: Vec<Vec2> = state.enemies.iter().map(|t| t.pos).collect();
            (enemies, state.bullets.len(), state.records[0].score)
        };
        assert_eq!(run(), run());
    }
}
