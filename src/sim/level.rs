//! Level progression: difficulty lookup, obstacle layouts, enemy spawning,
//! scoring, lives, respawns and the terminal-state checks

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Obstacle;
use super::rect::Rect;
use super::state::{EntityId, GameEvent, GameOverReason, GamePhase, GameState, KillMethod, PlayerSlot};
use super::tank::Tank;
use crate::audio::SoundEffect;
use crate::config::{GameConfig, LevelConfig};
use crate::consts::*;

/// Minimum distance between a new enemy and any obstacle centre
const SPAWN_OBSTACLE_CLEARANCE: f32 = 40.0;
/// Minimum distance between a new enemy and any living player
const SPAWN_PLAYER_CLEARANCE: f32 = 80.0;

/// Level counters and the difficulty row in effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based level number
    pub level: u32,
    /// Kills toward this level's target
    pub level_kills: u32,
    /// Kills across the whole run
    pub total_kills: u32,
    pub team_score: u64,
    /// Team score when the level began
    pub level_start_score: u64,
    /// Seconds spent playing this level
    pub level_elapsed: f32,
    pub current: LevelConfig,
}

impl Progress {
    pub fn new(level: u32, config: &GameConfig) -> Self {
        Self {
            level,
            level_kills: 0,
            total_kills: 0,
            team_score: 0,
            level_start_score: 0,
            level_elapsed: 0.0,
            current: config.level(level),
        }
    }

    pub fn kill_target(&self) -> u32 {
        self.current.kill_target
    }
}

/// One player's line in a level report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub score: u64,
    pub kills: u32,
    pub lives: u32,
}

/// Summary emitted when a level is cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub level: u32,
    pub kills: u32,
    pub kill_target: u32,
    /// Seconds taken
    pub elapsed: f32,
    pub time_bonus: u64,
    /// Points earned this level, bonus included
    pub level_score: u64,
    pub team_score: u64,
    pub eagle_health: i32,
    pub players: [PlayerReport; 2],
}

/// Symmetric steel arrangements. `Opening` is used for level 1, the rest are
/// drawn at random on every level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleLayout {
    Opening,
    Cross,
    Diamond,
    Maze,
    Fortress,
}

impl ObstacleLayout {
    pub const PATTERNS: [ObstacleLayout; 4] = [
        ObstacleLayout::Cross,
        ObstacleLayout::Diamond,
        ObstacleLayout::Maze,
        ObstacleLayout::Fortress,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::PATTERNS[rng.random_range(0..Self::PATTERNS.len())]
    }

    /// Boundary walls, the brick ring around the eagle, then this pattern
    pub fn build(self, config: &GameConfig, eagle: Vec2) -> Vec<Obstacle> {
        let (w, h) = (config.map.width, config.map.height);
        let brick = config.obstacle.destructible_health;
        let c = Vec2::new(w / 2.0, h / 2.0);

        let mut obstacles = vec![
            Obstacle::steel(0.0, 0.0, w, WALL_THICKNESS),
            Obstacle::steel(0.0, h - WALL_THICKNESS, w, WALL_THICKNESS),
            Obstacle::steel(0.0, 0.0, WALL_THICKNESS, h),
            Obstacle::steel(w - WALL_THICKNESS, 0.0, WALL_THICKNESS, h),
        ];

        let (ex, ey) = (eagle.x, eagle.y);
        obstacles.extend([
            Obstacle::brick(ex - 80.0, ey - 40.0, 30.0, 80.0, brick),
            Obstacle::brick(ex - 50.0, ey - 40.0, 20.0, 30.0, brick),
            Obstacle::brick(ex - 50.0, ey + 10.0, 20.0, 30.0, brick),
            Obstacle::brick(ex + 50.0, ey - 40.0, 30.0, 80.0, brick),
            Obstacle::brick(ex + 30.0, ey - 40.0, 20.0, 30.0, brick),
            Obstacle::brick(ex + 30.0, ey + 10.0, 20.0, 30.0, brick),
            Obstacle::brick(ex - 50.0, ey - 60.0, 40.0, 20.0, brick),
            Obstacle::brick(ex + 10.0, ey - 60.0, 40.0, 20.0, brick),
            Obstacle::brick(ex - 30.0, ey - 40.0, 60.0, 15.0, brick),
            Obstacle::brick(ex - 100.0, ey - 20.0, 20.0, 40.0, brick),
            Obstacle::brick(ex + 80.0, ey - 20.0, 20.0, 40.0, brick),
        ]);

        match self {
            ObstacleLayout::Opening => obstacles.extend([
                // Northern wall with wings
                Obstacle::steel(c.x - 40.0, 120.0, 80.0, 30.0),
                Obstacle::steel(c.x - 60.0, 100.0, 30.0, 30.0),
                Obstacle::steel(c.x + 30.0, 100.0, 30.0, 30.0),
                Obstacle::steel(150.0, 80.0, 40.0, 40.0),
                Obstacle::steel(610.0, 80.0, 40.0, 40.0),
                Obstacle::steel(120.0, 160.0, 30.0, 60.0),
                Obstacle::steel(650.0, 160.0, 30.0, 60.0),
                // Central cross and its corner posts
                Obstacle::steel(c.x - 100.0, c.y - 15.0, 80.0, 30.0),
                Obstacle::steel(c.x + 20.0, c.y - 15.0, 80.0, 30.0),
                Obstacle::steel(c.x - 15.0, c.y - 80.0, 30.0, 60.0),
                Obstacle::steel(c.x - 15.0, c.y + 20.0, 30.0, 60.0),
                Obstacle::steel(c.x - 80.0, c.y - 60.0, 25.0, 25.0),
                Obstacle::steel(c.x + 55.0, c.y - 60.0, 25.0, 25.0),
                Obstacle::steel(c.x - 80.0, c.y + 35.0, 25.0, 25.0),
                Obstacle::steel(c.x + 55.0, c.y + 35.0, 25.0, 25.0),
                // Flank columns
                Obstacle::steel(80.0, 200.0, 30.0, 50.0),
                Obstacle::steel(80.0, 280.0, 30.0, 50.0),
                Obstacle::steel(80.0, 360.0, 30.0, 50.0),
                Obstacle::steel(690.0, 200.0, 30.0, 50.0),
                Obstacle::steel(690.0, 280.0, 30.0, 50.0),
                Obstacle::steel(690.0, 360.0, 30.0, 50.0),
                // Forward line before the base
                Obstacle::steel(200.0, 450.0, 60.0, 25.0),
                Obstacle::steel(540.0, 450.0, 60.0, 25.0),
                Obstacle::steel(320.0, 480.0, 40.0, 20.0),
                Obstacle::steel(440.0, 480.0, 40.0, 20.0),
                Obstacle::steel(160.0, 420.0, 25.0, 40.0),
                Obstacle::steel(615.0, 420.0, 25.0, 40.0),
                // Brick cover
                Obstacle::brick(200.0, 140.0, 50.0, 30.0, brick),
                Obstacle::brick(550.0, 140.0, 50.0, 30.0, brick),
                Obstacle::brick(280.0, 200.0, 40.0, 40.0, brick),
                Obstacle::brick(480.0, 200.0, 40.0, 40.0, brick),
                Obstacle::brick(250.0, 350.0, 60.0, 25.0, brick),
                Obstacle::brick(490.0, 350.0, 60.0, 25.0, brick),
                Obstacle::brick(180.0, 300.0, 30.0, 30.0, brick),
                Obstacle::brick(590.0, 300.0, 30.0, 30.0, brick),
            ]),
            ObstacleLayout::Cross => obstacles.extend([
                Obstacle::steel(c.x - 120.0, c.y - 15.0, 80.0, 30.0),
                Obstacle::steel(c.x + 40.0, c.y - 15.0, 80.0, 30.0),
                Obstacle::steel(c.x - 15.0, c.y - 100.0, 30.0, 70.0),
                Obstacle::steel(c.x - 15.0, c.y + 30.0, 30.0, 70.0),
                Obstacle::steel(150.0, 100.0, 40.0, 40.0),
                Obstacle::steel(610.0, 100.0, 40.0, 40.0),
                Obstacle::steel(150.0, 400.0, 40.0, 40.0),
                Obstacle::steel(610.0, 400.0, 40.0, 40.0),
            ]),
            ObstacleLayout::Diamond => obstacles.extend([
                Obstacle::steel(c.x - 60.0, c.y - 80.0, 120.0, 25.0),
                Obstacle::steel(c.x - 40.0, c.y - 55.0, 80.0, 25.0),
                Obstacle::steel(c.x - 40.0, c.y + 30.0, 80.0, 25.0),
                Obstacle::steel(c.x - 60.0, c.y + 55.0, 120.0, 25.0),
                Obstacle::steel(100.0, 200.0, 30.0, 100.0),
                Obstacle::steel(670.0, 200.0, 30.0, 100.0),
                Obstacle::steel(200.0, 150.0, 30.0, 80.0),
                Obstacle::steel(570.0, 150.0, 30.0, 80.0),
            ]),
            ObstacleLayout::Maze => obstacles.extend([
                Obstacle::steel(200.0, 80.0, 30.0, 80.0),
                Obstacle::steel(300.0, 120.0, 80.0, 30.0),
                Obstacle::steel(420.0, 120.0, 80.0, 30.0),
                Obstacle::steel(570.0, 80.0, 30.0, 80.0),
                Obstacle::steel(c.x - 80.0, c.y - 40.0, 30.0, 80.0),
                Obstacle::steel(c.x + 50.0, c.y - 40.0, 30.0, 80.0),
                Obstacle::steel(c.x - 50.0, c.y - 15.0, 100.0, 30.0),
                Obstacle::steel(180.0, 380.0, 60.0, 30.0),
                Obstacle::steel(320.0, 350.0, 30.0, 60.0),
                Obstacle::steel(450.0, 350.0, 30.0, 60.0),
                Obstacle::steel(560.0, 380.0, 60.0, 30.0),
            ]),
            ObstacleLayout::Fortress => obstacles.extend([
                Obstacle::steel(c.x - 100.0, 120.0, 60.0, 40.0),
                Obstacle::steel(c.x + 40.0, 120.0, 60.0, 40.0),
                Obstacle::steel(c.x - 20.0, 80.0, 40.0, 40.0),
                Obstacle::steel(c.x - 60.0, c.y - 30.0, 40.0, 60.0),
                Obstacle::steel(c.x + 20.0, c.y - 30.0, 40.0, 60.0),
                Obstacle::steel(c.x - 20.0, c.y - 50.0, 40.0, 40.0),
                Obstacle::steel(120.0, 250.0, 50.0, 50.0),
                Obstacle::steel(630.0, 250.0, 50.0, 50.0),
                Obstacle::steel(250.0, 420.0, 80.0, 30.0),
                Obstacle::steel(470.0, 420.0, 80.0, 30.0),
            ]),
        }
        obstacles
    }
}

/// Uniform sample in `[lo, hi)`, or `lo` when the span is empty
fn sample<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Try to place one enemy along the top edge or the upper flanks.
/// Gives up quietly when the level cap is reached or no safe point is found.
pub fn spawn_enemy(state: &mut GameState) -> Option<EntityId> {
    let config = Arc::clone(&state.config);
    let level = state.progress.current;
    let alive = state.enemies.iter().filter(|t| t.alive).count() as u32;
    if alive >= level.max_enemies {
        return None;
    }

    let size = state.arena_size();
    let midline = size.y / 2.0;
    let eagle_zone = Rect::new(state.eagle.pos.x - 120.0, state.eagle.pos.y - 100.0, 240.0, 140.0);
    let players = state.living_players();
    let footprints: Vec<Rect> = state.living_tanks().map(Tank::bounds).collect();

    for _ in 0..config.enemy.spawn_attempts {
        let pos = match state.rng.random_range(0..3) {
            0 => Vec2::new(sample(&mut state.rng, 50.0, size.x - 50.0), 50.0),
            1 => Vec2::new(50.0, sample(&mut state.rng, 50.0, midline - 50.0)),
            _ => Vec2::new(size.x - 50.0, sample(&mut state.rng, 50.0, midline - 50.0)),
        };
        let footprint = Rect::centered(pos, TANK_WIDTH, TANK_HEIGHT);

        let safe = pos.y < midline
            && !eagle_zone.contains(pos)
            && !state.obstacles.iter().filter(|o| o.is_solid()).any(|o| {
                o.rect.center().distance(pos) < SPAWN_OBSTACLE_CLEARANCE || o.rect.overlaps(&footprint)
            })
            && !players.iter().any(|p| p.pos.distance(pos) < SPAWN_PLAYER_CLEARANCE)
            && !footprints.iter().any(|r| r.overlaps(&footprint));

        if safe {
            let id = state.next_entity_id();
            let tank = Tank::enemy(id, pos, &level, &config.enemy, &mut state.rng);
            state.enemies.push(tank);
            log::debug!("Enemy {} spawned at ({:.0}, {:.0})", id.0, pos.x, pos.y);
            return Some(id);
        }
    }
    log::debug!("No safe enemy spawn after {} attempts", config.enemy.spawn_attempts);
    None
}

/// Points paid for a kill by `method`
pub fn kill_points(config: &GameConfig, method: KillMethod) -> u64 {
    match method {
        KillMethod::Direct | KillMethod::Missile => config.scoring.per_kill,
        KillMethod::Explosion => config.scoring.per_explosion_kill,
        KillMethod::Thunder => config.scoring.per_thunder_kill,
    }
}

/// Credit an enemy kill to the team and to the player in `slot`
pub fn award_kill(state: &mut GameState, slot: PlayerSlot, method: KillMethod) {
    let points = kill_points(&state.config, method);
    state.progress.level_kills += 1;
    state.progress.total_kills += 1;
    state.progress.team_score += points;

    let record = &mut state.records[slot.index()];
    record.score += points;
    record.kills += 1;

    state.emit(GameEvent::EnemyKilled { by: slot, method, points });
    state.sound(SoundEffect::EnemyDestroy);
}

/// Grant one extra life per player whose score crossed a new threshold
pub fn check_life_rewards(state: &mut GameState) {
    let every = state.config.scoring.life_reward_every.max(1);
    let max_lives = state.config.player.max_lives;
    for slot in PlayerSlot::ALL {
        let record = &mut state.records[slot.index()];
        let reached = record.score / every;
        let rewarded = record.last_life_reward / every;
        if reached > rewarded && record.lives < max_lives {
            record.lives += 1;
            record.last_life_reward = record.score;
            log::info!("{slot:?} earned an extra life at {} points", record.score);
            state.emit(GameEvent::ExtraLife { slot });
        }
    }
}

/// Build the report for the level just played
fn level_report(state: &GameState, time_bonus: u64) -> LevelReport {
    let players = PlayerSlot::ALL.map(|slot| {
        let record = state.record(slot);
        PlayerReport { score: record.score, kills: record.kills, lives: record.lives }
    });
    LevelReport {
        level: state.progress.level,
        kills: state.progress.level_kills,
        kill_target: state.progress.kill_target(),
        elapsed: state.progress.level_elapsed,
        time_bonus,
        level_score: state.progress.team_score - state.progress.level_start_score,
        team_score: state.progress.team_score,
        eagle_health: state.eagle.health,
        players,
    }
}

/// Time bonus for finishing in `elapsed` seconds, floored at zero
pub fn time_bonus(config: &GameConfig, elapsed: f32) -> u64 {
    let remaining = config.scoring.target_level_time - elapsed;
    (remaining * config.scoring.time_bonus_per_second).max(0.0).floor() as u64
}

/// Leave `Playing` once the kill target is met. Returns true on transition.
pub fn check_level_complete(state: &mut GameState) -> bool {
    if state.phase != GamePhase::Playing || state.progress.level_kills < state.progress.kill_target() {
        return false;
    }
    let bonus = time_bonus(&state.config, state.progress.level_elapsed);
    state.progress.team_score += bonus;
    let report = level_report(state, bonus);
    state.sound(SoundEffect::LevelComplete);

    if state.progress.level < state.config.max_level {
        log::info!(
            "Level {} complete in {:.1}s, bonus {}",
            report.level,
            report.elapsed,
            report.time_bonus
        );
        state.phase = GamePhase::LevelComplete;
        state.emit(GameEvent::LevelComplete(report));
    } else {
        log::info!("Final level cleared, team score {}", report.team_score);
        state.phase = GamePhase::Victory;
        state.emit(GameEvent::Music(None));
        state.emit(GameEvent::Victory(report));
    }
    true
}

/// Advance from `LevelComplete` into the next level: clear transient
/// entities, lay out a fresh map, and send both players back to base
pub fn next_level(state: &mut GameState) {
    if state.phase != GamePhase::LevelComplete {
        return;
    }
    let config = Arc::clone(&state.config);

    state.progress.level += 1;
    state.progress.level_kills = 0;
    state.progress.level_elapsed = 0.0;
    state.progress.level_start_score = state.progress.team_score;
    state.progress.current = config.level(state.progress.level);

    state.enemies.clear();
    state.bullets.clear();
    state.missiles.clear();
    state.power_ups.clear();
    state.eagle_shield = None;
    state.enemy_spawn_timer = 0.0;
    state.power_up_timer = 0.0;

    let layout = ObstacleLayout::random(&mut state.rng);
    state.obstacles = layout.build(&config, state.eagle.pos);

    for slot in PlayerSlot::ALL {
        // A tank that died on the completing frame comes back free of charge
        if state.player(slot).is_some_and(|tank| !tank.alive) {
            state.deploy_player(slot);
            state.records[slot.index()].respawn_timer = None;
            continue;
        }
        let spawn = state.spawn_point(slot);
        if let Some(tank) = state.player_mut(slot) {
            tank.pos = spawn;
            tank.velocity = Vec2::ZERO;
            tank.health = tank.max_health;
            tank.invulnerable = config.player.invulnerability;
            tank.reset_all_effects();
        }
    }

    state.phase = GamePhase::Playing;
    log::info!(
        "Level {} started with {:?} layout, target {} kills",
        state.progress.level,
        layout,
        state.progress.kill_target()
    );
}

/// Give one of `from`'s lives to the partner. Needs more than one life to
/// give and room under the cap on the receiving side.
pub fn transfer_life(state: &mut GameState, from: PlayerSlot) -> bool {
    let to = from.partner();
    let max_lives = state.config.player.max_lives;
    let (giver, receiver) = (state.records[from.index()].lives, state.records[to.index()].lives);
    if giver <= 1 || receiver >= max_lives {
        log::debug!("Life transfer {from:?} -> {to:?} refused ({giver} -> {receiver})");
        return false;
    }
    state.records[from.index()].lives -= 1;
    state.records[to.index()].lives += 1;
    state.sound(SoundEffect::LifeTransfer);
    state.emit(GameEvent::LifeTransferred { from, to });
    log::info!("{from:?} gave a life to {to:?}");
    true
}

/// Schedule respawns for empty slots with lives left, count them down, and
/// deploy a fresh tank (consuming a life) when one lapses
pub fn tick_respawns(state: &mut GameState, dt: f32) {
    let delay = state.config.player.respawn_delay;
    for slot in PlayerSlot::ALL {
        let i = slot.index();
        if state.players[i].is_some() {
            continue;
        }
        let record = &mut state.records[i];
        let Some(timer) = record.respawn_timer.or((record.lives > 0).then_some(delay)) else {
            continue;
        };
        let timer = timer - dt;
        if timer > 0.0 {
            record.respawn_timer = Some(timer);
            continue;
        }
        record.respawn_timer = None;
        if record.lives == 0 {
            continue;
        }
        record.lives -= 1;
        let lives = record.lives;
        state.deploy_player(slot);
        state.emit(GameEvent::PlayerRespawned { slot });
        log::info!("{slot:?} respawned, {lives} lives left");
    }
}

/// Enter `GameOver` when the eagle falls or nobody is left to fight
pub fn check_game_over(state: &mut GameState) -> bool {
    if !matches!(state.phase, GamePhase::Playing) {
        return false;
    }
    let reason = if state.eagle.destroyed {
        GameOverReason::EagleDestroyed
    } else if state.living_players().is_empty() && state.records.iter().all(|r| r.lives == 0) {
        GameOverReason::AllPlayersDefeated
    } else {
        return false;
    };
    state.phase = GamePhase::GameOver(reason);
    state.emit(GameEvent::Music(None));
    state.sound(SoundEffect::GameOver);
    state.emit(GameEvent::GameOver(reason));
    log::info!(
        "Game over ({reason:?}) on level {}, team score {}",
        state.progress.level,
        state.progress.team_score
    );
    true
}

/// Clamp every tank centre to the playable area
pub fn keep_tanks_in_bounds(state: &mut GameState) {
    let size = state.arena_size();
    let min = Vec2::splat(TANK_EDGE_MARGIN);
    let max = (size - min).max(min);
    for tank in state.players.iter_mut().flatten().chain(state.enemies.iter_mut()) {
        tank.pos = tank.pos.clamp(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_state() -> GameState {
        let mut state = GameState::new(21, Arc::new(GameConfig::default()));
        state.start();
        state.drain_events();
        state
    }

    #[test]
    fn test_every_layout_keeps_boundary_and_eagle_ring() {
        let config = GameConfig::default();
        let eagle = Vec2::new(400.0, 540.0);
        for layout in [ObstacleLayout::Opening].into_iter().chain(ObstacleLayout::PATTERNS) {
            let obstacles = layout.build(&config, eagle);
            let steel_walls = obstacles[..4].iter().filter(|o| !o.destructible).count();
            assert_eq!(steel_walls, 4, "{layout:?}");
            let ring = obstacles[4..15].iter().filter(|o| o.destructible).count();
            assert_eq!(ring, 11, "{layout:?}");
            assert!(obstacles.len() > 15);
        }
    }

    #[test]
    fn test_layouts_leave_player_spawns_clear() {
        let config = GameConfig::default();
        let state = GameState::new(1, Arc::new(config.clone()));
        for layout in [ObstacleLayout::Opening].into_iter().chain(ObstacleLayout::PATTERNS) {
            let obstacles = layout.build(&config, state.eagle.pos);
            for slot in PlayerSlot::ALL {
                let footprint = Rect::centered(state.spawn_point(slot), TANK_WIDTH, TANK_HEIGHT);
                assert!(!obstacles.iter().any(|o| o.rect.overlaps(&footprint)), "{layout:?} {slot:?}");
            }
        }
    }

    #[test]
    fn test_spawned_enemies_stay_in_upper_half() {
        let mut state = playing_state();
        for _ in 0..20 {
            spawn_enemy(&mut state);
        }
        assert!(state.enemies.len() <= state.progress.current.max_enemies as usize);
        for enemy in &state.enemies {
            assert!(enemy.pos.y < 300.0);
            for player in state.living_players() {
                assert!(enemy.pos.distance(player.pos) >= 80.0);
            }
        }
    }

    #[test]
    fn test_spawn_respects_enemy_cap() {
        let mut state = playing_state();
        state.progress.current.max_enemies = 1;
        assert_eq!(state.enemies.len(), 1);
        assert!(spawn_enemy(&mut state).is_none());
    }

    #[test]
    fn test_award_kill_scores_team_and_player() {
        let mut state = playing_state();
        award_kill(&mut state, PlayerSlot::Two, KillMethod::Explosion);
        assert_eq!(state.progress.team_score, 800);
        assert_eq!(state.records[1].score, 800);
        assert_eq!(state.records[1].kills, 1);
        assert_eq!(state.progress.level_kills, 1);
        assert!(state.events.contains(&GameEvent::EnemyKilled {
            by: PlayerSlot::Two,
            method: KillMethod::Explosion,
            points: 800,
        }));
    }

    #[test]
    fn test_life_reward_once_per_threshold() {
        let mut state = playing_state();
        state.records[0].score = 20_500;
        check_life_rewards(&mut state);
        assert_eq!(state.records[0].lives, 4);
        check_life_rewards(&mut state);
        assert_eq!(state.records[0].lives, 4);

        state.records[0].score = 40_000;
        check_life_rewards(&mut state);
        assert_eq!(state.records[0].lives, 5);
        assert_eq!(state.records[1].lives, 3);
    }

    #[test]
    fn test_life_reward_respects_cap() {
        let mut state = playing_state();
        state.records[0].lives = 9;
        state.records[0].score = 25_000;
        check_life_rewards(&mut state);
        assert_eq!(state.records[0].lives, 9);
    }

    #[test]
    fn test_time_bonus_floors_at_zero() {
        let config = GameConfig::default();
        assert_eq!(time_bonus(&config, 120.0), 6000);
        assert_eq!(time_bonus(&config, 179.995), 0);
        assert_eq!(time_bonus(&config, 400.0), 0);
    }

    #[test]
    fn test_level_completion_and_next_level() {
        let mut state = playing_state();
        state.progress.level_kills = 59;
        state.progress.level_elapsed = 100.0;
        assert!(!check_level_complete(&mut state));

        award_kill(&mut state, PlayerSlot::One, KillMethod::Direct);
        assert!(check_level_complete(&mut state));
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert_eq!(state.progress.team_score, 500 + 8000);
        let report = state.events.iter().find_map(|e| match e {
            GameEvent::LevelComplete(report) => Some(report.clone()),
            _ => None,
        });
        let report = report.unwrap();
        assert_eq!(report.time_bonus, 8000);
        assert_eq!(report.kills, 60);

        // Wound and displace a player, stash some transient entities
        if let Some(tank) = state.player_mut(PlayerSlot::One) {
            tank.health = 10;
            tank.pos = Vec2::new(100.0, 100.0);
            tank.add_thunder_bullet();
        }
        state.eagle_shield = Some(5.0);
        let old_obstacles = state.obstacles.len();

        next_level(&mut state);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.progress.level, 2);
        assert_eq!(state.progress.level_kills, 0);
        assert_eq!(state.progress.current.max_enemies, 4);
        assert!(state.enemies.is_empty() && state.bullets.is_empty() && state.power_ups.is_empty());
        assert!(!state.shield_active());
        assert_ne!(state.obstacles.len(), old_obstacles);

        let tank = state.player(PlayerSlot::One).unwrap();
        assert_eq!(tank.pos, state.spawn_point(PlayerSlot::One));
        assert_eq!(tank.health, tank.max_health);
        assert!(tank.is_invulnerable());
        assert_eq!(tank.effects, Default::default());
        // Personal totals carry over
        assert_eq!(state.records[0].score, 500);
    }

    #[test]
    fn test_next_level_revives_player_killed_on_completing_frame() {
        let mut state = playing_state();
        if let Some(tank) = state.player_mut(PlayerSlot::One) {
            tank.invulnerable = 0.0;
            assert!(tank.take_damage(tank.max_health));
            assert!(!tank.alive);
        }
        state.progress.level_kills = state.progress.kill_target();
        assert!(check_level_complete(&mut state));
        next_level(&mut state);

        let tank = state.player(PlayerSlot::One).unwrap();
        assert!(tank.alive);
        assert_eq!(tank.health, tank.max_health);
        assert_eq!(tank.pos, state.spawn_point(PlayerSlot::One));
        assert_eq!(state.records[0].lives, 3);

        // Nothing left for the respawn path to charge for
        for _ in 0..200 {
            tick_respawns(&mut state, 1.0 / 60.0);
        }
        assert_eq!(state.records[0].lives, 3);
        assert!(state.player(PlayerSlot::One).is_some_and(|t| t.alive));
    }

    #[test]
    fn test_final_level_is_victory() {
        let mut state = playing_state();
        state.progress.level = 8;
        state.progress.current = state.config.level(8);
        state.progress.level_kills = state.progress.kill_target();
        assert!(check_level_complete(&mut state));
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::Victory(_))));
    }

    #[test]
    fn test_transfer_life_rules() {
        let mut state = playing_state();
        assert!(transfer_life(&mut state, PlayerSlot::One));
        assert_eq!((state.records[0].lives, state.records[1].lives), (2, 4));

        state.records[0].lives = 1;
        assert!(!transfer_life(&mut state, PlayerSlot::One));

        state.records[0].lives = 5;
        state.records[1].lives = 9;
        assert!(!transfer_life(&mut state, PlayerSlot::One));
        assert!(state.events.contains(&GameEvent::Sound(SoundEffect::LifeTransfer)));
    }

    #[test]
    fn test_respawn_after_delay_consumes_life() {
        let mut state = playing_state();
        state.players[0] = None;
        tick_respawns(&mut state, 1.0);
        assert!(state.player(PlayerSlot::One).is_none());
        assert_eq!(state.records[0].respawn_timer, Some(1.0));

        tick_respawns(&mut state, 1.0);
        let tank = state.player(PlayerSlot::One).unwrap();
        assert!(tank.is_invulnerable());
        assert_eq!(tank.pos, state.spawn_point(PlayerSlot::One));
        assert_eq!(state.records[0].lives, 2);
        assert!(state.events.contains(&GameEvent::PlayerRespawned { slot: PlayerSlot::One }));
    }

    #[test]
    fn test_no_respawn_without_lives() {
        let mut state = playing_state();
        state.players[1] = None;
        state.records[1].lives = 0;
        for _ in 0..5 {
            tick_respawns(&mut state, 1.0);
        }
        assert!(state.player(PlayerSlot::Two).is_none());
        assert_eq!(state.records[1].respawn_timer, None);
    }

    #[test]
    fn test_game_over_when_eagle_falls() {
        let mut state = playing_state();
        state.eagle.destroyed = true;
        assert!(check_game_over(&mut state));
        assert_eq!(state.phase, GamePhase::GameOver(GameOverReason::EagleDestroyed));
        assert!(state.events.contains(&GameEvent::Music(None)));
    }

    #[test]
    fn test_game_over_needs_both_players_out() {
        let mut state = playing_state();
        state.players[0] = None;
        state.records[0].lives = 0;
        assert!(!check_game_over(&mut state));

        state.players[1] = None;
        assert!(!check_game_over(&mut state));
        state.records[1].lives = 0;
        assert!(check_game_over(&mut state));
        assert_eq!(state.phase, GamePhase::GameOver(GameOverReason::AllPlayersDefeated));
    }

    #[test]
    fn test_keep_tanks_in_bounds() {
        let mut state = playing_state();
        if let Some(tank) = state.player_mut(PlayerSlot::One) {
            tank.pos = Vec2::new(-50.0, 900.0);
        }
        keep_tanks_in_bounds(&mut state);
        assert_eq!(state.player(PlayerSlot::One).unwrap().pos, Vec2::new(20.0, 580.0));
    }
}
