//! Game state and core simulation types
//!
//! `GameState` owns every entity collection. Tanks are referenced by
//! [`EntityId`] only; a dead or removed tank is simply not found by
//! [`GameState::tank`].

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Eagle, Obstacle};
use super::bullet::Bullet;
use super::level::{self, LevelReport, ObstacleLayout, Progress};
use super::missile::StrayMissile;
use super::powerup::PowerUp;
use super::rect::Rect;
use super::tank::Tank;
use crate::audio::{MusicTrack, SoundEffect};
use crate::config::GameConfig;
use crate::consts::*;

/// Stable identifier for a tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Which controller a player tank answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::One, PlayerSlot::Two];

    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    pub fn partner(self) -> PlayerSlot {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

/// Side a tank fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankRole {
    Player(PlayerSlot),
    Enemy,
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: EntityId,
    pub role: TankRole,
}

impl Owner {
    pub fn is_player(&self) -> bool {
        matches!(self.role, TankRole::Player(_))
    }

    pub fn slot(&self) -> Option<PlayerSlot> {
        match self.role {
            TankRole::Player(slot) => Some(slot),
            TankRole::Enemy => None,
        }
    }
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    EagleDestroyed,
    AllPlayersDefeated,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Map laid out, waiting for the start signal
    Menu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Kill target reached, waiting to continue
    LevelComplete,
    /// Run ended
    GameOver(GameOverReason),
    /// Final level cleared
    Victory,
}

impl GamePhase {
    /// The run is over and no input will change that
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver(_) | GamePhase::Victory)
    }
}

/// How an enemy was destroyed (each pays its own score)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillMethod {
    Direct,
    Missile,
    Explosion,
    Thunder,
}

/// Events emitted by the simulation for the outer layer (audio, haptics, UI)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundEffect),
    /// `Some` starts a track, `None` stops music
    Music(Option<MusicTrack>),
    PlayerDamaged {
        slot: PlayerSlot,
        amount: i32,
        max_health: i32,
        fatal: bool,
    },
    PlayerRespawned {
        slot: PlayerSlot,
    },
    EnemyKilled {
        by: PlayerSlot,
        method: KillMethod,
        points: u64,
    },
    ExtraLife {
        slot: PlayerSlot,
    },
    LifeTransferred {
        from: PlayerSlot,
        to: PlayerSlot,
    },
    LevelComplete(LevelReport),
    Victory(LevelReport),
    GameOver(GameOverReason),
}

/// Per-player bookkeeping that survives the player's tank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub lives: u32,
    pub score: u64,
    pub kills: u32,
    /// Score at which the last extra life was granted
    pub last_life_reward: u64,
    /// Seconds until the next tank is deployed
    pub respawn_timer: Option<f32>,
}

/// Position and velocity of a living tank, captured before a pass that
/// needs to look at tanks while one of them is being mutated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: EntityId,
    pub pos: Vec2,
    pub velocity: Vec2,
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub config: Arc<GameConfig>,
    /// Current phase
    pub phase: GamePhase,
    /// Simulated seconds spent in `Playing`
    pub time: f32,
    /// Player tanks, `None` while dead or awaiting respawn
    pub players: [Option<Tank>; 2],
    pub records: [PlayerRecord; 2],
    /// Enemy tanks (sorted by id for determinism)
    pub enemies: Vec<Tank>,
    pub obstacles: Vec<Obstacle>,
    pub eagle: Eagle,
    /// Remaining seconds of the eagle shield
    pub eagle_shield: Option<f32>,
    pub bullets: Vec<Bullet>,
    pub missiles: Vec<StrayMissile>,
    pub power_ups: Vec<PowerUp>,
    pub progress: Progress,
    pub enemy_spawn_timer: f32,
    pub power_up_timer: f32,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game in the menu phase with the opening map laid out
    pub fn new(seed: u64, config: Arc<GameConfig>) -> Self {
        let eagle = Eagle::new(
            Vec2::new(config.map.width / 2.0, config.map.height - EAGLE_BOTTOM_OFFSET),
            &config.eagle,
        );
        let obstacles = ObstacleLayout::Opening.build(&config, eagle.pos);
        let progress = Progress::new(1, &config);
        let lives = config.player.start_lives;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            time: 0.0,
            players: [None, None],
            records: [
                PlayerRecord { lives, ..PlayerRecord::default() },
                PlayerRecord { lives, ..PlayerRecord::default() },
            ],
            enemies: Vec::new(),
            obstacles,
            eagle,
            eagle_shield: None,
            bullets: Vec::new(),
            missiles: Vec::new(),
            power_ups: Vec::new(),
            progress,
            enemy_spawn_timer: 0.0,
            power_up_timer: 0.0,
            events: Vec::new(),
            next_id: 1,
            config,
        }
    }

    /// Deploy both players and the first enemy, start the battle music
    pub fn start(&mut self) {
        if self.phase != GamePhase::Menu {
            return;
        }
        for slot in PlayerSlot::ALL {
            self.deploy_player(slot);
        }
        level::spawn_enemy(self);
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::Music(Some(MusicTrack::Battle)));
        log::info!("Game started (seed {}), level {}", self.seed, self.progress.level);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    pub fn arena_size(&self) -> Vec2 {
        Vec2::new(self.config.map.width, self.config.map.height)
    }

    pub fn arena(&self) -> Rect {
        Rect::new(0.0, 0.0, self.config.map.width, self.config.map.height)
    }

    pub fn player(&self, slot: PlayerSlot) -> Option<&Tank> {
        self.players[slot.index()].as_ref()
    }

    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut Tank> {
        self.players[slot.index()].as_mut()
    }

    pub fn record(&self, slot: PlayerSlot) -> &PlayerRecord {
        &self.records[slot.index()]
    }

    /// Registry lookup, `None` once the tank has been removed
    pub fn tank(&self, id: EntityId) -> Option<&Tank> {
        if let Some(tank) = self.players.iter().flatten().find(|t| t.id == id) {
            return Some(tank);
        }
        self.enemies
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.enemies[i])
    }

    pub fn tank_mut(&mut self, id: EntityId) -> Option<&mut Tank> {
        if let Some(tank) = self.players.iter_mut().flatten().find(|t| t.id == id) {
            return Some(tank);
        }
        match self.enemies.binary_search_by_key(&id, |t| t.id) {
            Ok(i) => Some(&mut self.enemies[i]),
            Err(_) => None,
        }
    }

    /// Living tanks in stable order: players by slot, then enemies by id
    pub fn living_tanks(&self) -> impl Iterator<Item = &Tank> {
        self.players
            .iter()
            .flatten()
            .chain(self.enemies.iter())
            .filter(|t| t.alive)
    }

    pub fn living_players(&self) -> Vec<Target> {
        self.players
            .iter()
            .flatten()
            .filter(|t| t.alive)
            .map(Tank::as_target)
            .collect()
    }

    pub fn living_enemies(&self) -> Vec<Target> {
        self.enemies
            .iter()
            .filter(|t| t.alive)
            .map(Tank::as_target)
            .collect()
    }

    pub fn shield_active(&self) -> bool {
        self.eagle_shield.is_some()
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, effect: SoundEffect) {
        self.events.push(GameEvent::Sound(effect));
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spawn point next to the eagle for a player
    pub fn spawn_point(&self, slot: PlayerSlot) -> Vec2 {
        let dx = match slot {
            PlayerSlot::One => -SPAWN_OFFSET_X,
            PlayerSlot::Two => SPAWN_OFFSET_X,
        };
        self.eagle.pos + Vec2::new(dx, SPAWN_OFFSET_Y)
    }

    /// Put a fresh tank for `slot` at its spawn point
    pub(crate) fn deploy_player(&mut self, slot: PlayerSlot) {
        let id = self.next_entity_id();
        let pos = self.spawn_point(slot);
        self.players[slot.index()] = Some(Tank::player(id, slot, pos, &self.config.player));
    }

    /// Ensure entity collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|t| t.id);
    }
}
