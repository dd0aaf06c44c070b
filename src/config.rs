//! Data-driven game balance
//!
//! `GameConfig` is built once at startup and is always fully populated:
//! every section carries `#[serde(default)]`, so a partial JSON document only
//! overrides the fields it names. When no configuration can be loaded at all,
//! [`GameConfig::resolve`] substitutes the defaults and logs a warning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Supplies the game configuration at startup
pub trait ConfigProvider {
    fn load(&self) -> Result<GameConfig>;
}

/// Built-in balance, no external source
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl ConfigProvider for DefaultConfig {
    fn load(&self) -> Result<GameConfig> {
        Ok(GameConfig::default())
    }
}

/// Configuration from an in-memory JSON document
#[derive(Debug, Clone)]
pub struct JsonConfig {
    source: String,
}

impl JsonConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }
}

impl ConfigProvider for JsonConfig {
    fn load(&self) -> Result<GameConfig> {
        Ok(serde_json::from_str(&self.source)?)
    }
}

/// Configuration from a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigProvider for FileConfig {
    fn load(&self) -> Result<GameConfig> {
        let text = std::fs::read_to_string(&self.path)?;
        JsonConfig::new(text).load()
    }
}

/// Per-level difficulty row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Seconds between enemy spawn attempts
    pub enemy_spawn_interval: f32,
    /// Maximum enemies alive at once
    pub max_enemies: u32,
    pub enemy_speed: f32,
    pub enemy_health: i32,
    /// Seconds between enemy shots
    pub enemy_shoot_interval: f32,
    /// Seconds between power-up spawns
    pub power_up_frequency: f32,
    /// Kills needed to clear the level
    pub kill_target: u32,
}

impl LevelConfig {
    const fn row(
        enemy_spawn_interval: f32,
        max_enemies: u32,
        enemy_speed: f32,
        enemy_health: i32,
        enemy_shoot_interval: f32,
        power_up_frequency: f32,
        kill_target: u32,
    ) -> Self {
        Self {
            enemy_spawn_interval,
            max_enemies,
            enemy_speed,
            enemy_health,
            enemy_shoot_interval,
            power_up_frequency,
            kill_target,
        }
    }
}

fn default_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig::row(2.0, 3, 50.0, 25, 2.0, 10.0, 60),
        LevelConfig::row(1.8, 4, 60.0, 30, 1.8, 9.0, 78),
        LevelConfig::row(1.5, 5, 70.0, 35, 1.5, 8.0, 101),
        LevelConfig::row(1.3, 6, 80.0, 40, 1.3, 8.0, 131),
        LevelConfig::row(1.0, 7, 90.0, 45, 1.0, 7.0, 170),
        LevelConfig::row(0.8, 8, 100.0, 50, 0.8, 7.0, 221),
        LevelConfig::row(0.6, 10, 110.0, 55, 0.6, 6.0, 287),
        LevelConfig::row(0.5, 12, 120.0, 60, 0.5, 6.0, 373),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    pub speed: f32,
    /// Speed while a bullet-speed boost is active
    pub accelerated_speed: f32,
    pub radius: f32,
    /// Seconds before a bullet expires
    pub life: f32,
    /// Damage of a direct hit on a tank or obstacle
    pub damage: i32,
    pub explosion_radius: f32,
    /// Ricochets a thunder bullet may perform
    pub max_bounces: u32,
    /// Whether player bullets damage the other player
    pub friendly_fire: bool,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            speed: 300.0,
            accelerated_speed: 450.0,
            radius: 3.0,
            life: 3.0,
            damage: 25,
            explosion_radius: 80.0,
            max_bounces: 3,
            friendly_fire: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostEffect {
    pub multiplier: f32,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosiveEffect {
    /// Damage at the epicentre, halved at the blast edge
    pub damage: i32,
    pub duration: f32,
    /// Kills a single blast may produce
    pub max_kills: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadShot {
    pub bullets: u32,
    /// Radians between neighbouring pellets
    pub spread: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThunderEffect {
    pub range: f32,
    pub damage: i32,
    pub max_targets: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainEffect {
    pub directions: u32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissileRefill {
    pub amount: u32,
    pub max_capacity: u32,
}

/// Power-up spawning and the magnitude of each effect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    pub max_active: usize,
    /// Seconds before an uncollected power-up disappears
    pub lifetime: f32,
    pub radius: f32,
    /// Keep-clear distance from obstacles at the spawn point
    pub spawn_margin: f32,
    pub heal_amount: i32,
    pub speed: BoostEffect,
    pub explosive: ExplosiveEffect,
    pub invincible_duration: f32,
    pub shotgun: SpreadShot,
    /// Seconds of shotgun fire; the mega shotgun never lapses
    pub shotgun_duration: f32,
    pub mega_shotgun: SpreadShot,
    pub thunder: ThunderEffect,
    pub eagle_shield_duration: f32,
    pub chain: ChainEffect,
    /// Seconds of accelerated bullets
    pub bullet_speed_duration: f32,
    pub stray_missiles: MissileRefill,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            max_active: 3,
            lifetime: 30.0,
            radius: 15.0,
            spawn_margin: 20.0,
            heal_amount: 50,
            speed: BoostEffect { multiplier: 1.5, duration: 10.0 },
            explosive: ExplosiveEffect { damage: 80, duration: 15.0, max_kills: 3 },
            invincible_duration: 8.0,
            shotgun: SpreadShot { bullets: 3, spread: 0.3 },
            shotgun_duration: 20.0,
            mega_shotgun: SpreadShot { bullets: 7, spread: 0.4 },
            thunder: ThunderEffect { range: 120.0, damage: 35, max_targets: 3 },
            eagle_shield_duration: 15.0,
            chain: ChainEffect { directions: 4, speed: 250.0 },
            bullet_speed_duration: 20.0,
            stray_missiles: MissileRefill { amount: 5, max_capacity: 15 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub detection_range: f32,
    /// Seconds a wandering enemy holds its heading
    pub direction_change_interval: f32,
    pub ammo: u32,
    pub spawn_attempts: u32,
    /// Used when the level row is missing
    pub fallback_speed: f32,
    pub fallback_health: i32,
    pub fallback_shoot_interval: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            detection_range: 200.0,
            direction_change_interval: 3.0,
            ammo: 50,
            spawn_attempts: 50,
            fallback_speed: 50.0,
            fallback_health: 25,
            fallback_shoot_interval: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: i32,
    pub speed: f32,
    pub start_lives: u32,
    pub max_lives: u32,
    /// Spawn protection in seconds
    pub invulnerability: f32,
    pub shoot_cooldown: f32,
    pub respawn_delay: f32,
    pub start_missiles: u32,
    pub missile_capacity: u32,
    pub missile_cooldown: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            speed: 100.0,
            start_lives: 3,
            max_lives: 9,
            invulnerability: 3.0,
            shoot_cooldown: 0.3,
            respawn_delay: 2.0,
            start_missiles: 10,
            missile_capacity: 10,
            missile_cooldown: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EagleConfig {
    pub max_health: i32,
    pub size: f32,
}

impl Default for EagleConfig {
    fn default() -> Self {
        Self { max_health: 3, size: 40.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub destructible_health: i32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self { destructible_health: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissileConfig {
    pub speed: f32,
    /// Base turn rate in radians per second
    pub turn_rate: f32,
    pub damage: i32,
    pub radius: f32,
    pub life: f32,
    pub lock_radius: f32,
    /// Missiles are discarded this far outside the arena
    pub bounds_margin: f32,
    /// Fraction of the flight time used to lead a moving target
    pub lead_factor: f32,
    /// Below this distance the turn rate ramps up, doubling at zero range
    pub close_range: f32,
}

impl Default for MissileConfig {
    fn default() -> Self {
        Self {
            speed: 250.0,
            turn_rate: 5.0,
            damage: 40,
            radius: 5.0,
            life: 10.0,
            lock_radius: 400.0,
            bounds_margin: 50.0,
            lead_factor: 0.5,
            close_range: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub per_kill: u64,
    pub per_explosion_kill: u64,
    pub per_thunder_kill: u64,
    /// Extra life every this many personal points
    pub life_reward_every: u64,
    /// Seconds; finishing faster earns a time bonus
    pub target_level_time: f32,
    pub time_bonus_per_second: f32,
    /// Kill target for levels beyond the table
    pub fallback_kill_target: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            per_kill: 500,
            per_explosion_kill: 800,
            per_thunder_kill: 500,
            life_reward_every: 20_000,
            target_level_time: 180.0,
            time_bonus_per_second: 100.0,
            fallback_kill_target: 250,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub map: MapConfig,
    pub bullet: BulletConfig,
    /// Difficulty table, index 0 is level 1
    pub levels: Vec<LevelConfig>,
    pub max_level: u32,
    pub power_ups: PowerUpConfig,
    pub enemy: EnemyConfig,
    pub player: PlayerConfig,
    pub eagle: EagleConfig,
    pub obstacle: ObstacleConfig,
    pub missile: MissileConfig,
    pub scoring: ScoringConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            bullet: BulletConfig::default(),
            levels: default_levels(),
            max_level: 8,
            power_ups: PowerUpConfig::default(),
            enemy: EnemyConfig::default(),
            player: PlayerConfig::default(),
            eagle: EagleConfig::default(),
            obstacle: ObstacleConfig::default(),
            missile: MissileConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load from a provider, falling back to the built-in balance on failure
    pub fn resolve(provider: &dyn ConfigProvider) -> Self {
        match provider.load() {
            Ok(config) => {
                log::info!("Loaded game configuration ({} levels)", config.levels.len());
                config
            }
            Err(err) => {
                log::warn!("Using default game configuration: {err}");
                Self::default()
            }
        }
    }

    /// Difficulty row for a 1-based level, derived from formulas when the table has no entry
    pub fn level(&self, level: u32) -> LevelConfig {
        let row = level
            .checked_sub(1)
            .and_then(|i| self.levels.get(i as usize));
        if let Some(row) = row {
            return *row;
        }

        let step = level.saturating_sub(1) as f32;
        LevelConfig {
            enemy_spawn_interval: (2.0 - step * 0.2).max(0.5),
            max_enemies: (3 + level.saturating_sub(1)).min(12),
            enemy_speed: self.enemy.fallback_speed,
            enemy_health: self.enemy.fallback_health,
            enemy_shoot_interval: self.enemy.fallback_shoot_interval,
            power_up_frequency: (10.0 - step).max(6.0),
            kill_target: self.scoring.fallback_kill_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_table_lookup() {
        let config = GameConfig::default();
        assert_eq!(config.level(1).kill_target, 60);
        assert_eq!(config.level(8).max_enemies, 12);
        assert_eq!(config.level(5).enemy_health, 45);
    }

    #[test]
    fn test_level_fallback_formulas() {
        let config = GameConfig::default();
        let beyond = config.level(12);
        assert_eq!(beyond.kill_target, 250);
        assert_eq!(beyond.max_enemies, 12);
        assert!((beyond.enemy_spawn_interval - 0.5).abs() < 1e-6);
        assert!((beyond.power_up_frequency - 6.0).abs() < 1e-6);

        let empty = GameConfig { levels: Vec::new(), ..GameConfig::default() };
        let l2 = empty.level(2);
        assert_eq!(l2.max_enemies, 4);
        assert!((l2.enemy_spawn_interval - 1.8).abs() < 1e-6);
        assert!((l2.power_up_frequency - 9.0).abs() < 1e-6);
        assert_eq!(l2.enemy_health, 25);
    }

    #[test]
    fn test_level_zero_uses_fallback() {
        let config = GameConfig::default();
        assert_eq!(config.level(0).max_enemies, 3);
    }

    #[test]
    fn test_partial_json_overlays_defaults() {
        let config = GameConfig::resolve(&JsonConfig::new(
            r#"{ "bullet": { "friendly_fire": true }, "player": { "start_lives": 5 } }"#,
        ));
        assert!(config.bullet.friendly_fire);
        assert_eq!(config.player.start_lives, 5);
        // Untouched fields keep their defaults
        assert_eq!(config.bullet.damage, 25);
        assert_eq!(config.player.max_lives, 9);
        assert_eq!(config.levels.len(), 8);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let config = GameConfig::resolve(&JsonConfig::new("{ not json"));
        assert_eq!(config.max_level, 8);
        assert_eq!(config.scoring.per_kill, 500);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = GameConfig::resolve(&FileConfig::new("/nonexistent/tank-defense.json"));
        assert_eq!(config.map.width, 800.0);
    }

    #[test]
    fn test_default_round_trips_through_json() {
        let json = serde_json::to_string(&GameConfig::default()).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.levels, default_levels());
        assert_eq!(back.power_ups.mega_shotgun.bullets, 7);
    }
}
