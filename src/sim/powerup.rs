//! Power-ups: corner spawning, lifetime, pickup and effect application

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::state::{GameState, PlayerSlot};
use crate::audio::SoundEffect;
use crate::config::PowerUpConfig;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Health,
    Speed,
    Explosive,
    Invincible,
    Shotgun,
    Life,
    Thunder,
    EagleShield,
    ChainBullet,
    MegaShotgun,
    BulletSpeed,
    StrayMissiles,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 12] = [
        PowerUpKind::Health,
        PowerUpKind::Speed,
        PowerUpKind::Explosive,
        PowerUpKind::Invincible,
        PowerUpKind::Shotgun,
        PowerUpKind::Life,
        PowerUpKind::Thunder,
        PowerUpKind::EagleShield,
        PowerUpKind::ChainBullet,
        PowerUpKind::MegaShotgun,
        PowerUpKind::BulletSpeed,
        PowerUpKind::StrayMissiles,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Sound played on pickup
    pub fn pickup_sound(self) -> SoundEffect {
        match self {
            PowerUpKind::Health | PowerUpKind::Life => SoundEffect::HealthPickup,
            PowerUpKind::Invincible | PowerUpKind::EagleShield => SoundEffect::Shield,
            PowerUpKind::Speed => SoundEffect::PowerUp,
            _ => SoundEffect::WeaponPickup,
        }
    }
}

/// A pickup lying on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub kind: PowerUpKind,
    pub radius: f32,
    /// Seconds until it vanishes
    pub life: f32,
    pub collected: bool,
}

impl PowerUp {
    pub fn new(pos: Vec2, kind: PowerUpKind, config: &PowerUpConfig) -> Self {
        Self { pos, kind, radius: config.radius, life: config.lifetime, collected: false }
    }

    /// Age the pickup. Returns false once it should be removed.
    pub fn update(&mut self, dt: f32) -> bool {
        self.life -= dt;
        !self.collected && self.life > 0.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }
}

/// The four fixed spawn points, one per corner
pub fn spawn_corners(arena: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(50.0, 50.0),
        Vec2::new(arena.x - 50.0, 50.0),
        Vec2::new(50.0, arena.y - 100.0),
        Vec2::new(arena.x - 50.0, arena.y - 100.0),
    ]
}

/// Drop a random power-up on a random corner. The spawn is skipped when the
/// map is full or the chosen corner sits against an obstacle.
pub fn spawn(state: &mut GameState) {
    let config = Arc::clone(&state.config);
    if state.power_ups.len() >= config.power_ups.max_active {
        return;
    }
    let corners = spawn_corners(state.arena_size());
    let corner = corners[state.rng.random_range(0..corners.len())];
    let kind = PowerUpKind::random(&mut state.rng);

    let blocked = state
        .obstacles
        .iter()
        .any(|o| o.is_solid() && o.rect.inflate(config.power_ups.spawn_margin).contains(corner));
    if blocked {
        log::debug!("Power-up spawn at {corner} blocked");
        return;
    }
    log::debug!("Power-up {kind:?} spawned at {corner}");
    state.power_ups.push(PowerUp::new(corner, kind, &config.power_ups));
}

/// Age pickups, drop expired ones, and hand the rest to any living player
/// touching them (player one checked first)
pub fn update_and_collect(state: &mut GameState, dt: f32) {
    let touching: Vec<(PlayerSlot, Rect)> = state
        .players
        .iter()
        .flatten()
        .filter(|t| t.alive)
        .filter_map(|t| t.slot().map(|slot| (slot, t.bounds())))
        .collect();

    let mut collected = Vec::new();
    state.power_ups.retain_mut(|power_up| {
        if !power_up.update(dt) {
            return false;
        }
        let bounds = power_up.bounds();
        match touching.iter().find(|(_, rect)| rect.overlaps(&bounds)) {
            Some((slot, _)) => {
                power_up.collected = true;
                collected.push((*slot, power_up.kind));
                false
            }
            None => true,
        }
    });

    for (slot, kind) in collected {
        apply(state, slot, kind);
    }
}

/// Apply a power-up's effect on behalf of `slot`
pub fn apply(state: &mut GameState, slot: PlayerSlot, kind: PowerUpKind) {
    let config = Arc::clone(&state.config);
    let effects = &config.power_ups;
    let tank = state.players[slot.index()].as_mut();

    match (kind, tank) {
        (PowerUpKind::Life, _) => {
            let record = &mut state.records[slot.index()];
            if record.lives < config.player.max_lives {
                record.lives += 1;
            }
        }
        (PowerUpKind::EagleShield, _) => {
            state.eagle_shield = Some(effects.eagle_shield_duration);
            log::info!("Eagle shield up for {}s", effects.eagle_shield_duration);
        }
        (_, None) => return,
        (PowerUpKind::Health, Some(tank)) => tank.heal(effects.heal_amount),
        (PowerUpKind::Speed, Some(tank)) => {
            tank.add_speed_boost(effects.speed.multiplier, effects.speed.duration)
        }
        (PowerUpKind::Explosive, Some(tank)) => tank.add_explosive_ammo(effects.explosive.duration),
        (PowerUpKind::Invincible, Some(tank)) => tank.add_invincibility(effects.invincible_duration),
        (PowerUpKind::Shotgun, Some(tank)) => tank.add_shotgun_ammo(effects.shotgun_duration),
        (PowerUpKind::Thunder, Some(tank)) => tank.add_thunder_bullet(),
        (PowerUpKind::ChainBullet, Some(tank)) => tank.add_chain_bullet(),
        (PowerUpKind::MegaShotgun, Some(tank)) => tank.add_mega_shotgun(),
        (PowerUpKind::BulletSpeed, Some(tank)) => tank.add_bullet_speed_boost(effects.bullet_speed_duration),
        (PowerUpKind::StrayMissiles, Some(tank)) => {
            tank.add_stray_missiles(effects.stray_missiles.amount, effects.stray_missiles.max_capacity)
        }
    }
    state.sound(kind.pickup_sound());
}
