//! Tanks: movement, turret aim, firing, damage and timed status effects
//!
//! Player and enemy tanks share one type; the role decides whether `update`
//! reads a [`PlayerInput`] or runs the enemy AI.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai::{self, AiBrain, AiContext};
use super::arena::Obstacle;
use super::bullet::{Bullet, Payload};
use super::missile::{LAUNCH_OFFSETS, StrayMissile};
use super::rect::Rect;
use super::state::{EntityId, Owner, PlayerSlot, TankRole, Target};
use super::tick::{Aim, PlayerInput};
use crate::config::{EnemyConfig, GameConfig, LevelConfig, MissileConfig, PlayerConfig};
use crate::consts::*;
use crate::{angle_of, heading};

/// Special ammo mode; exactly one is active and the latest pickup wins
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PrimaryEffect {
    #[default]
    None,
    Explosive { remaining: f32 },
    Chain,
    Thunder,
}

/// Multi-pellet mode, independent of the primary effect
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ShotgunMode {
    #[default]
    None,
    Shotgun { remaining: f32 },
    MegaShotgun,
}

/// A timed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    pub multiplier: f32,
    pub remaining: f32,
}

/// Everything a pickup can change on a tank
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub speed: Option<Boost>,
    /// Seconds of accelerated bullets left
    pub bullet_speed: Option<f32>,
    pub primary: PrimaryEffect,
    pub shotgun: ShotgunMode,
}

impl StatusEffects {
    /// Count down every timed effect, dropping the ones that lapse
    pub fn tick(&mut self, dt: f32) {
        self.speed = self
            .speed
            .map(|b| Boost { remaining: b.remaining - dt, ..b })
            .filter(|b| b.remaining > 0.0);
        self.bullet_speed = self.bullet_speed.map(|t| t - dt).filter(|t| *t > 0.0);

        if let PrimaryEffect::Explosive { remaining } = self.primary {
            self.primary = if remaining - dt > 0.0 {
                PrimaryEffect::Explosive { remaining: remaining - dt }
            } else {
                PrimaryEffect::None
            };
        }
        if let ShotgunMode::Shotgun { remaining } = self.shotgun {
            self.shotgun = if remaining - dt > 0.0 {
                ShotgunMode::Shotgun { remaining: remaining - dt }
            } else {
                ShotgunMode::None
            };
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed.map_or(1.0, |b| b.multiplier)
    }

    /// Payload flags stamped onto each bullet
    pub fn payload(&self) -> Payload {
        Payload {
            explosive: matches!(self.primary, PrimaryEffect::Explosive { .. }),
            chain: self.primary == PrimaryEffect::Chain,
            thunder: self.primary == PrimaryEffect::Thunder,
        }
    }
}

/// Stray missile launcher (players only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissileRack {
    /// Volleys left; each volley fires three missiles
    pub count: u32,
    pub capacity: u32,
    pub cooldown: f32,
    pub since_launch: f32,
}

/// Footprint of a tank that movement must not overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub id: EntityId,
    pub rect: Rect,
}

/// What a moving tank can bump into
pub struct World<'a> {
    pub obstacles: &'a [Obstacle],
    pub tanks: &'a [Footprint],
}

impl World<'_> {
    /// Whether `rect` hits a solid obstacle or any tank other than `mover`
    pub fn blocked(&self, rect: &Rect, mover: EntityId) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.is_solid() && o.rect.overlaps(rect))
            || self
                .tanks
                .iter()
                .any(|t| t.id != mover && t.rect.overlaps(rect))
    }
}

/// Who drives a tank this frame
pub enum Control<'a> {
    Player(&'a PlayerInput),
    Ai(&'a AiContext<'a>),
}

#[derive(Debug, Clone)]
pub struct Tank {
    pub id: EntityId,
    pub role: TankRole,
    pub pos: Vec2,
    /// Displacement per second committed last frame (used for missile lead)
    pub velocity: Vec2,
    pub hull_angle: f32,
    pub turret_angle: f32,
    /// Base movement speed in units per second
    pub speed: f32,
    pub health: i32,
    pub max_health: i32,
    /// `None` means unlimited
    pub ammo: Option<u32>,
    pub shoot_cooldown: f32,
    /// Seconds since the last shot
    pub last_shot: f32,
    pub alive: bool,
    /// Seconds of spawn protection / invincibility left
    pub invulnerable: f32,
    /// Blink phase while invulnerable (render only)
    pub blink: f32,
    pub effects: StatusEffects,
    pub missiles: Option<MissileRack>,
    pub ai: Option<AiBrain>,
}

impl Tank {
    /// Fresh player tank with spawn protection
    pub fn player(id: EntityId, slot: PlayerSlot, pos: Vec2, config: &PlayerConfig) -> Self {
        Self {
            id,
            role: TankRole::Player(slot),
            pos,
            velocity: Vec2::ZERO,
            hull_angle: -FRAC_PI_2,
            turret_angle: -FRAC_PI_2,
            speed: config.speed,
            health: config.max_health,
            max_health: config.max_health,
            ammo: None,
            shoot_cooldown: config.shoot_cooldown,
            last_shot: config.shoot_cooldown,
            alive: true,
            invulnerable: config.invulnerability,
            blink: 0.0,
            effects: StatusEffects::default(),
            missiles: Some(MissileRack {
                count: config.start_missiles,
                capacity: config.missile_capacity,
                cooldown: config.missile_cooldown,
                since_launch: config.missile_cooldown,
            }),
            ai: None,
        }
    }

    /// Enemy tank tuned for the current level, facing a random heading
    pub fn enemy<R: Rng + ?Sized>(
        id: EntityId,
        pos: Vec2,
        level: &LevelConfig,
        config: &EnemyConfig,
        rng: &mut R,
    ) -> Self {
        let direction = rng.random_range(0.0..std::f32::consts::TAU);
        Self {
            id,
            role: TankRole::Enemy,
            pos,
            velocity: Vec2::ZERO,
            hull_angle: direction,
            turret_angle: direction,
            speed: level.enemy_speed,
            health: level.enemy_health,
            max_health: level.enemy_health,
            ammo: Some(config.ammo),
            shoot_cooldown: level.enemy_shoot_interval,
            last_shot: 0.0,
            alive: true,
            invulnerable: 0.0,
            blink: 0.0,
            effects: StatusEffects::default(),
            missiles: None,
            ai: Some(AiBrain::new(direction)),
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.role, TankRole::Player(_))
    }

    pub fn slot(&self) -> Option<PlayerSlot> {
        match self.role {
            TankRole::Player(slot) => Some(slot),
            TankRole::Enemy => None,
        }
    }

    pub fn owner(&self) -> Owner {
        Owner { id: self.id, role: self.role }
    }

    pub fn as_target(&self) -> Target {
        Target { id: self.id, pos: self.pos, velocity: self.velocity }
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, TANK_WIDTH, TANK_HEIGHT)
    }

    pub fn footprint(&self) -> Footprint {
        Footprint { id: self.id, rect: self.bounds() }
    }

    pub fn effective_speed(&self) -> f32 {
        self.speed * self.effects.speed_multiplier()
    }

    /// Whether the shot cooldown has elapsed
    pub fn ready_to_fire(&self) -> bool {
        self.last_shot >= self.shoot_cooldown
    }

    /// Advance timers, then move and aim under player or AI control
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        control: Control<'_>,
        world: &World<'_>,
        rng: &mut R,
    ) {
        if !self.alive {
            return;
        }
        self.tick_timers(dt);
        match control {
            Control::Player(input) => self.steer(dt, input, world),
            Control::Ai(context) => ai::think(self, dt, context, world, rng),
        }
    }

    fn tick_timers(&mut self, dt: f32) {
        self.invulnerable = (self.invulnerable - dt).max(0.0);
        self.blink = if self.is_invulnerable() { self.blink + dt } else { 0.0 };
        self.effects.tick(dt);
        self.last_shot += dt;
        if let Some(rack) = self.missiles.as_mut() {
            rack.since_launch += dt;
        }
    }

    fn steer(&mut self, dt: f32, input: &PlayerInput, world: &World<'_>) {
        let intent = input.movement.clamp_length_max(1.0);
        if intent != Vec2::ZERO {
            // Hull turns only with a committed move
            if self.try_move(intent, dt, world) {
                self.hull_angle = angle_of(intent);
            }
        } else {
            self.velocity = Vec2::ZERO;
        }

        let aim = match input.aim {
            Some(Aim::Direction(dir)) => dir,
            Some(Aim::Point(point)) => point - self.pos,
            None => Vec2::ZERO,
        };
        if aim.length_squared() > f32::EPSILON {
            self.turret_angle = angle_of(aim);
        }
    }

    /// Translate along `direction` for one frame, all or nothing.
    /// Returns false when the destination is blocked.
    pub fn try_move(&mut self, direction: Vec2, dt: f32, world: &World<'_>) -> bool {
        let step = direction * self.effective_speed() * dt;
        if step == Vec2::ZERO {
            self.velocity = Vec2::ZERO;
            return true;
        }
        let candidate = self.pos + step;
        if world.blocked(&Rect::centered(candidate, TANK_WIDTH, TANK_HEIGHT), self.id) {
            self.velocity = Vec2::ZERO;
            return false;
        }
        self.pos = candidate;
        self.velocity = step / dt;
        true
    }

    /// Fire along the turret. Empty when dead, cooling down or out of ammo.
    pub fn shoot(&mut self, config: &GameConfig) -> Vec<Bullet> {
        if !self.alive || !self.ready_to_fire() {
            return Vec::new();
        }
        if let Some(ammo) = self.ammo.as_mut() {
            if *ammo == 0 {
                return Vec::new();
            }
            *ammo -= 1;
        }

        let (count, spread) = match self.effects.shotgun {
            ShotgunMode::None => (1, 0.0),
            ShotgunMode::Shotgun { .. } => {
                (config.power_ups.shotgun.bullets, config.power_ups.shotgun.spread)
            }
            ShotgunMode::MegaShotgun => {
                (config.power_ups.mega_shotgun.bullets, config.power_ups.mega_shotgun.spread)
            }
        };
        let count = count.max(1);
        let speed = if self.effects.bullet_speed.is_some() {
            config.bullet.accelerated_speed
        } else {
            config.bullet.speed
        };
        let payload = if self.is_player() { self.effects.payload() } else { Payload::default() };
        let muzzle = self.pos + heading(self.turret_angle) * MUZZLE_DISTANCE;
        let owner = self.owner();
        let mid = (count - 1) as f32 / 2.0;

        let bullets = (0..count)
            .map(|i| {
                let angle = self.turret_angle + (i as f32 - mid) * spread;
                Bullet::new(muzzle, heading(angle) * speed, owner, payload, &config.bullet)
            })
            .collect();
        self.last_shot = 0.0;
        bullets
    }

    /// Returns whether damage was applied (false while invulnerable or dead)
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive || self.is_invulnerable() {
            return false;
        }
        self.health = (self.health - amount.max(0)).clamp(0, self.max_health);
        if self.health == 0 {
            self.alive = false;
        }
        true
    }

    pub fn heal(&mut self, amount: i32) {
        if self.alive {
            self.health = (self.health + amount.max(0)).min(self.max_health);
        }
    }

    /// Fire a volley of three homing missiles. Empty when out of charge,
    /// cooling down, or not a player tank.
    pub fn launch_stray_missiles(
        &mut self,
        enemies: &[Target],
        config: &MissileConfig,
    ) -> Vec<StrayMissile> {
        if !self.alive {
            return Vec::new();
        }
        let owner = self.owner();
        let pos = self.pos;
        let Some(rack) = self.missiles.as_mut() else {
            return Vec::new();
        };
        if rack.count == 0 || rack.since_launch < rack.cooldown {
            return Vec::new();
        }
        rack.count -= 1;
        rack.since_launch = 0.0;

        LAUNCH_OFFSETS
            .iter()
            .filter_map(|offset| match StrayMissile::launch(pos + *offset, owner, config) {
                Ok(mut missile) => {
                    missile.acquire_target(enemies, config.lock_radius);
                    Some(missile)
                }
                Err(err) => {
                    log::error!("Stray missile launch failed: {err}");
                    None
                }
            })
            .collect()
    }

    pub fn add_speed_boost(&mut self, multiplier: f32, duration: f32) {
        self.effects.speed = Some(Boost { multiplier, remaining: duration });
    }

    pub fn add_explosive_ammo(&mut self, duration: f32) {
        self.effects.primary = PrimaryEffect::Explosive { remaining: duration };
    }

    pub fn add_invincibility(&mut self, duration: f32) {
        self.invulnerable = self.invulnerable.max(duration);
    }

    pub fn add_shotgun_ammo(&mut self, duration: f32) {
        self.effects.shotgun = ShotgunMode::Shotgun { remaining: duration };
    }

    pub fn add_chain_bullet(&mut self) {
        self.effects.primary = PrimaryEffect::Chain;
    }

    pub fn add_mega_shotgun(&mut self) {
        self.effects.shotgun = ShotgunMode::MegaShotgun;
    }

    pub fn add_thunder_bullet(&mut self) {
        self.effects.primary = PrimaryEffect::Thunder;
    }

    pub fn add_bullet_speed_boost(&mut self, duration: f32) {
        self.effects.bullet_speed = Some(duration);
    }

    /// Add missile volleys, raising the rack capacity to `capacity`
    pub fn add_stray_missiles(&mut self, amount: u32, capacity: u32) {
        if let Some(rack) = self.missiles.as_mut() {
            rack.capacity = rack.capacity.max(capacity);
            rack.count = (rack.count + amount).min(rack.capacity);
        }
    }

    /// Back to neutral: no boosts, no special ammo
    pub fn reset_all_effects(&mut self) {
        self.effects = StatusEffects::default();
    }
}
