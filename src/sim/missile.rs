//! Stray missiles: homing projectiles launched in volleys of three
//!
//! Guidance is a simple lead pursuit rather than true proportional
//! navigation: the target is extrapolated along its own velocity for a
//! fraction of the time-to-impact and the missile turns toward that point at
//! a rate that grows as it closes in. Missiles ignore obstacles entirely.

use std::collections::VecDeque;

use glam::Vec2;

use super::rect::Rect;
use super::state::{EntityId, Owner, Target};
use crate::config::MissileConfig;
use crate::consts::MISSILE_TRAIL_LENGTH;
use crate::error::{Error, Result};
use crate::{angle_delta, angle_of, heading};

/// Muzzle offsets of the three launch tubes, relative to the tank centre
pub const LAUNCH_OFFSETS: [Vec2; 3] = [
    Vec2::new(-15.0, -10.0),
    Vec2::new(0.0, -15.0),
    Vec2::new(15.0, -10.0),
];

/// Initial heading: straight up the screen
const LAUNCH_ANGLE: f32 = -std::f32::consts::FRAC_PI_2;

/// Whether a missile is steering toward something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No target
    Searching,
    /// Target chosen, lock not yet confirmed
    Acquired,
    /// Target inside the lock radius, guidance active
    Locked,
}

#[derive(Debug, Clone)]
pub struct StrayMissile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub turn_rate: f32,
    pub damage: i32,
    pub radius: f32,
    /// Seconds left before the missile burns out
    pub life: f32,
    pub owner: Owner,
    /// Weak reference, looked up among living enemies every update
    pub target: Option<EntityId>,
    pub locked: bool,
    /// Recent positions, newest first
    pub trail: VecDeque<Vec2>,
    /// Set once the missile has struck a tank
    pub consumed: bool,
}

impl StrayMissile {
    /// Build a missile heading straight up from `pos`
    pub fn launch(pos: Vec2, owner: Owner, config: &MissileConfig) -> Result<Self> {
        if !pos.is_finite() {
            return Err(Error::NonFinite { what: "stray missile", x: pos.x, y: pos.y });
        }
        Ok(Self {
            pos,
            vel: heading(LAUNCH_ANGLE) * config.speed,
            angle: LAUNCH_ANGLE,
            speed: config.speed,
            turn_rate: config.turn_rate,
            damage: config.damage,
            radius: config.radius,
            life: config.life,
            owner,
            target: None,
            locked: false,
            trail: VecDeque::with_capacity(MISSILE_TRAIL_LENGTH + 1),
            consumed: false,
        })
    }

    pub fn lock_state(&self) -> LockState {
        match (self.target, self.locked) {
            (None, _) => LockState::Searching,
            (Some(_), false) => LockState::Acquired,
            (Some(_), true) => LockState::Locked,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    /// Pick the nearest enemy inside `lock_radius`, or nothing
    pub fn acquire_target(&mut self, enemies: &[Target], lock_radius: f32) {
        self.target = enemies
            .iter()
            .map(|e| (e.id, e.pos.distance(self.pos)))
            .filter(|(_, d)| *d <= lock_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);
        self.locked = false;
    }

    /// Advance one frame. Returns false once the missile should be removed.
    pub fn update(&mut self, dt: f32, enemies: &[Target], config: &MissileConfig, arena: &Rect) -> bool {
        if self.consumed {
            return false;
        }
        self.life -= dt;
        if self.life <= 0.0 {
            return false;
        }

        let target = self.maintain_target(enemies, config.lock_radius);
        if let Some(target) = target.filter(|_| self.locked) {
            self.steer(dt, &target, config);
        }

        self.pos += self.vel * dt;
        self.record_trail();

        arena.inflate(config.bounds_margin).contains(self.pos)
    }

    /// Keep the current target while it lives inside the lock radius,
    /// otherwise look for a new one. Confirms the lock when in range.
    fn maintain_target(&mut self, enemies: &[Target], lock_radius: f32) -> Option<Target> {
        let current = self
            .target
            .and_then(|id| enemies.iter().find(|e| e.id == id))
            .filter(|e| e.pos.distance(self.pos) <= lock_radius)
            .copied();
        let current = match current {
            Some(target) => Some(target),
            None => {
                self.acquire_target(enemies, lock_radius);
                self.target.and_then(|id| enemies.iter().find(|e| e.id == id).copied())
            }
        };
        self.locked = current.is_some();
        current
    }

    fn steer(&mut self, dt: f32, target: &Target, config: &MissileConfig) {
        let distance = target.pos.distance(self.pos);
        let time_to_target = distance / self.speed.max(f32::EPSILON);
        let predicted = target.pos + target.velocity * time_to_target * config.lead_factor;
        let desired = angle_of(predicted - self.pos);
        let diff = angle_delta(self.angle, desired);

        let close_in = ((config.close_range - distance) / config.close_range.max(f32::EPSILON)).max(0.0);
        let max_turn = self.turn_rate * (1.0 + close_in) * dt;

        if diff.abs() <= max_turn {
            self.angle = desired;
        } else {
            self.angle += max_turn * diff.signum();
        }
        self.vel = heading(self.angle) * self.speed;
    }

    fn record_trail(&mut self) {
        self.trail.push_front(self.pos);
        self.trail.truncate(MISSILE_TRAIL_LENGTH);
    }
}
