//! Bullets
//!
//! A bullet resolves against at most one target per frame. Removal is
//! deferred: resolution sets `marked_for_deletion` and the collection is
//! swept at the start of the next update.

use glam::Vec2;

use super::rect::{HitAxis, Rect, reflect_velocity};
use super::state::Owner;
use crate::config::BulletConfig;
use crate::consts::BOUNCE_NUDGE;

/// Special payload a tank's shots carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Payload {
    pub explosive: bool,
    pub chain: bool,
    pub thunder: bool,
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: Owner,
    pub radius: f32,
    /// Seconds left before the bullet expires
    pub life: f32,
    pub damage: i32,
    pub payload: Payload,
    /// One-shot guards for the payload effects
    pub has_exploded: bool,
    pub has_chained: bool,
    pub has_thundered: bool,
    pub bounces: u32,
    pub max_bounces: u32,
    pub marked_for_deletion: bool,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2, owner: Owner, payload: Payload, config: &BulletConfig) -> Self {
        Self {
            pos,
            vel,
            owner,
            radius: config.radius,
            life: config.life,
            damage: config.damage,
            payload,
            has_exploded: false,
            has_chained: false,
            has_thundered: false,
            bounces: 0,
            max_bounces: config.max_bounces,
            marked_for_deletion: false,
        }
    }

    /// Follow-up bullet spawned by a chain kill; it can never chain again
    pub fn chained(pos: Vec2, vel: Vec2, owner: Owner, config: &BulletConfig) -> Self {
        let payload = Payload { chain: true, ..Payload::default() };
        Self {
            has_chained: true,
            ..Self::new(pos, vel, owner, payload, config)
        }
    }

    /// Move and age the bullet
    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.life -= dt;
    }

    /// Expired or outside the arena
    pub fn is_spent(&self, arena: &Rect) -> bool {
        self.life <= 0.0
            || self.pos.x < arena.x
            || self.pos.x > arena.right()
            || self.pos.y < arena.y
            || self.pos.y > arena.bottom()
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    /// Thunder rounds ricochet until their bounce budget runs out
    pub fn can_bounce(&self) -> bool {
        self.payload.thunder && self.bounces < self.max_bounces
    }

    /// Mirror off an obstacle face and step clear of it
    pub fn bounce(&mut self, axis: HitAxis) {
        self.vel = reflect_velocity(self.vel, axis);
        self.pos += self.vel * BOUNCE_NUDGE;
        self.bounces += 1;
    }

    /// Leave along a new heading at the same speed
    pub fn deflect(&mut self, direction: Vec2, nudge: f32) {
        self.vel = direction * self.vel.length();
        self.pos += self.vel * nudge;
        self.bounces += 1;
    }

    pub fn mark(&mut self) {
        self.marked_for_deletion = true;
    }
}
