//! Projectile advance and hit resolution
//!
//! Bullets resolve against obstacles first, then the eagle, then tanks, and
//! stop at the first match. Special payloads trigger only on a kill and only
//! once per bullet. Missiles skip obstacles and only look for enemy tanks.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use super::bullet::Bullet;
use super::level;
use super::rect::{HitAxis, hit_axis};
use super::state::{EntityId, GameEvent, GameState, KillMethod, Owner};
use super::tank::Tank;
use crate::audio::SoundEffect;
use crate::config::GameConfig;
use crate::consts::SHIELD_NUDGE;
use crate::heading;

/// Damage a bullet does to the eagle
const EAGLE_HIT: i32 = 1;

/// Outcome of damage that actually landed
#[derive(Debug, Clone, Copy)]
struct Hit {
    killed: bool,
    enemy: bool,
    pos: Vec2,
}

/// Apply damage through the tank's own gate, reporting player hits.
/// `None` when the tank is gone, dead, or invulnerable.
fn damage_tank(state: &mut GameState, id: EntityId, amount: i32) -> Option<Hit> {
    let tank = state.tank_mut(id)?;
    if !tank.take_damage(amount) {
        return None;
    }
    let hit = Hit { killed: !tank.alive, enemy: !tank.is_player(), pos: tank.pos };
    if let Some(slot) = tank.slot() {
        let max_health = tank.max_health;
        state.emit(GameEvent::PlayerDamaged { slot, amount, max_health, fatal: hit.killed });
    }
    Some(hit)
}

/// Living tanks within `radius` of `center` that pass `keep`, nearest first
fn tanks_within(
    state: &GameState,
    center: Vec2,
    radius: f32,
    keep: impl Fn(&Tank) -> bool,
) -> Vec<(EntityId, f32)> {
    let mut found: Vec<(EntityId, f32)> = state
        .living_tanks()
        .filter(|&t| keep(t))
        .map(|t| (t.id, t.pos.distance(center)))
        .filter(|(_, d)| *d <= radius)
        .collect();
    found.sort_by(|a, b| a.1.total_cmp(&b.1));
    found
}

/// Move bullets and missiles one frame, dropping spent ones before any
/// collision test
pub fn advance_projectiles(state: &mut GameState, dt: f32) {
    let arena = state.arena();
    for bullet in &mut state.bullets {
        bullet.advance(dt);
    }
    state.bullets.retain(|b| !b.is_spent(&arena));

    let config = Arc::clone(&state.config);
    let enemies = state.living_enemies();
    state
        .missiles
        .retain_mut(|m| m.update(dt, &enemies, &config.missile, &arena));
}

/// Resolve every live bullet against the world. Follow-up bullets from chain
/// kills join the collection after the pass.
pub fn resolve_bullets(state: &mut GameState) {
    let config = Arc::clone(&state.config);
    let mut bullets = std::mem::take(&mut state.bullets);
    let mut spawned = Vec::new();
    for bullet in bullets.iter_mut().filter(|b| !b.marked_for_deletion) {
        resolve_bullet(state, bullet, &config, &mut spawned);
    }
    bullets.append(&mut spawned);
    state.bullets = bullets;
}

fn resolve_bullet(state: &mut GameState, bullet: &mut Bullet, config: &GameConfig, spawned: &mut Vec<Bullet>) {
    let bounds = bullet.bounds();

    let obstacle = state
        .obstacles
        .iter()
        .position(|o| o.is_solid() && o.rect.overlaps(&bounds));
    if let Some(index) = obstacle {
        if bullet.can_bounce() {
            let axis = hit_axis(&bounds, &state.obstacles[index].rect).unwrap_or(HitAxis::Horizontal);
            bullet.bounce(axis);
            state.sound(SoundEffect::Bounce);
            return;
        }
        bullet.mark();
        state.obstacles[index].take_damage(bullet.damage);
        if bullet.payload.explosive && !bullet.has_exploded {
            bullet.has_exploded = true;
            explode(state, bullet.pos, bullet.owner, config);
        }
        return;
    }

    if !state.eagle.destroyed && state.eagle.bounds().overlaps(&bounds) {
        if state.shield_active() {
            if bullet.can_bounce() {
                let angle = state.rng.random_range(0.0..TAU);
                bullet.deflect(heading(angle), SHIELD_NUDGE);
                state.sound(SoundEffect::Bounce);
            } else {
                bullet.mark();
                state.sound(SoundEffect::Shield);
            }
            return;
        }
        bullet.mark();
        if !bullet.owner.is_player() {
            state.eagle.take_damage(EAGLE_HIT);
        }
        return;
    }

    let owner = bullet.owner;
    let struck = state
        .living_tanks()
        .filter(|t| t.id != owner.id)
        .filter(|t| config.bullet.friendly_fire || !(owner.is_player() && t.is_player()))
        .find(|t| t.bounds().overlaps(&bounds))
        .map(|t| t.id);
    let Some(struck) = struck else {
        return;
    };
    bullet.mark();

    let Some(hit) = damage_tank(state, struck, bullet.damage) else {
        return;
    };
    let Some(slot) = owner.slot().filter(|_| hit.killed && hit.enemy) else {
        return;
    };
    level::award_kill(state, slot, KillMethod::Direct);

    if bullet.payload.chain && !bullet.has_chained {
        bullet.has_chained = true;
        spawned.extend(chain_bullets(hit.pos, owner, config));
    }
    if bullet.payload.thunder && !bullet.has_thundered {
        bullet.has_thundered = true;
        thunder_chain(state, hit.pos, owner, struck, config);
    }
    if bullet.payload.explosive && !bullet.has_exploded {
        bullet.has_exploded = true;
        explode(state, hit.pos, owner, config);
    }
}

/// Follow-up bullets fanned evenly around the kill point
pub fn chain_bullets(pos: Vec2, owner: Owner, config: &GameConfig) -> Vec<Bullet> {
    let chain = &config.power_ups.chain;
    let directions = chain.directions.max(1);
    (0..directions)
        .map(|i| {
            let angle = TAU * i as f32 / directions as f32;
            Bullet::chained(pos, heading(angle) * chain.speed, owner, &config.bullet)
        })
        .collect()
}

/// Lightning from a kill point to the nearest tanks around it, skipping the
/// shooter and the tank just hit. Returns the tanks struck, nearest first.
pub fn thunder_chain(
    state: &mut GameState,
    center: Vec2,
    owner: Owner,
    struck: EntityId,
    config: &GameConfig,
) -> Vec<EntityId> {
    state.sound(SoundEffect::Thunder);
    let effect = &config.power_ups.thunder;
    let candidates = tanks_within(state, center, effect.range, |t| t.id != owner.id && t.id != struck);

    let mut arcs = Vec::with_capacity(effect.max_targets);
    for (id, _) in candidates {
        if arcs.len() >= effect.max_targets {
            break;
        }
        let Some(hit) = damage_tank(state, id, effect.damage) else {
            continue;
        };
        arcs.push(id);
        if let Some(slot) = owner.slot().filter(|_| hit.killed && hit.enemy) {
            level::award_kill(state, slot, KillMethod::Thunder);
        }
    }
    log::debug!("Thunder chain at ({:.0}, {:.0}) struck {} tanks", center.x, center.y, arcs.len());
    arcs
}

/// Area blast around `center`. Damage falls off linearly from full at the
/// epicentre to half at the edge. Once the kill cap is reached, further
/// enemies are left on one health point. Returns the number of kills.
pub fn explode(state: &mut GameState, center: Vec2, owner: Owner, config: &GameConfig) -> usize {
    state.sound(SoundEffect::Explosion);
    let radius = config.bullet.explosion_radius.max(f32::EPSILON);
    let effect = &config.power_ups.explosive;
    let targets = tanks_within(state, center, radius, |t| t.id != owner.id);

    let mut kills = 0;
    for (id, distance) in targets {
        let falloff = 1.0 - distance / radius;
        let mut damage = (effect.damage as f32 * (0.5 + falloff * 0.5)).floor() as i32;
        let Some(tank) = state.tank(id) else {
            continue;
        };
        if !tank.is_player() && kills >= effect.max_kills {
            damage = damage.min(tank.health - 1);
        }
        let Some(hit) = damage_tank(state, id, damage) else {
            continue;
        };
        if hit.killed && hit.enemy {
            kills += 1;
            if let Some(slot) = owner.slot() {
                level::award_kill(state, slot, KillMethod::Explosion);
            }
        }
    }
    log::debug!("Explosion at ({:.0}, {:.0}) killed {kills}", center.x, center.y);
    kills
}

/// Missiles against living enemies; the first contact consumes the missile
pub fn resolve_missiles(state: &mut GameState) {
    let mut missiles = std::mem::take(&mut state.missiles);
    for missile in &mut missiles {
        let bounds = missile.bounds();
        let target = state
            .enemies
            .iter()
            .filter(|t| t.alive)
            .find(|t| t.bounds().overlaps(&bounds))
            .map(|t| t.id);
        let Some(target) = target else {
            continue;
        };
        missile.consumed = true;
        state.sound(SoundEffect::MissileHit);
        let killed = damage_tank(state, target, missile.damage).is_some_and(|hit| hit.killed);
        if let Some(slot) = missile.owner.slot().filter(|_| killed) {
            level::award_kill(state, slot, KillMethod::Missile);
        }
    }
    missiles.retain(|m| !m.consumed);
    state.missiles = missiles;
}
