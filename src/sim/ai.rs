//! Enemy AI
//!
//! Two states. Seeking: a living player is inside the detection radius, so
//! hull and turret both point straight at them. Wandering: hold a random
//! heading for a fixed interval, re-rolling immediately when blocked.

use rand::Rng;

use super::state::{EntityId, Target};
use super::tank::{Tank, World};
use crate::{angle_of, heading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Wandering,
    Seeking { target: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiBrain {
    pub state: AiState,
    /// Heading the tank drives along
    pub direction: f32,
    /// Seconds since the wander heading was last rolled
    pub direction_timer: f32,
}

impl AiBrain {
    pub fn new(direction: f32) -> Self {
        Self { state: AiState::Wandering, direction, direction_timer: 0.0 }
    }
}

/// What an enemy knows about the world this frame
pub struct AiContext<'a> {
    /// Living players
    pub players: &'a [Target],
    pub detection_range: f32,
    pub direction_change_interval: f32,
}

fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random_range(0.0..std::f32::consts::TAU)
}

/// Run one AI step for `tank`: pick a state, aim, then drive
pub fn think<R: Rng + ?Sized>(
    tank: &mut Tank,
    dt: f32,
    context: &AiContext<'_>,
    world: &World<'_>,
    rng: &mut R,
) {
    let Some(mut brain) = tank.ai else {
        return;
    };

    let nearest = context
        .players
        .iter()
        .map(|p| (p, p.pos.distance(tank.pos)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match nearest {
        Some((player, distance)) if distance < context.detection_range => {
            brain.state = AiState::Seeking { target: player.id };
            let bearing = angle_of(player.pos - tank.pos);
            tank.turret_angle = bearing;
            brain.direction = bearing;
        }
        _ => {
            brain.state = AiState::Wandering;
            brain.direction_timer += dt;
            if brain.direction_timer >= context.direction_change_interval {
                brain.direction = random_heading(rng);
                brain.direction_timer = 0.0;
            }
            tank.turret_angle = brain.direction;
        }
    }

    if !tank.try_move(heading(brain.direction), dt, world) {
        brain.direction = random_heading(rng);
        brain.direction_timer = 0.0;
    }
    tank.hull_angle = brain.direction;
    tank.ai = Some(brain);
}
