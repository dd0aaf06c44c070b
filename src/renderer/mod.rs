//! Rendering hooks
//!
//! The game walks the state once per frame and hands every visible entity to
//! a host-provided [`RenderSink`] in back-to-front order: obstacles, eagle,
//! power-ups, tanks, bullets, missile trails, missiles. How they are drawn is
//! up to the host.

use glam::Vec2;

use crate::sim::{Bullet, Eagle, GameState, Obstacle, PowerUp, StrayMissile, Tank};

/// Blink frequency of invulnerable tanks (toggles per second)
const BLINK_RATE: f32 = 10.0;

/// One entity to draw
#[derive(Debug, Clone, Copy)]
pub enum EntityView<'a> {
    Obstacle(&'a Obstacle),
    Eagle { eagle: &'a Eagle, shielded: bool },
    PowerUp(&'a PowerUp),
    Tank { tank: &'a Tank, visible: bool },
    Bullet(&'a Bullet),
    /// One faded point behind a missile
    Trail { point: Vec2, alpha: f32 },
    Missile(&'a StrayMissile),
}

/// Host drawing backend
pub trait RenderSink {
    /// Called before any entity, e.g. to clear the target or draw the HUD
    fn begin_frame(&mut self, _state: &GameState) {}
    fn draw(&mut self, view: EntityView<'_>);
    fn end_frame(&mut self) {}
}

/// Whether a tank is in the "on" half of its blink cycle
pub fn tank_visible(tank: &Tank) -> bool {
    !tank.is_invulnerable() || ((tank.blink * BLINK_RATE) as u32) % 2 == 0
}

/// Opacity of the `index`th trail point (0 is newest)
pub fn trail_alpha(index: usize, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    (1.0 - index as f32 / len as f32) * 0.8
}

/// Counts what it is asked to draw (headless runs, tests)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameCounter {
    pub frames: u64,
    pub obstacles: usize,
    pub eagles: usize,
    pub power_ups: usize,
    pub tanks: usize,
    pub bullets: usize,
    pub trail_points: usize,
    pub missiles: usize,
}

impl FrameCounter {
    /// Entities seen in the most recent frame
    pub fn total(&self) -> usize {
        self.obstacles
            + self.eagles
            + self.power_ups
            + self.tanks
            + self.bullets
            + self.trail_points
            + self.missiles
    }
}

impl RenderSink for FrameCounter {
    fn begin_frame(&mut self, _state: &GameState) {
        *self = Self { frames: self.frames + 1, ..Self::default() };
    }

    fn draw(&mut self, view: EntityView<'_>) {
        match view {
            EntityView::Obstacle(_) => self.obstacles += 1,
            EntityView::Eagle { .. } => self.eagles += 1,
            EntityView::PowerUp(_) => self.power_ups += 1,
            EntityView::Tank { .. } => self.tanks += 1,
            EntityView::Bullet(_) => self.bullets += 1,
            EntityView::Trail { .. } => self.trail_points += 1,
            EntityView::Missile(_) => self.missiles += 1,
        }
    }
}
