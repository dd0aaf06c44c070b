//! Static arena pieces: obstacles and the eagle

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::config::EagleConfig;

/// A wall block; steel blocks are indestructible, brick blocks wear down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
    pub destructible: bool,
    pub health: i32,
    pub max_health: i32,
    pub destroyed: bool,
}

impl Obstacle {
    /// Indestructible block
    pub fn steel(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            destructible: false,
            health: i32::MAX,
            max_health: i32::MAX,
            destroyed: false,
        }
    }

    /// Destructible block
    pub fn brick(x: f32, y: f32, w: f32, h: f32, health: i32) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            destructible: true,
            health,
            max_health: health,
            destroyed: false,
        }
    }

    /// Whether this block still blocks movement and bullets
    #[inline]
    pub fn is_solid(&self) -> bool {
        !self.destroyed
    }

    /// Returns true if this hit destroyed the block
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.destructible || self.destroyed {
            return false;
        }
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.destroyed = true;
        }
        self.destroyed
    }
}

/// The defended base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eagle {
    pub pos: Vec2,
    pub size: f32,
    pub health: i32,
    pub max_health: i32,
    pub destroyed: bool,
}

impl Eagle {
    pub fn new(pos: Vec2, config: &EagleConfig) -> Self {
        Self {
            pos,
            size: config.size,
            health: config.max_health,
            max_health: config.max_health,
            destroyed: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.size, self.size)
    }

    /// Returns true if this hit destroyed the eagle
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.destroyed {
            return false;
        }
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.destroyed = true;
            log::info!("Eagle destroyed");
        }
        self.destroyed
    }
}
