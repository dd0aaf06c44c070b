//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No audio, rendering or platform dependencies; side effects are
//!   reported as [`GameEvent`]s

pub mod ai;
pub mod arena;
pub mod bullet;
pub mod level;
pub mod missile;
pub mod powerup;
pub mod rect;
pub mod state;
pub mod tank;
pub mod tick;
pub mod weapons;

pub use ai::{AiBrain, AiState};
pub use arena::{Eagle, Obstacle};
pub use bullet::{Bullet, Payload};
pub use level::{LevelReport, ObstacleLayout, PlayerReport, Progress};
pub use missile::{LockState, StrayMissile};
pub use powerup::{PowerUp, PowerUpKind};
pub use rect::Rect;
pub use state::{
    EntityId, GameEvent, GameOverReason, GamePhase, GameState, KillMethod, Owner, PlayerRecord,
    PlayerSlot, TankRole, Target,
};
pub use tank::{PrimaryEffect, ShotgunMode, StatusEffects, Tank};
pub use tick::{Aim, PlayerInput, TickInput, tick};
