//! Platform abstraction layer
//!
//! Devices differ per host (keyboard and mouse, gamepads, a script in tests).
//! The game only sees normalized [`PlayerInput`] per player slot, and can ask
//! for a rumble pulse on that player's controller.

use std::collections::VecDeque;

use glam::Vec2;

use crate::sim::{PlayerInput, PlayerSlot};

/// Stick readings below this magnitude count as centred
pub const STICK_DEADZONE: f32 = 0.2;

/// A rumble pulse. Magnitudes are 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rumble {
    pub strong: f32,
    pub weak: f32,
    pub duration_ms: u32,
}

impl Rumble {
    /// Scaled to the share of max health lost
    pub fn damage(amount: i32, max_health: i32) -> Self {
        let ratio = (amount as f32 / max_health.max(1) as f32).clamp(0.0, 1.0);
        let strong = 0.3 + ratio * 0.5;
        Self { strong, weak: strong * 0.7, duration_ms: 200 + (ratio * 300.0) as u32 }
    }

    pub fn death() -> Self {
        Self { strong: 0.9, weak: 0.7, duration_ms: 800 }
    }

    pub fn respawn() -> Self {
        Self { strong: 0.4, weak: 0.2, duration_ms: 150 }
    }
}

/// Source of per-player input
pub trait InputSource {
    /// Input for `slot` this frame, `None` when nothing is connected
    fn poll(&mut self, slot: PlayerSlot) -> Option<PlayerInput>;

    /// Vibrate the controller bound to `slot`. Devices without haptics ignore it.
    fn rumble(&mut self, _slot: PlayerSlot, _rumble: Rumble) {}
}

/// Replays queued frames per slot and records every rumble request.
/// A slot with an empty queue reports no input.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    frames: [VecDeque<PlayerInput>; 2],
    pub rumbles: Vec<(PlayerSlot, Rumble)>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: PlayerSlot, input: PlayerInput) {
        self.frames[slot.index()].push_back(input);
    }

    /// Queue `input` for `frames` consecutive frames
    pub fn hold(&mut self, slot: PlayerSlot, input: PlayerInput, frames: usize) {
        self.frames[slot.index()].extend(std::iter::repeat_n(input, frames));
    }

    pub fn pending(&self, slot: PlayerSlot) -> usize {
        self.frames[slot.index()].len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, slot: PlayerSlot) -> Option<PlayerInput> {
        self.frames[slot.index()].pop_front()
    }

    fn rumble(&mut self, slot: PlayerSlot, rumble: Rumble) {
        self.rumbles.push((slot, rumble));
    }
}

/// Zero a stick reading inside the deadzone and rescale the rest so the
/// output still spans the full range
pub fn apply_deadzone(stick: Vec2, deadzone: f32) -> Vec2 {
    let len = stick.length();
    if len <= deadzone || len <= f32::EPSILON {
        return Vec2::ZERO;
    }
    let scaled = ((len - deadzone) / (1.0 - deadzone)).min(1.0);
    stick / len * scaled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_rumble_scales_with_ratio() {
        let light = Rumble::damage(25, 100);
        assert!((light.strong - 0.425).abs() < 1e-6);
        assert!((light.weak - 0.2975).abs() < 1e-6);
        assert_eq!(light.duration_ms, 275);

        let heavy = Rumble::damage(100, 100);
        assert!((heavy.strong - 0.8).abs() < 1e-6);
        assert_eq!(heavy.duration_ms, 500);
    }

    #[test]
    fn test_scripted_input_drains_per_slot() {
        let mut input = ScriptedInput::new();
        let shoot = PlayerInput { shoot: true, ..Default::default() };
        input.hold(PlayerSlot::Two, shoot, 2);

        assert_eq!(input.poll(PlayerSlot::One), None);
        assert_eq!(input.poll(PlayerSlot::Two), Some(shoot));
        assert_eq!(input.pending(PlayerSlot::Two), 1);
        assert_eq!(input.poll(PlayerSlot::Two), Some(shoot));
        assert_eq!(input.poll(PlayerSlot::Two), None);
    }

    #[test]
    fn test_scripted_input_records_rumble() {
        let mut input = ScriptedInput::new();
        input.rumble(PlayerSlot::One, Rumble::death());
        assert_eq!(input.rumbles, vec![(PlayerSlot::One, Rumble::death())]);
    }

    #[test]
    fn test_deadzone() {
        assert_eq!(apply_deadzone(Vec2::new(0.1, 0.1), STICK_DEADZONE), Vec2::ZERO);
        let full = apply_deadzone(Vec2::new(1.0, 0.0), STICK_DEADZONE);
        assert!((full.x - 1.0).abs() < 1e-6);
        let half = apply_deadzone(Vec2::new(0.0, -0.6), STICK_DEADZONE);
        assert!((half.y + 0.5).abs() < 1e-6);
    }
}
