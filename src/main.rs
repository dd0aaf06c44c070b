//! Tank Defense headless runner
//!
//! Plays a seeded battle with both tanks on autopilot and prints a JSON
//! summary. Useful for balance checks and reproducing runs by seed.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tank_defense::audio::LogSink;
use tank_defense::config::{DefaultConfig, FileConfig};
use tank_defense::heading;
use tank_defense::platform::{InputSource, Rumble, STICK_DEADZONE, apply_deadzone};
use tank_defense::renderer::FrameCounter;
use tank_defense::sim::{Aim, PlayerInput, PlayerSlot};
use tank_defense::{Game, GameConfig, Settings};

const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "tank-defense")]
#[command(about = "Play a seeded autopilot battle and print a JSON summary")]
struct Args {
    /// Simulation seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Frame budget (60 per second)
    #[arg(long, default_value_t = 60 * 60 * 3)]
    frames: u64,
    /// Game balance JSON (defaults when omitted or unreadable)
    #[arg(long)]
    config: Option<String>,
    /// Player preferences JSON
    #[arg(long)]
    settings: Option<String>,
}

/// Drives both tanks in slow circles, sweeping the turret and holding fire.
/// Presses confirm every couple of seconds so menus and level breaks advance.
struct Autopilot {
    frame: u64,
}

impl InputSource for Autopilot {
    fn poll(&mut self, slot: PlayerSlot) -> Option<PlayerInput> {
        if slot == PlayerSlot::One {
            self.frame += 1;
        }
        let t = self.frame as f32 * FRAME_DT;
        let phase = match slot {
            PlayerSlot::One => 0.0,
            PlayerSlot::Two => std::f32::consts::PI,
        };
        let stick = apply_deadzone(heading(t * 0.7 + phase) * 0.9, STICK_DEADZONE);
        Some(PlayerInput {
            movement: stick,
            aim: Some(Aim::Direction(heading(-std::f32::consts::FRAC_PI_2 + (t * 1.3 + phase).sin()))),
            shoot: true,
            launch_missiles: self.frame % 300 == 0,
            transfer_life: false,
            pause: false,
            confirm: self.frame % 120 == 1,
        })
    }

    fn rumble(&mut self, slot: PlayerSlot, rumble: Rumble) {
        log::debug!("rumble {slot:?} {:.2}/{:.2} {}ms", rumble.strong, rumble.weak, rumble.duration_ms);
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::resolve(&FileConfig::new(path)),
        None => GameConfig::resolve(&DefaultConfig),
    };
    let settings = match &args.settings {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Settings::from_json(&json),
            Err(err) => {
                log::warn!("Could not read settings {path}: {err}");
                Settings::default()
            }
        },
        None => Settings::default(),
    };

    log::info!("Tank Defense (headless) starting, seed {}", args.seed);
    let mut game = Game::new(
        Arc::new(config),
        settings,
        args.seed,
        Box::new(LogSink),
        Box::new(Autopilot { frame: 0 }),
    );
    let mut counter = FrameCounter::default();

    for _ in 0..args.frames {
        game.frame(FRAME_DT, &mut counter);
        if game.state().phase.is_terminal() {
            break;
        }
    }

    let summary = game.summary();
    log::info!(
        "Finished after {} frames: {:?}, level {}, team score {}",
        summary.frames,
        summary.phase,
        summary.level,
        summary.team_score
    );
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Failed to serialize summary: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["tank-defense"]).unwrap();
        assert_eq!(args.seed, 1);
        assert_eq!(args.frames, 10_800);
        assert!(args.config.is_none() && args.settings.is_none());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from([
            "tank-defense",
            "--seed",
            "42",
            "--frames",
            "600",
            "--config",
            "balance.json",
        ])
        .unwrap();
        assert_eq!((args.seed, args.frames), (42, 600));
        assert_eq!(args.config.as_deref(), Some("balance.json"));
    }

    #[test]
    fn test_args_reject_bad_seed() {
        assert!(Args::try_parse_from(["tank-defense", "--seed", "abc"]).is_err());
        assert!(Args::try_parse_from(["tank-defense", "--speed", "2"]).is_err());
    }
}
