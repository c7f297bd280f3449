//! Cat Platformer headless driver
//!
//! Runs the simulation without a window: loads settings and JSON maps (or a
//! built-in demo level), then plays with a seeded autopilot on a fixed
//! timestep and logs every level transition.
//!
//! Usage: `cat-platformer [--settings FILE] [--maps DIR] [--frames N] [--seed N] [--realtime]`

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use cat_platformer::audio::AudioManager;
use cat_platformer::consts::*;
use cat_platformer::map::{JsonLevelSource, LevelMap, LevelSource, MapObject, MemoryLevelSource, layers};
use cat_platformer::sim::{Clock, Controls, LevelEvent, ManualClock, MonotonicClock};
use cat_platformer::{LevelError, Session, SessionCommand, SessionView, Settings};

#[derive(Parser)]
#[command(name = "cat-platformer")]
#[command(about = "Headless run of the platformer simulation")]
struct Cli {
    /// Settings JSON file (defaults are used when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory holding map_<level>.json files (built-in demo levels when omitted)
    #[arg(long)]
    maps: Option<PathBuf>,

    /// Rendered frames to simulate
    #[arg(long, default_value_t = 60 * 120)]
    frames: u32,

    /// Autopilot seed
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Pace frames in wall-clock time and run the level timer on the real clock
    #[arg(long)]
    realtime: bool,
}

/// A long floor with a few coins, a fruit gate and a moving platform
fn demo_level(length_tiles: u32, seconds: u32) -> LevelMap {
    let width = (length_tiles * 64) as f32;
    let coins = (1..8)
        .map(|i| MapObject::new(300.0 + i as f32 * 350.0, 100.0, 32.0, 32.0))
        .collect();
    LevelMap::new(length_tiles, 12, 64)
        .with_seconds(seconds)
        .with_layer(layers::PLATFORMS, vec![MapObject::new(width / 2.0, 16.0, width, 32.0)])
        .with_layer(layers::COINS, coins)
        .with_layer(layers::FRUITS, vec![MapObject::new(900.0, 80.0, 32.0, 32.0)])
        .with_layer(layers::LEVEL_WALL, vec![MapObject::new(width - 400.0, 200.0, 32.0, 320.0)])
        .with_layer(
            layers::MOVING_SPRITES,
            vec![MapObject::new(1600.0, 260.0, 192.0, 24.0).moving(
                glam::Vec2::new(2.0, 0.0),
                Some(1400.0),
                Some(2000.0),
                None,
                None,
            )],
        )
}

/// Seeded autopilot: run right, hop now and then
struct Autopilot {
    rng: Pcg32,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn controls(&mut self) -> Controls {
        Controls {
            right: true,
            up: self.rng.random_bool(0.03),
            soft_jump: self.rng.random_bool(0.01),
            map_toggle: self.rng.random_bool(0.002),
            ..Default::default()
        }
    }

    /// Frame time jitter around 60 Hz
    fn frame_time(&mut self) -> f32 {
        self.rng.random_range(0.012..0.022)
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Settings::default(),
    };

    let source: Rc<dyn LevelSource> = match &cli.maps {
        Some(dir) => Rc::new(JsonLevelSource::new(dir)),
        None => {
            log::info!("No --maps given, using the built-in demo levels");
            Rc::new(
                MemoryLevelSource::new()
                    .with_level(1, demo_level(60, 90))
                    .with_level(2, demo_level(80, 120)),
            )
        }
    };

    let manual = ManualClock::new();
    let clock: Rc<dyn Clock> = if cli.realtime {
        Rc::new(MonotonicClock::new())
    } else {
        Rc::new(manual.clone())
    };
    let audio = AudioManager::default();
    let mut session = Session::new(settings, source, clock, audio);
    session
        .dispatch(SessionCommand::NewGame)
        .context("starting a new game")?;

    let mut pilot = Autopilot::new(cli.seed);
    let mut accumulator = 0.0f32;

    for frame in 0..cli.frames {
        let dt = pilot.frame_time().min(0.1);
        if cli.realtime {
            std::thread::sleep(Duration::from_secs_f32(dt));
        } else {
            manual.advance_secs(f64::from(dt));
        }
        accumulator += dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let controls = pilot.controls();
            let events = match session.update(&controls, SIM_DT) {
                Ok(events) => events,
                // Ran past the last map
                Err(LevelError::NotFound { level }) if level > 1 => {
                    let score = session.controller().map_or(0, |c| c.state().score);
                    println!("All {} levels complete, final score {score}", level - 1);
                    return Ok(());
                }
                Err(e) => return Err(e).context(format!("frame {frame}")),
            };
            for event in events {
                match event {
                    LevelEvent::Jumped | LevelEvent::Collected { .. } => log::debug!("{event:?}"),
                    _ => log::info!("frame {frame}: {event:?}"),
                }
            }
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if let SessionView::GameOver { final_score } = session.view() {
            println!("Game over after {frame} frames, final score {final_score}");
            return Ok(());
        }
    }

    if let Some(controller) = session.controller() {
        let hud = controller.hud();
        println!(
            "{} | {} | coins {} | fruit {} | {} | {}",
            hud.level_text, hud.score_text, hud.coins_text, hud.fruit_text, hud.timer_text, hud.hearts
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Cat Platformer (headless) starting...");
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults_and_flags() {
        let cli = Cli::try_parse_from(["cat-platformer"]).unwrap();
        assert_eq!(cli.frames, 7200);
        assert_eq!(cli.seed, 7);
        assert!(cli.settings.is_none());
        assert!(!cli.realtime);

        let cli = Cli::try_parse_from([
            "cat-platformer",
            "--maps",
            "levels",
            "--frames",
            "30",
            "--seed",
            "11",
            "--realtime",
        ])
        .unwrap();
        assert_eq!(cli.maps, Some(PathBuf::from("levels")));
        assert_eq!(cli.frames, 30);
        assert_eq!(cli.seed, 11);
        assert!(cli.realtime);

        assert!(Cli::try_parse_from(["cat-platformer", "--frames", "many"]).is_err());
        assert!(Cli::try_parse_from(["cat-platformer", "--bogus"]).is_err());
    }

    #[test]
    fn test_demo_run_finishes() {
        let cli = Cli::try_parse_from(["cat-platformer", "--frames", "120"]).unwrap();
        assert!(run(cli).is_ok());
    }
}
