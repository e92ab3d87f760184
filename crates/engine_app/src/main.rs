//! # engine_app — game loop
//!
//! Runs the framework's fixed-timestep loop: every tick updates all systems
//! and then drains the event queue and advances delayed events.
//!
//! ## Startup Sequence
//!
//! 1. Load the configuration (optional JSON file, CLI overrides).
//! 2. Create the game and add the built-in systems.
//! 3. Enter the tick loop until `max_ticks` is reached (0 = forever).

mod config;
mod game;
mod systems;
mod tick;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use game::Game;
use systems::{AlarmSystem, EventLogSystem, HeartbeatSystem};
use tick::TickLoop;

#[derive(Parser, Debug)]
#[command(name = "engine_app", about = "Tick-driven game loop")]
struct Cli {
    /// Path to a JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticks per second (overrides the config file).
    #[arg(long)]
    tick_rate: Option<f64>,

    /// Stop after this many ticks, 0 runs forever (overrides the config file).
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(tick_rate) = cli.tick_rate {
        config = config.with_tick_rate(tick_rate);
    }
    if let Some(max_ticks) = cli.max_ticks {
        config = config.with_max_ticks(max_ticks);
    }
    config.validate()?;

    info!(?config, "engine starting");

    let mut game = Game::new();
    game.add_system(EventLogSystem::new())?;
    game.add_system(HeartbeatSystem::new(config.heartbeat_interval))?;
    game.add_system(AlarmSystem::new(config.alarm_delay))?;

    let mut tick_loop = TickLoop::new(config.tick, game)?;
    tick_loop.run()?;

    let game = tick_loop.game();
    let heartbeats = game.systems().get_system::<HeartbeatSystem>()?.beats();
    let alarms = game.systems().get_system::<AlarmSystem>()?.fired();
    let events = game.systems().get_system::<EventLogSystem>()?.seen();
    info!(
        ticks = tick_loop.tick_id(),
        heartbeats, alarms, events, "engine shut down"
    );
    Ok(())
}
