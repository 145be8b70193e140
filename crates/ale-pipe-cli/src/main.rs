//! ale-pipe: episode runner for the Arcade Learning Environment
//!
//! Launches ALE in fifo-controller mode for a ROM, plays the configured
//! action sequence for a number of episodes and prints one JSON summary
//! line per episode on stdout.
//!
//! Usage: ale-pipe <ale_path> <rom_path> [config.json]

mod config;

use ale_pipe_core::{LIVES_UNKNOWN, Outcome};
use ale_pipe_driver::{PipeSession, SimulatorProcess};
use anyhow::{Context, Result, bail};
use config::RunConfig;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Printed after every episode
#[derive(Debug, Serialize)]
struct EpisodeSummary {
    episode: u32,
    steps: u64,
    frames: u64,
    reward: i64,
    lives: i32,
    /// The game reported its end
    terminal: bool,
    /// The simulator went away mid-episode
    terminated: bool,
    state_hash: String,
}

fn play_episode(
    session: &mut PipeSession,
    config: &RunConfig,
    episode: u32,
) -> Result<EpisodeSummary> {
    let frame_repeat = u64::from(session.capabilities().frame_repeat);
    let mut summary = EpisodeSummary {
        episode,
        steps: 0,
        frames: 0,
        reward: 0,
        lives: LIVES_UNKNOWN,
        terminal: false,
        terminated: false,
        state_hash: String::new(),
    };

    for action in config.actions.iter().cycle() {
        if config.max_steps > 0 && summary.steps >= config.max_steps {
            warn!("Episode {} hit the step limit ({})", episode, config.max_steps);
            break;
        }

        let outcome = session.step(*action)?;
        summary.steps += 1;
        summary.frames += frame_repeat;

        let signal = session.turn_signal();
        summary.reward += signal.reward;
        summary.lives = signal.lives_or_unknown();

        if outcome == Outcome::Terminated {
            summary.terminated = true;
            break;
        }
        if signal.terminal {
            summary.terminal = true;
            break;
        }
    }

    summary.state_hash = session.observation().state_hash();
    Ok(summary)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        let program = args.first().map_or("ale-pipe", String::as_str);
        bail!("usage: {} <ale_path> <rom_path> [config.json]", program);
    }

    let mut config = match args.get(3) {
        Some(path) => RunConfig::load(Path::new(path))
            .with_context(|| format!("loading run config {}", path))?,
        None => RunConfig::default(),
    };
    config.simulator.ale_path = args[1].clone().into();
    config.simulator.rom_path = args[2].clone().into();

    info!(
        "Playing {} episode(s) of {:?}",
        config.episodes, config.simulator.rom_path
    );

    let mut process = SimulatorProcess::spawn(config.simulator.clone())?;
    let mut session = process.session(config.session)?;
    let dims = session.negotiate(config.capabilities)?;
    info!("Negotiated {}x{} screen", dims.width, dims.height);

    for episode in 0..config.episodes {
        if episode > 0 && session.reset()? == Outcome::Terminated {
            warn!("Simulator ended before episode {}", episode);
            break;
        }

        let summary = play_episode(&mut session, &config, episode)?;
        info!(
            "Episode {} finished: {} steps, reward {}",
            episode, summary.steps, summary.reward
        );
        println!("{}", serde_json::to_string(&summary)?);

        if summary.terminated {
            break;
        }
    }

    if session.wants_terminate() {
        info!("Simulator asked to terminate");
    }
    drop(session);
    process.close()?;
    Ok(())
}
