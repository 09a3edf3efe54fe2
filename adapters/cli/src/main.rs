#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Digi Defence headless.

mod save_code;
mod simulate;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use digi_defence_core::{GameMode, RunState, Tuning};
use digi_defence_world::{query, World, WorldConfig};
use tracing_subscriber::EnvFilter;

use save_code::SaveCode;
use simulate::{SimulationOptions, TowerPlacement};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless Digi Defence simulation", long_about = None)]
struct Cli {
    /// TOML file overriding the built-in tuning tables.
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play seeded waves with a tower layout and print a summary.
    Simulate {
        /// Global seed for wave composition, shuffles and proc rolls.
        #[arg(long, default_value_t = WorldConfig::default().seed)]
        seed: u64,
        /// Number of waves to play.
        #[arg(long, default_value_t = 5)]
        waves: u32,
        /// Campaign or endless.
        #[arg(long, value_enum, default_value_t = Mode::Campaign)]
        mode: Mode,
        /// Tower to place before the first wave, as `digimon@column,row`.
        #[arg(long = "tower")]
        towers: Vec<TowerPlacement>,
        /// Simulation step in milliseconds.
        #[arg(long, default_value_t = 50)]
        frame_ms: u64,
        /// Give up on a wave after this many simulated seconds.
        #[arg(long, default_value_t = 600)]
        wave_timeout_secs: u64,
        /// Continue from a save code instead of a fresh run.
        #[arg(long)]
        from: Option<String>,
        /// Print every event.
        #[arg(long)]
        events: bool,
        /// Print a save code for the final state.
        #[arg(long)]
        save: bool,
    },
    /// Build a save code from explicit run values.
    EncodeRun {
        /// Currency held.
        #[arg(long, default_value_t = 300)]
        currency: u32,
        /// Lives left.
        #[arg(long, default_value_t = 20)]
        lives: u32,
        /// Last wave started.
        #[arg(long, default_value_t = 0)]
        wave: u32,
        /// Campaign or endless.
        #[arg(long, value_enum, default_value_t = Mode::Campaign)]
        mode: Mode,
        /// Tower to include, as `digimon@column,row`.
        #[arg(long = "tower")]
        towers: Vec<TowerPlacement>,
    },
    /// Print the contents of a save code as JSON.
    DecodeRun {
        /// Save code produced by `encode-run` or `simulate --save`.
        code: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Campaign,
    Endless,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Campaign => GameMode::Campaign,
            Mode::Endless => GameMode::Endless,
        }
    }
}

/// Entry point for the Digi Defence command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tuning = load_tuning(cli.tuning.as_ref())?;

    match cli.command {
        Cmd::Simulate {
            seed,
            waves,
            mode,
            towers,
            frame_ms,
            wave_timeout_secs,
            from,
            events,
            save,
        } => {
            let mut config = WorldConfig {
                seed,
                mode: mode.into(),
                ..WorldConfig::default()
            };
            let mut world = match from {
                Some(code) => {
                    let save = SaveCode::decode(&code).context("could not read --from save code")?;
                    config.mode = save.run.mode;
                    World::restore(config, tuning, save.run, &save.towers)
                }
                None => World::new(config, tuning),
            };
            println!("{}", query::welcome_banner(&world));

            let options = SimulationOptions {
                waves,
                frame: Duration::from_millis(frame_ms),
                wave_timeout: Duration::from_secs(wave_timeout_secs),
                print_events: events,
            };
            let report = simulate::run(&mut world, &towers, options);
            let run = query::run_state(&world);
            println!("{}", simulate::summary(&run, &report, &query::towers(&world)));

            if save {
                let code = SaveCode {
                    run,
                    towers: query::tower_records(&world),
                }
                .encode()?;
                println!("{code}");
            }
        }
        Cmd::EncodeRun {
            currency,
            lives,
            wave,
            mode,
            towers,
        } => {
            let mut run = RunState::new(currency, lives, mode.into());
            run.wave = wave;
            let config = WorldConfig {
                mode: run.mode,
                starting_currency: u32::MAX,
                ..WorldConfig::default()
            };
            let mut world = World::new(config, tuning);
            let report = simulate::run(
                &mut world,
                &towers,
                SimulationOptions {
                    waves: 0,
                    frame: Duration::ZERO,
                    wave_timeout: Duration::ZERO,
                    print_events: false,
                },
            );
            if report.rejections > 0 {
                anyhow::bail!("{} tower(s) could not be placed", report.rejections);
            }

            let code = SaveCode {
                run,
                towers: query::tower_records(&world),
            }
            .encode()?;
            println!("{code}");
        }
        Cmd::DecodeRun { code } => {
            let save = SaveCode::decode(&code).context("could not read save code")?;
            let json = serde_json::to_string_pretty(&save).context("could not format save")?;
            println!("{json}");
        }
    }

    Ok(())
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read tuning file {}", path.display()))?;
    let tuning: Tuning = toml::from_str(&text)
        .with_context(|| format!("could not parse tuning file {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded tuning overrides");
    Ok(tuning)
}
