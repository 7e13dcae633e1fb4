//! sdcgen CLI application
//!
//! Generates labeled clean / corrupted training data for silent data
//! corruption detectors, and post-processes the resulting feature files.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sdcgen_common::{GenerationConfig, LogFormat};
use std::io;
use std::path::PathBuf;
use tracing::error;

use sdcgen_cli::commands::{self, CompareCommand, ConfigAction, FilterCommand, TrainCommand};
use sdcgen_cli::exit::{EXIT_GENERIC_FAIL, EXIT_SUCCESS};
use sdcgen_cli::logging;

/// sdcgen - silent data corruption training-data generator
#[derive(Parser)]
#[command(name = "sdcgen")]
#[command(about = "Synthesize labeled SDC training data")]
#[command(long_about = r#"
sdcgen evaluates a scalar function over a grid, aggregates it into cell
sums, and emits the bit-level split of each sum as libsvm feature rows:
once from the clean grid (label +1) and once after random single-bit
faults (label -1).

Examples:
  # Generate with defaults, appending to features_{raw,high,low}.txt
  sdcgen train

  # Reproducible 64-bit run from a config file
  sdcgen --config sdcgen.toml train --width f64 --seed 42

  # Compare clean and corrupted values over a ramp
  sdcgen compare --function 0 --low 0 --high 1 --steps 10 \
      --low-bit 0 --high-bit 22 --fault-count 3 --multiplier 3

  # Drop pairs that differ by 5% or more
  sdcgen filter features_raw.txt 0.05
"#)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate clean and corrupted feature rows
    #[command(alias = "gen")]
    Train(TrainCommand),

    /// Print a clean vs. corrupted CSV report over a 1-D ramp
    Compare(CompareCommand),

    /// Drop clean/corrupted pairs whose relative difference reaches tau
    Filter(FilterCommand),

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        std::process::exit(EXIT_SUCCESS);
    }

    let base = commands::load_base(cli.config.as_deref());
    let file_logging = base.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    let log_config = logging::resolve(&file_logging, cli.log_level.as_deref(), cli.log_format);
    if let Err(e) = logging::setup_logging(&log_config) {
        eprintln!("Error: {e:#}");
        std::process::exit(EXIT_GENERIC_FAIL);
    }

    let result = base.and_then(|base| dispatch(cli.command, base));

    if let Err(e) = result {
        error!("Command failed: {}", e);
        for cause in e.chain().skip(1) {
            error!("  Caused by: {}", cause);
        }
        std::process::exit(EXIT_GENERIC_FAIL);
    }
}

fn dispatch(command: Option<Commands>, base: GenerationConfig) -> Result<()> {
    match command {
        Some(Commands::Train(cmd)) => cmd.execute(base),
        Some(Commands::Compare(cmd)) => cmd.execute(),
        Some(Commands::Filter(cmd)) => cmd.execute(),
        Some(Commands::Config { action }) => action.execute(&base),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
