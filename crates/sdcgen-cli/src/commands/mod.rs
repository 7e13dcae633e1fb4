//! CLI command implementations

pub mod compare;
pub mod config;
pub mod filter;
pub mod train;

pub use compare::CompareCommand;
pub use config::ConfigAction;
pub use filter::FilterCommand;
pub use train::TrainCommand;

use anyhow::{Context, Result};
use sdcgen_common::GenerationConfig;
use std::path::Path;

/// Read the configuration file (or start from defaults) and apply the
/// `SDCGEN_*` environment overrides. Validation is left to the caller so
/// command-line flags can still be merged in first.
pub fn load_base(path: Option<&Path>) -> Result<GenerationConfig> {
    let mut config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<GenerationConfig>(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => GenerationConfig::default(),
    };
    config.apply_env_overrides().context("Failed to apply environment overrides")?;
    Ok(config)
}
