//! Configuration inspection

use anyhow::{Context, Result};
use clap::Subcommand;
use sdcgen_common::GenerationConfig;
use tracing::warn;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus environment overrides)
    Show,
    /// Print the default configuration
    Default,
}

impl ConfigAction {
    pub fn render(&self, config: &GenerationConfig) -> Result<String> {
        match self {
            Self::Show => {
                if let Err(e) = config.validate() {
                    warn!("configuration will be rejected by train: {e}");
                }
                toml::to_string_pretty(config).context("Failed to serialize configuration")
            }
            Self::Default => Ok(GenerationConfig::default_toml()),
        }
    }

    pub fn execute(&self, config: &GenerationConfig) -> Result<()> {
        print!("{}", self.render(config)?);
        Ok(())
    }
}
