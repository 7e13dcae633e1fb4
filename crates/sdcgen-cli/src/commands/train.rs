//! Training-data generation command

use anyhow::{Context, Result};
use clap::Args;
use sdcgen_common::{BitWidth, GenerationConfig};
use std::path::PathBuf;
use tracing::info;

/// Train command arguments. Every flag overrides the matching value of the
/// configuration file.
#[derive(Args, Debug, Default, Clone)]
pub struct TrainCommand {
    /// Float width (f32, f64)
    #[arg(long, value_name = "WIDTH")]
    pub width: Option<BitWidth>,

    /// Scalar function index (0 = sin, 1 = cos)
    #[arg(long, value_name = "N")]
    pub function: Option<usize>,

    /// Lower bound of the input domain
    #[arg(long, value_name = "X", allow_negative_numbers = true)]
    pub low: Option<f64>,

    /// Upper bound of the input domain
    #[arg(long, value_name = "X", allow_negative_numbers = true)]
    pub high: Option<f64>,

    /// Blocks per axis; one feature row per block
    #[arg(long, value_name = "H")]
    pub blocks: Option<usize>,

    /// Aggregation cells per block per axis
    #[arg(long, value_name = "L")]
    pub block_cells: Option<usize>,

    /// Side of the fine input grid
    #[arg(long, value_name = "A")]
    pub side: Option<usize>,

    /// Lowest bit eligible for a flip
    #[arg(long, value_name = "BIT")]
    pub low_bit: Option<u32>,

    /// Highest bit eligible for a flip
    #[arg(long, value_name = "BIT")]
    pub high_bit: Option<u32>,

    /// Total number of faults, spread over the blocks
    #[arg(long, value_name = "N")]
    pub fault_count: Option<usize>,

    /// Integer multiplier applied before splitting
    #[arg(long, value_name = "M", allow_negative_numbers = true)]
    pub multiplier: Option<i64>,

    /// RNG seed; a random one is drawn and logged when absent
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Raw feature file
    #[arg(long, value_name = "PATH")]
    pub raw: Option<PathBuf>,

    /// High-word feature file
    #[arg(long, value_name = "PATH")]
    pub high_out: Option<PathBuf>,

    /// Low-word feature file
    #[arg(long, value_name = "PATH")]
    pub low_out: Option<PathBuf>,

    /// Directory for CSV dumps of the norm grids
    #[arg(long, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,
}

impl TrainCommand {
    /// Merge the flags over `base` and validate the result.
    pub fn resolve(&self, mut base: GenerationConfig) -> Result<GenerationConfig> {
        macro_rules! merge {
            ($($flag:ident => $($field:ident).+),* $(,)?) => {
                $(if let Some(value) = &self.$flag {
                    base.$($field).+ = value.clone();
                })*
            };
        }
        merge! {
            width => width,
            function => function,
            low => input_low,
            high => input_high,
            blocks => blocks,
            block_cells => block_cells,
            side => side,
            low_bit => fault_low_bit,
            high_bit => fault_high_bit,
            fault_count => fault_count,
            multiplier => multiplier,
            raw => output.raw,
            high_out => output.high,
            low_out => output.low,
        }
        if self.seed.is_some() {
            base.seed = self.seed;
        }
        if self.dump_dir.is_some() {
            base.output.dump_dir = self.dump_dir.clone();
        }

        base.validate().context("Invalid generation configuration")?;
        Ok(base)
    }

    pub fn execute(&self, base: GenerationConfig) -> Result<()> {
        let config = self.resolve(base)?;
        let report = sdcgen_core::run(&config).context("Generation failed")?;
        info!(
            width = %report.width,
            seed = report.seed,
            rows = report.rows_written,
            faults = report.faults_injected,
            raw = %config.output.raw.display(),
            "training data written"
        );
        Ok(())
    }
}
