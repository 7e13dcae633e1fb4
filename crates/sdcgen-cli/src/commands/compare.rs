//! One-dimensional clean vs. corrupted comparison report

use anyhow::{Context, Result};
use clap::Args;
use sdcgen_common::{BitWidth, FloatWidth};
use sdcgen_core::compare::write_csv;
use sdcgen_core::{compare, seeded_rng, CompareParams, ScalarFunction};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// Compare command arguments
#[derive(Args, Debug, Clone)]
pub struct CompareCommand {
    /// Scalar function index (0 = sin, 1 = cos)
    #[arg(long, value_name = "N")]
    pub function: usize,

    /// Lower bound of the input ramp
    #[arg(long, value_name = "X", allow_negative_numbers = true)]
    pub low: f64,

    /// Upper bound of the input ramp (exclusive)
    #[arg(long, value_name = "X", allow_negative_numbers = true)]
    pub high: f64,

    /// Number of samples
    #[arg(long, value_name = "N")]
    pub steps: usize,

    /// Lowest bit eligible for a flip
    #[arg(long, value_name = "BIT")]
    pub low_bit: u32,

    /// Highest bit eligible for a flip
    #[arg(long, value_name = "BIT")]
    pub high_bit: u32,

    /// Number of distinct samples to corrupt
    #[arg(long, value_name = "N")]
    pub fault_count: usize,

    /// Integer multiplier applied before splitting
    #[arg(long, value_name = "M", allow_negative_numbers = true)]
    pub multiplier: i64,

    /// Float width (f32, f64)
    #[arg(long, value_name = "WIDTH", default_value_t = BitWidth::F32)]
    pub width: BitWidth,

    /// RNG seed; a random one is drawn and logged when absent
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl CompareCommand {
    pub fn params(&self) -> Result<CompareParams> {
        Ok(CompareParams {
            function: ScalarFunction::from_index(self.function)?,
            low: self.low,
            high: self.high,
            steps: self.steps,
            fault_low_bit: self.low_bit,
            fault_high_bit: self.high_bit,
            fault_count: self.fault_count,
            multiplier: self.multiplier,
        })
    }

    pub fn execute(&self) -> Result<()> {
        let params = self.params()?;
        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create report: {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        match self.width {
            BitWidth::F32 => self.report::<f32>(&params, &mut out)?,
            BitWidth::F64 => self.report::<f64>(&params, &mut out)?,
        }
        out.flush()?;
        Ok(())
    }

    fn report<F: FloatWidth>(&self, params: &CompareParams, out: &mut dyn Write) -> Result<()> {
        let (mut rng, seed) = seeded_rng(self.seed);
        info!(seed, width = %F::WIDTH, "starting comparison");
        let rows = compare::<F, _>(params, &mut rng).context("Comparison failed")?;
        write_csv(out, &rows)?;
        Ok(())
    }
}
