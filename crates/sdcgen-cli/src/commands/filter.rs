//! Tau filter over a libsvm feature file

use anyhow::{Context, Result};
use clap::Args;
use sdcgen_core::TauFilter;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Filter command arguments
#[derive(Args, Debug, Clone)]
pub struct FilterCommand {
    /// Feature file to filter
    #[arg(value_name = "INFILE")]
    pub input: PathBuf,

    /// Pairs whose largest relative difference reaches this value are dropped
    #[arg(value_name = "TAU")]
    pub tau: f64,

    /// Write survivors here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl FilterCommand {
    pub fn execute(&self) -> Result<()> {
        let filter = TauFilter::new(self.tau)?;
        let input = File::open(&self.input)
            .with_context(|| format!("Failed to open feature file: {}", self.input.display()))?;

        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create output: {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        filter
            .filter_stream(BufReader::new(input), &mut out)
            .with_context(|| format!("Failed to filter {}", self.input.display()))?;
        Ok(())
    }
}
