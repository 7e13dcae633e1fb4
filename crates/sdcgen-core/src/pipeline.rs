//! Clean and corrupted generation passes.
//!
//! One run builds the input grid, applies the scalar function, aggregates
//! and emits the clean rows, then injects faults into a copy of the mapped
//! grid and emits the corrupted rows from it. The grid is owned here and
//! lent to each stage in turn.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sdcgen_common::{BitWidth, FloatWidth, GenerationConfig, Result, SdcError};
use std::path::Path;
use tracing::{info, info_span};

use crate::aggregate::aggregate;
use crate::fault::{FaultInjector, FaultRecord};
use crate::features::{dump_grid_csv, FeatureEmitter, FeatureRow, FeatureSink, Label};
use crate::grid::Grid;
use crate::input::{generate_grid, map_grid, ScalarFunction};
use crate::split::{multiplier_for, split_grid_full};

/// Norms and feature rows of one pass.
#[derive(Debug, Clone)]
pub struct GenerationPass<F: FloatWidth> {
    pub label: Label,
    pub norms: Grid<F>,
    pub rows: Vec<FeatureRow<F>>,
}

/// Both passes of one run.
#[derive(Debug, Clone)]
pub struct GeneratedExamples<F: FloatWidth> {
    pub clean: GenerationPass<F>,
    pub corrupted: GenerationPass<F>,
    /// Faults injected into the fine grid, indexed row-major.
    pub faults: FaultRecord,
}

/// Outcome of a run that wrote its rows to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub width: BitWidth,
    pub seed: u64,
    pub rows_written: usize,
    pub faults_injected: usize,
}

/// A ChaCha8 generator and the seed it was built from. Without an explicit
/// seed one is drawn from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> (ChaCha8Rng, u64) {
    let seed = seed.unwrap_or_else(rand::random);
    (ChaCha8Rng::seed_from_u64(seed), seed)
}

/// Run both passes in memory with a caller-supplied scalar function.
pub fn generate<F, R>(
    config: &GenerationConfig,
    function: impl Fn(F) -> F,
    rng: &mut R,
) -> Result<GeneratedExamples<F>>
where
    F: FloatWidth,
    R: Rng + ?Sized,
{
    config.validate()?;
    if config.width != F::WIDTH {
        return Err(SdcError::InvalidWidth(format!(
            "configuration selects {} but the pipeline was instantiated for {}",
            config.width,
            F::WIDTH
        )));
    }

    let multiplier = multiplier_for::<F>(config.multiplier)?;
    let injector = FaultInjector::<F>::new(config.fault_low_bit, config.fault_high_bit)?;
    let emitter = FeatureEmitter::new(config.blocks, config.block_cells)?;
    let cells = config.cell_count();

    let input = generate_grid(F::from_f64(config.input_low), F::from_f64(config.input_high), config.side)?;
    let clean = map_grid(&input, function);
    drop(input);

    let clean_norms = aggregate(&clean, cells)?;
    let clean_rows = emitter.emit(&clean_norms, Label::Clean, multiplier)?;
    info!(rows = clean_rows.len(), "clean pass complete");

    let mut corrupted = clean;
    let faults = injector.inject_grid(&mut corrupted, config.blocks, config.fault_count, rng)?;
    let corrupt_norms = aggregate(&corrupted, cells)?;
    let corrupt_rows = emitter.emit(&corrupt_norms, Label::Corrupted, multiplier)?;
    info!(rows = corrupt_rows.len(), faults = faults.fault_count(), "corrupted pass complete");

    Ok(GeneratedExamples {
        clean: GenerationPass { label: Label::Clean, norms: clean_norms, rows: clean_rows },
        corrupted: GenerationPass { label: Label::Corrupted, norms: corrupt_norms, rows: corrupt_rows },
        faults,
    })
}

/// Write the CSV dumps of one pass's norm grid and its split words.
fn dump_pass<F: FloatWidth>(dir: &Path, pass: &GenerationPass<F>, multiplier: F::Signed) -> Result<()> {
    let prefix = match pass.label {
        Label::Clean => "clean",
        Label::Corrupted => "corrupt",
    };
    let (high, low) = split_grid_full(&pass.norms, multiplier);
    dump_grid_csv(&dir.join(format!("{prefix}_norms.csv")), &pass.norms)?;
    dump_grid_csv(&dir.join(format!("{prefix}_high.csv")), &high)?;
    dump_grid_csv(&dir.join(format!("{prefix}_low.csv")), &low)?;
    Ok(())
}

/// Run both passes for width `F` and append the rows to the configured
/// files.
pub fn run_with<F: FloatWidth>(config: &GenerationConfig, seed: Option<u64>) -> Result<GenerationReport> {
    let function = ScalarFunction::from_index(config.function)?;
    let (mut rng, seed) = seeded_rng(seed);
    info!(seed, width = %F::WIDTH, %function, "starting generation");

    let examples = generate::<F, _>(config, |x| function.apply(x), &mut rng)?;

    let mut sink = FeatureSink::append(&config.output.raw, &config.output.high, &config.output.low)?;
    sink.write_rows(&examples.clean.rows)?;
    sink.write_rows(&examples.corrupted.rows)?;
    sink.flush()?;

    if let Some(dir) = &config.output.dump_dir {
        std::fs::create_dir_all(dir)?;
        let multiplier = multiplier_for::<F>(config.multiplier)?;
        dump_pass(dir, &examples.clean, multiplier)?;
        dump_pass(dir, &examples.corrupted, multiplier)?;
        info!(dir = %dir.display(), "wrote grid dumps");
    }

    Ok(GenerationReport {
        width: F::WIDTH,
        seed,
        rows_written: sink.rows_written(),
        faults_injected: examples.faults.fault_count(),
    })
}

/// Run the configured generation at the configured width.
pub fn run(config: &GenerationConfig) -> Result<GenerationReport> {
    let span = info_span!("generate", width = %config.width);
    let _guard = span.enter();
    match config.width {
        BitWidth::F32 => run_with::<f32>(config, config.seed),
        BitWidth::F64 => run_with::<f64>(config, config.seed),
    }
}
