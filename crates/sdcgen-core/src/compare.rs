//! Element-wise clean vs. corrupted report over a one-dimensional ramp.

use rand::Rng;
use sdcgen_common::{FloatWidth, Result};
use std::io::Write;
use tracing::info;

use crate::fault::{FaultInjector, FaultRecord};
use crate::input::{generate_ramp, map_values, ScalarFunction};
use crate::split::{multiplier_for, split, SplitWord};

/// Parameters of a comparison run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareParams {
    pub function: ScalarFunction,
    pub low: f64,
    pub high: f64,
    pub steps: usize,
    pub fault_low_bit: u32,
    pub fault_high_bit: u32,
    pub fault_count: usize,
    pub multiplier: i64,
}

/// One element of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRow<F: FloatWidth> {
    pub input: F,
    pub clean: F,
    pub corrupted: F,
    /// Flipped bit, [`FaultRecord::NO_FAULT`] if untouched.
    pub fault_bit: i64,
    pub clean_split: SplitWord<F::Signed>,
    pub corrupted_split: SplitWord<F::Signed>,
}

/// Column header of the CSV report.
pub const CSV_HEADER: &str = "input, x, x', sdc_tainted, y_hi, y'_hi, y_lo, y'_lo";

/// Run the comparison and return one row per input sample.
pub fn compare<F: FloatWidth, R: Rng + ?Sized>(
    params: &CompareParams,
    rng: &mut R,
) -> Result<Vec<CompareRow<F>>> {
    let multiplier = multiplier_for::<F>(params.multiplier)?;
    let injector = FaultInjector::<F>::new(params.fault_low_bit, params.fault_high_bit)?;
    let inputs = generate_ramp(F::from_f64(params.low), F::from_f64(params.high), params.steps)?;
    let clean = map_values(&inputs, |x| params.function.apply(x));
    let (corrupted, record) = injector.inject(&clean, params.fault_count, rng)?;

    info!(
        function = %params.function,
        steps = params.steps,
        faults = record.fault_count(),
        "compared clean and corrupted values"
    );

    Ok(inputs
        .iter()
        .zip(&clean)
        .zip(&corrupted)
        .enumerate()
        .map(|(i, ((&input, &x), &xp))| CompareRow {
            input,
            clean: x,
            corrupted: xp,
            fault_bit: record.code(i),
            clean_split: split(x, multiplier),
            corrupted_split: split(xp, multiplier),
        })
        .collect())
}

/// Write `rows` as CSV under [`CSV_HEADER`].
pub fn write_csv<F: FloatWidth, W: Write + ?Sized>(out: &mut W, rows: &[CompareRow<F>]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for row in rows {
        writeln!(
            out,
            "{:.6}, {:.6}, {:.6}, {}, {}, {}, {}, {}",
            row.input,
            row.clean,
            row.corrupted,
            row.fault_bit,
            row.clean_split.high,
            row.corrupted_split.high,
            row.clean_split.low,
            row.corrupted_split.low
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitcast;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params() -> CompareParams {
        CompareParams {
            function: ScalarFunction::Sin,
            low: 0.0,
            high: 1.0,
            steps: 10,
            fault_low_bit: 0,
            fault_high_bit: 0,
            fault_count: 3,
            multiplier: 1,
        }
    }

    #[test]
    fn test_compare_marks_faulted_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let rows = compare::<f32, _>(&params(), &mut rng).unwrap();
        assert_eq!(rows.len(), 10);

        let faulted: Vec<_> = rows.iter().filter(|r| r.fault_bit >= 0).collect();
        assert_eq!(faulted.len(), 3);
        for row in &rows {
            let diff = bitcast::to_bits(row.clean) ^ bitcast::to_bits(row.corrupted);
            if row.fault_bit == FaultRecord::NO_FAULT {
                assert_eq!(diff, 0);
                assert_eq!(row.clean_split, row.corrupted_split);
            } else {
                assert_eq!(diff, 1);
            }
        }
    }

    #[test]
    fn test_compare_rejects_bad_bits() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let p = CompareParams { fault_high_bit: 64, ..params() };
        assert!(compare::<f64, _>(&p, &mut rng).is_err());
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = CompareParams { fault_count: 0, steps: 2, ..params() };
        let rows = compare::<f32, _>(&p, &mut rng).unwrap();
        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADER);
        assert_eq!(lines.next().unwrap(), "0.000000, 0.000000, 0.000000, -1, 0, 0, 0, 0");
        assert_eq!(lines.count(), 1);
    }
}
