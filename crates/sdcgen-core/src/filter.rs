//! Relative-difference filter over paired clean / corrupted feature rows.
//!
//! The i-th clean row and the i-th corrupted row of a feature file are
//! compared feature by feature. A pair whose largest relative difference
//! `|p - n| / |p|` reaches `tau` is dropped from both sides; what remains is
//! written back with corrupted rows first.

use sdcgen_common::{Result, SdcError};
use std::fmt;
use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::features::{write_line, Label};

/// One parsed libsvm line.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledVector {
    /// 1-based line the vector was read from.
    pub line: usize,
    pub label: Label,
    pub values: Vec<f64>,
}

/// Parse `<label> k:v k:v ...`. Feature indices are ignored; values are
/// taken in the order written. Any label starting with `-1` is corrupted,
/// everything else clean.
pub fn parse_line(line: &str, line_no: usize) -> Result<LabeledVector> {
    let mut tokens = line.split_whitespace();
    let label_token = tokens
        .next()
        .ok_or_else(|| SdcError::Parse { line: line_no, reason: "empty line".into() })?;
    let label = if label_token.starts_with("-1") { Label::Corrupted } else { Label::Clean };

    let values = tokens
        .map(|token| {
            let (_, value) = token.split_once(':').ok_or_else(|| SdcError::Parse {
                line: line_no,
                reason: format!("feature '{token}' is not of the form index:value"),
            })?;
            value.parse::<f64>().map_err(|e| SdcError::Parse {
                line: line_no,
                reason: format!("feature '{token}': {e}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LabeledVector { line: line_no, label, values })
}

/// Largest relative difference between a clean and a corrupted vector of
/// the same length.
///
/// A zero clean feature contributes nothing when the corrupted feature is
/// also zero and an infinite difference otherwise.
pub fn max_relative_difference(clean: &[f64], corrupted: &[f64]) -> f64 {
    clean
        .iter()
        .zip(corrupted)
        .map(|(&p, &n)| {
            let diff = (p - n).abs();
            if p == 0.0 {
                if diff == 0.0 { 0.0 } else { f64::INFINITY }
            } else {
                diff / p.abs()
            }
        })
        .fold(0.0, f64::max)
}

/// Shortest round-trip form that always carries a decimal point or an
/// exponent (`1.0`, `2.5`, `1e-7`).
struct FloatRepr(f64);

impl fmt::Display for FloatRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Summary of one filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterSummary {
    pub pairs: usize,
    pub dropped: usize,
}

impl FilterSummary {
    pub fn kept(&self) -> usize {
        self.pairs - self.dropped
    }
}

/// Drops clean / corrupted pairs that differ by at least `tau`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TauFilter {
    tau: f64,
}

impl TauFilter {
    pub fn new(tau: f64) -> Result<Self> {
        if tau.is_nan() {
            return Err(SdcError::Parse { line: 0, reason: "tau must be a number".into() });
        }
        Ok(Self { tau })
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Whether the pair differs by at least `tau`.
    pub fn rejects(&self, clean: &[f64], corrupted: &[f64]) -> bool {
        max_relative_difference(clean, corrupted) >= self.tau
    }

    /// Filter paired rows; the i-th clean row pairs with the i-th corrupted
    /// row. The two counts must match, and so must the feature counts of
    /// every pair. Nothing is dropped unless every pair is well formed.
    pub fn apply(
        &self,
        clean: Vec<LabeledVector>,
        corrupted: Vec<LabeledVector>,
    ) -> Result<(Vec<LabeledVector>, Vec<LabeledVector>, FilterSummary)> {
        if clean.len() != corrupted.len() {
            return Err(SdcError::ShapeMismatch {
                expected: format!("{} corrupted rows to pair with the clean rows", clean.len()),
                actual: format!("{} corrupted rows", corrupted.len()),
            });
        }
        let mismatched = clean.iter().zip(&corrupted).find(|(p, n)| p.values.len() != n.values.len());
        if let Some((p, n)) = mismatched {
            return Err(SdcError::ShapeMismatch {
                expected: format!("{} features (clean row, line {})", p.values.len(), p.line),
                actual: format!("{} features (corrupted row, line {})", n.values.len(), n.line),
            });
        }

        let mut summary = FilterSummary { pairs: clean.len(), dropped: 0 };
        let mut kept_clean = Vec::with_capacity(clean.len());
        let mut kept_corrupted = Vec::with_capacity(corrupted.len());
        for (p, n) in clean.into_iter().zip(corrupted) {
            if self.rejects(&p.values, &n.values) {
                summary.dropped += 1;
            } else {
                kept_clean.push(p);
                kept_corrupted.push(n);
            }
        }
        Ok((kept_clean, kept_corrupted, summary))
    }

    /// Read a feature file from `input`, filter it, and write survivors to
    /// `output`: corrupted rows (`-1`) first, then clean rows (`+1`).
    pub fn filter_stream<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<FilterSummary> {
        let mut clean = Vec::new();
        let mut corrupted = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parse_line(&line, i + 1)?;
            match parsed.label {
                Label::Clean => clean.push(parsed),
                Label::Corrupted => corrupted.push(parsed),
            }
        }
        debug!(clean = clean.len(), corrupted = corrupted.len(), "parsed feature file");

        let (clean, corrupted, summary) = self.apply(clean, corrupted)?;
        for row in &corrupted {
            write_line(output, Label::Corrupted, row.values.iter().map(|&v| FloatRepr(v)))?;
        }
        for row in &clean {
            write_line(output, Label::Clean, row.values.iter().map(|&v| FloatRepr(v)))?;
        }
        output.flush()?;

        info!(tau = self.tau, pairs = summary.pairs, dropped = summary.dropped, "tau filter complete");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line() {
        let parsed = parse_line("+1 1:0.5 2:-3 3:7", 1).unwrap();
        assert_eq!(parsed.label, Label::Clean);
        assert_eq!(parsed.values, vec![0.5, -3.0, 7.0]);

        let parsed = parse_line("-1 1:2", 2).unwrap();
        assert_eq!(parsed.label, Label::Corrupted);
        assert_eq!(parsed.line, 2);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(parse_line("+1 1:abc", 4), Err(SdcError::Parse { line: 4, .. })));
        assert!(parse_line("+1 7", 1).is_err());
        assert!(parse_line("   ", 1).is_err());
    }

    #[test]
    fn test_relative_difference() {
        assert_eq!(max_relative_difference(&[2.0, 4.0], &[2.0, 5.0]), 0.25);
        assert_eq!(max_relative_difference(&[0.0], &[0.0]), 0.0);
        assert_eq!(max_relative_difference(&[0.0], &[1.0]), f64::INFINITY);
        assert_eq!(max_relative_difference(&[-2.0], &[-1.0]), 0.5);
    }

    fn rows(label: Label, first_line: usize, values: Vec<Vec<f64>>) -> Vec<LabeledVector> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, values)| LabeledVector { line: first_line + i, label, values })
            .collect()
    }

    #[test]
    fn test_apply_drops_pairs() {
        let filter = TauFilter::new(0.5).unwrap();
        let clean = rows(Label::Clean, 1, vec![vec![1.0, 1.0], vec![10.0]]);
        let corrupted = rows(Label::Corrupted, 3, vec![vec![1.0, 1.6], vec![10.1]]);
        let (kept_clean, kept_corrupted, summary) = filter.apply(clean, corrupted).unwrap();
        assert_eq!(kept_clean.len(), 1);
        assert_eq!(kept_clean[0].values, vec![10.0]);
        assert_eq!(kept_corrupted[0].values, vec![10.1]);
        assert_eq!(summary, FilterSummary { pairs: 2, dropped: 1 });
        assert_eq!(summary.kept(), 1);
    }

    #[test]
    fn test_apply_requires_matching_counts() {
        let filter = TauFilter::new(0.1).unwrap();
        assert!(filter.apply(rows(Label::Clean, 1, vec![vec![1.0]]), vec![]).is_err());
    }

    #[test]
    fn test_apply_rejects_feature_count_mismatch() {
        let filter = TauFilter::new(0.1).unwrap();
        let clean = rows(Label::Clean, 1, vec![vec![1.0], vec![1.0, 2.0]]);
        let corrupted = rows(Label::Corrupted, 3, vec![vec![1.0], vec![1.0]]);
        match filter.apply(clean, corrupted) {
            Err(SdcError::ShapeMismatch { expected, actual }) => {
                assert!(expected.contains("line 2"), "{expected}");
                assert!(actual.contains("line 4"), "{actual}");
            }
            other => panic!("expected a shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_stream_rejects_truncated_row() {
        let input = "+1 1:1 2:2
-1 1:1
";
        let mut out = Vec::new();
        let result = TauFilter::new(10.0).unwrap().filter_stream(Cursor::new(input), &mut out);
        assert!(matches!(result, Err(SdcError::ShapeMismatch { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_stream_orders_corrupted_first() {
        let input = "+1 1:1 2:2\n\n-1 1:1 2:2.1\n+1 1:4\n-1 1:40\n";
        let mut out = Vec::new();
        let summary = TauFilter::new(0.5)
            .unwrap()
            .filter_stream(Cursor::new(input), &mut out)
            .unwrap();

        assert_eq!(summary, FilterSummary { pairs: 2, dropped: 1 });
        assert_eq!(String::from_utf8(out).unwrap(), "-1 1:1.0 2:2.1\n+1 1:1.0 2:2.0\n");
    }

    #[test]
    fn test_float_repr_keeps_decimal_point() {
        assert_eq!(FloatRepr(1.0).to_string(), "1.0");
        assert_eq!(FloatRepr(-3.0).to_string(), "-3.0");
        assert_eq!(FloatRepr(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_nan_tau_rejected() {
        assert!(TauFilter::new(f64::NAN).is_err());
    }
}
