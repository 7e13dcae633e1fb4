//! Labeled feature rows and their libsvm-style text encoding.
//!
//! A norm grid of side `H·L` is cut into H×H blocks of L×L cells. Each block
//! becomes one row in each of three parallel streams: the raw cell sums, the
//! high words and the low words of their split products. Row `i` of every
//! stream describes the same block under the same label.

use sdcgen_common::{FloatWidth, Result, SdcError};
use std::fmt::{self, Display};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::grid::{CellPartition, Grid};
use crate::split::split_grid_full;

/// Classifier label of an example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// `+1`
    Clean,
    /// `-1`
    Corrupted,
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "+1"),
            Self::Corrupted => write!(f, "-1"),
        }
    }
}

impl std::str::FromStr for Label {
    type Err = SdcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "+1" | "1" => Ok(Self::Clean),
            "-1" => Ok(Self::Corrupted),
            other => Err(SdcError::InvalidLabel(other.to_string())),
        }
    }
}

/// One block's features in the three streams.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow<F: FloatWidth> {
    pub label: Label,
    pub raw: Vec<F>,
    pub high: Vec<F::Signed>,
    pub low: Vec<F::Signed>,
}

/// Maps norm grids to feature rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEmitter {
    blocks: usize,
    block_cells: usize,
}

impl FeatureEmitter {
    /// `blocks` (H) rows per axis, each covering `block_cells` (L) cells per
    /// axis.
    pub fn new(blocks: usize, block_cells: usize) -> Result<Self> {
        if blocks == 0 || block_cells == 0 {
            return Err(SdcError::IndivisibleGrid { side: blocks * block_cells, cells: blocks });
        }
        Ok(Self { blocks, block_cells })
    }

    /// Side of the norm grid this emitter accepts.
    pub fn grid_side(&self) -> usize {
        self.blocks * self.block_cells
    }

    /// Features per row (L²).
    pub fn row_len(&self) -> usize {
        self.block_cells * self.block_cells
    }

    /// One row per block, blocks in row-major order, cells within a block in
    /// row-major order.
    pub fn emit<F: FloatWidth>(
        &self,
        norms: &Grid<F>,
        label: Label,
        multiplier: F::Signed,
    ) -> Result<Vec<FeatureRow<F>>> {
        norms.require_shape(self.grid_side(), self.grid_side())?;
        let partition = CellPartition::new(self.grid_side(), self.blocks)?;
        let (high, low) = split_grid_full(norms, multiplier);

        let rows: Vec<FeatureRow<F>> = partition
            .iter_cells()
            .map(|(bx, by)| {
                let bounds = partition.bounds(bx, by);
                let mut row = FeatureRow {
                    label,
                    raw: Vec::with_capacity(self.row_len()),
                    high: Vec::with_capacity(self.row_len()),
                    low: Vec::with_capacity(self.row_len()),
                };
                for r in bounds.rows {
                    let cols = bounds.cols.clone();
                    row.raw.extend_from_slice(&norms.row(r)[cols.clone()]);
                    row.high.extend_from_slice(&high.row(r)[cols.clone()]);
                    row.low.extend_from_slice(&low.row(r)[cols]);
                }
                row
            })
            .collect();

        debug!(rows = rows.len(), %label, "emitted feature rows");
        Ok(rows)
    }
}

/// Write one libsvm-style line: `<label> 1:<v1> 2:<v2> ... k:<vk>`.
pub fn write_line<W, T, I>(out: &mut W, label: impl Display, values: I) -> std::io::Result<()>
where
    W: Write + ?Sized,
    T: Display,
    I: IntoIterator<Item = T>,
{
    write!(out, "{label}")?;
    for (i, v) in values.into_iter().enumerate() {
        write!(out, " {}:{v}", i + 1)?;
    }
    writeln!(out)
}

/// Raw values are printed with six fractional digits.
struct Fixed6<F>(F);

impl<F: Display> Display for Fixed6<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// The three parallel output streams.
pub struct FeatureSink<W: Write> {
    raw: W,
    high: W,
    low: W,
    rows_written: usize,
}

impl<W: Write> FeatureSink<W> {
    pub fn new(raw: W, high: W, low: W) -> Self {
        Self { raw, high, low, rows_written: 0 }
    }

    /// Append `rows` to all three streams.
    pub fn write_rows<F: FloatWidth>(&mut self, rows: &[FeatureRow<F>]) -> Result<()> {
        for row in rows {
            write_line(&mut self.raw, row.label, row.raw.iter().map(|v| Fixed6(*v)))?;
            write_line(&mut self.high, row.label, row.high.iter())?;
            write_line(&mut self.low, row.label, row.low.iter())?;
        }
        self.rows_written += rows.len();
        Ok(())
    }

    /// Rows written to each stream so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.raw.flush()?;
        self.high.flush()?;
        self.low.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> (W, W, W) {
        (self.raw, self.high, self.low)
    }
}

impl FeatureSink<BufWriter<File>> {
    /// Open the three files in append mode, creating them if needed.
    pub fn append(raw: &Path, high: &Path, low: &Path) -> Result<Self> {
        let open = |path: &Path| -> Result<BufWriter<File>> {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(BufWriter::new(file))
        };
        Ok(Self::new(open(raw)?, open(high)?, open(low)?))
    }
}

/// Write `grid` as comma-separated rows.
pub fn write_grid_csv<T: Display, W: Write + ?Sized>(out: &mut W, grid: &Grid<T>) -> Result<()> {
    for row in grid.row_iter() {
        let line: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", line.join(", "))?;
    }
    Ok(())
}

/// Write `grid` as comma-separated rows to the file at `path`, truncating it.
pub fn dump_grid_csv<T: Display>(path: &Path, grid: &Grid<T>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_grid_csv(&mut out, grid)?;
    out.flush()?;
    Ok(())
}
