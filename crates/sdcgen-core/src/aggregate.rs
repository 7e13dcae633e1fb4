//! Reduction of a fine grid to coarse cell sums ("norms").
//!
//! A norm here is the unnormalised sum of the signed values inside one cell,
//! accumulated in the grid's own float width in row-major order so the result
//! is reproducible for a fixed input.

use sdcgen_common::{FloatWidth, Result};
use tracing::debug;

use crate::grid::{CellPartition, Grid};

/// Sum of the values of `grid` inside cell `(cx, cy)` of `partition`.
pub fn cell_sum<F: FloatWidth>(grid: &Grid<F>, partition: &CellPartition, cx: usize, cy: usize) -> F {
    let bounds = partition.bounds(cx, cy);
    let mut sum = F::default();
    for r in bounds.rows {
        for &v in &grid.row(r)[bounds.cols.clone()] {
            sum = sum + v;
        }
    }
    sum
}

/// Reduce an A×A grid to the G×G grid of its cell sums.
pub fn aggregate<F: FloatWidth>(grid: &Grid<F>, cells: usize) -> Result<Grid<F>> {
    let partition = CellPartition::of(grid, cells)?;
    let norms = Grid::from_fn(cells, cells, |cx, cy| cell_sum(grid, &partition, cx, cy));
    debug!(side = partition.side(), cells, cell_width = partition.cell_width(), "aggregated grid");
    Ok(norms)
}
