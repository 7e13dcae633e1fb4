//! Dense two-dimensional grids and their partitions.

use sdcgen_common::{Result, SdcError};
use std::ops::{Index, IndexMut, Range};

/// Row-major grid with dimensions fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a `rows`×`cols` grid filled with `fill`.
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self { rows, cols, data: vec![fill; rows * cols] }
    }

    /// Create a `side`×`side` grid filled with `fill`.
    pub fn square(side: usize, fill: T) -> Self {
        Self::new(side, side, fill)
    }

    /// Build a grid from nested rows. Ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(SdcError::ShapeMismatch {
                    expected: format!("{cols} columns"),
                    actual: format!("{} columns in row {i}", row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self { rows: n_rows, cols, data })
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.row_iter().map(<[T]>::to_vec).collect()
    }
}

impl<T> Grid<T> {
    /// Build a grid by evaluating `f(row, col)` in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Wrap a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(SdcError::ShapeMismatch {
                expected: format!("{} values for {rows}x{cols}", rows * cols),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Side length if the grid is square.
    pub fn side(&self) -> Option<usize> {
        (self.rows == self.cols).then_some(self.rows)
    }

    /// Require a square grid and return its side.
    pub fn require_square(&self) -> Result<usize> {
        self.side().ok_or_else(|| SdcError::ShapeMismatch {
            expected: "square grid".to_string(),
            actual: format!("{}x{}", self.rows, self.cols),
        })
    }

    /// Require identical dimensions.
    pub fn require_shape(&self, rows: usize, cols: usize) -> Result<()> {
        if self.rows != rows || self.cols != cols {
            return Err(SdcError::ShapeMismatch {
                expected: format!("{rows}x{cols}"),
                actual: format!("{}x{}", self.rows, self.cols),
            });
        }
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        (row < self.rows && col < self.cols).then(|| &self.data[row * self.cols + col])
    }

    /// Flat row-major index of `(row, col)`.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_iter(&self) -> impl Iterator<Item = &[T]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Apply `f` element-wise into a new grid of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid { rows: self.rows, cols: self.cols, data: self.data.iter().map(f).collect() }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.rows && col < self.cols, "grid index ({row}, {col}) out of bounds");
        &self.data[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(row < self.rows && col < self.cols, "grid index ({row}, {col}) out of bounds");
        &mut self.data[row * self.cols + col]
    }
}

/// Rectangular, non-empty window into a parent grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRegion {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl SubRegion {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    /// Reject regions that are empty or leave a `rows`×`cols` parent.
    pub fn check_within(&self, rows: usize, cols: usize) -> Result<()> {
        let valid = self.rows.start < self.rows.end
            && self.cols.start < self.cols.end
            && self.rows.end <= rows
            && self.cols.end <= cols;
        if !valid {
            return Err(SdcError::RegionOutOfBounds {
                row_start: self.rows.start,
                row_end: self.rows.end,
                col_start: self.cols.start,
                col_end: self.cols.end,
                rows,
                cols,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition of an A×A grid into G×G equal square cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPartition {
    side: usize,
    cells: usize,
    width: usize,
}

impl CellPartition {
    /// Requires `cells > 0` and `side % cells == 0`.
    pub fn new(side: usize, cells: usize) -> Result<Self> {
        if cells == 0 || side == 0 || side % cells != 0 {
            return Err(SdcError::IndivisibleGrid { side, cells });
        }
        Ok(Self { side, cells, width: side / cells })
    }

    /// Partition a square grid.
    pub fn of<T>(grid: &Grid<T>, cells: usize) -> Result<Self> {
        Self::new(grid.require_square()?, cells)
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Cells per axis (G).
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Side of one cell (A/G).
    pub fn cell_width(&self) -> usize {
        self.width
    }

    /// Elements per cell.
    pub fn cell_population(&self) -> usize {
        self.width * self.width
    }

    /// Half-open index ranges covered by cell `(cx, cy)`.
    pub fn bounds(&self, cx: usize, cy: usize) -> SubRegion {
        SubRegion {
            rows: cx * self.width..(cx + 1) * self.width,
            cols: cy * self.width..(cy + 1) * self.width,
        }
    }

    /// Cell coordinates in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let cells = self.cells;
        (0..cells).flat_map(move |cx| (0..cells).map(move |cy| (cx, cy)))
    }
}
