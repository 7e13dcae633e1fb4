//! Randomised single-bit fault injection.
//!
//! Each injected fault flips exactly one bit, within a configured bit range,
//! of one value. A position is never faulted twice: a draw that lands on an
//! already-faulted position is discarded and redrawn, so a budget of `n`
//! always yields `n` distinct corrupted positions.
//!
//! The injector mutates the values it is handed and keeps its collision
//! bookkeeping in a [`FaultRecord`]; callers that share a value array across
//! threads must hand each worker a disjoint slice.

use rand::Rng;
use sdcgen_common::{FloatWidth, Result, SdcError};
use std::marker::PhantomData;
use tracing::{debug, trace};

use crate::bitcast;
use crate::grid::{CellPartition, Grid};

/// Flip bit `bit` of `value`'s representation.
#[inline]
pub fn flip_bit<F: FloatWidth>(value: F, bit: u32) -> F {
    debug_assert!(bit < F::BITS);
    let mask = <F::Bits as From<u8>>::from(1) << bit;
    bitcast::from_bits(bitcast::to_bits(value) ^ mask)
}

/// Per-position log of the bit flipped there, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    bits: Vec<Option<u32>>,
}

impl FaultRecord {
    /// Sentinel written for unfaulted positions in textual output.
    pub const NO_FAULT: i64 = -1;

    /// A record of `len` positions, none faulted.
    pub fn new(len: usize) -> Self {
        Self { bits: vec![None; len] }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit flipped at `position`, or `None` if it was left intact.
    pub fn get(&self, position: usize) -> Option<u32> {
        self.bits.get(position).copied().flatten()
    }

    pub fn is_faulted(&self, position: usize) -> bool {
        self.get(position).is_some()
    }

    /// The flipped bit as a signed value, [`Self::NO_FAULT`] when clean.
    pub fn code(&self, position: usize) -> i64 {
        self.get(position).map_or(Self::NO_FAULT, i64::from)
    }

    /// Number of faulted positions.
    pub fn fault_count(&self) -> usize {
        self.bits.iter().filter(|b| b.is_some()).count()
    }

    /// `(position, bit)` for every faulted position, in position order.
    pub fn faults(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.bits.iter().enumerate().filter_map(|(i, b)| b.map(|bit| (i, bit)))
    }

    fn mark(&mut self, position: usize, bit: u32) {
        self.bits[position] = Some(bit);
    }
}

/// Flips bits in `[low_bit, high_bit]` of randomly chosen values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultInjector<F> {
    low_bit: u32,
    high_bit: u32,
    _width: PhantomData<F>,
}

impl<F: FloatWidth> FaultInjector<F> {
    /// Requires `low_bit <= high_bit < F::BITS`.
    pub fn new(low_bit: u32, high_bit: u32) -> Result<Self> {
        if low_bit > high_bit || high_bit >= F::BITS {
            return Err(SdcError::InvalidBitRange { low: low_bit, high: high_bit, width: F::WIDTH });
        }
        Ok(Self { low_bit, high_bit, _width: PhantomData })
    }

    pub fn low_bit(&self) -> u32 {
        self.low_bit
    }

    pub fn high_bit(&self) -> u32 {
        self.high_bit
    }

    /// Return a corrupted copy of `values` with `fault_count` distinct
    /// positions flipped, together with the record of what was flipped.
    pub fn inject<R: Rng + ?Sized>(
        &self,
        values: &[F],
        fault_count: usize,
        rng: &mut R,
    ) -> Result<(Vec<F>, FaultRecord)> {
        let mut corrupted = values.to_vec();
        let record = self.inject_in_place(&mut corrupted, fault_count, rng)?;
        Ok((corrupted, record))
    }

    /// Flip `fault_count` distinct positions of `values` in place.
    pub fn inject_in_place<R: Rng + ?Sized>(
        &self,
        values: &mut [F],
        fault_count: usize,
        rng: &mut R,
    ) -> Result<FaultRecord> {
        if fault_count > values.len() {
            return Err(SdcError::FaultBudgetExceeded {
                requested: fault_count,
                population: values.len(),
            });
        }

        let mut record = FaultRecord::new(values.len());
        let last = values.len().saturating_sub(1);
        let mut placed = 0;
        let mut draws = 0usize;
        while placed < fault_count {
            draws += 1;
            let target = rng.gen_range(0..=last);
            if record.is_faulted(target) {
                continue;
            }
            let bit = self.draw_bit(rng);
            values[target] = self.apply(values[target], bit);
            record.mark(target, bit);
            trace!(position = target, bit, "injected fault");
            placed += 1;
        }

        debug!(faults = placed, draws, population = values.len(), "fault injection complete");
        Ok(record)
    }

    /// Split `grid` into `cells`×`cells` equal cells and flip
    /// `fault_count / cells²` distinct positions inside each one. The
    /// remainder of that division is dropped.
    ///
    /// The returned record is indexed by row-major position in `grid`.
    pub fn inject_grid<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid<F>,
        cells: usize,
        fault_count: usize,
        rng: &mut R,
    ) -> Result<FaultRecord> {
        let partition = CellPartition::of(grid, cells)?;
        let per_cell = fault_count / (cells * cells);
        if per_cell > partition.cell_population() {
            return Err(SdcError::FaultBudgetExceeded {
                requested: per_cell,
                population: partition.cell_population(),
            });
        }

        let mut record = FaultRecord::new(grid.len());
        for (cx, cy) in partition.iter_cells() {
            let bounds = partition.bounds(cx, cy);
            let mut placed = 0;
            while placed < per_cell {
                let row = rng.gen_range(bounds.rows.start..=bounds.rows.end - 1);
                let col = rng.gen_range(bounds.cols.start..=bounds.cols.end - 1);
                let position = grid.flat_index(row, col);
                if record.is_faulted(position) {
                    continue;
                }
                let bit = self.draw_bit(rng);
                grid[(row, col)] = self.apply(grid[(row, col)], bit);
                record.mark(position, bit);
                trace!(row, col, bit, "injected grid fault");
                placed += 1;
            }
        }

        debug!(
            cells,
            per_cell,
            dropped = fault_count - per_cell * cells * cells,
            "grid fault injection complete"
        );
        Ok(record)
    }

    fn draw_bit<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.low_bit..=self.high_bit)
    }

    fn apply(&self, original: F, bit: u32) -> F {
        let flipped = flip_bit(original, bit);
        debug_assert!(
            !bitcast::bit_identical(original, flipped),
            "bit flip at {bit} was not observable"
        );
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 * 0.25 + 1.0).collect()
    }

    #[test]
    fn test_flip_bit_known_values() {
        // 1.0f32 = 0x3F80_0000; flipping the sign bit yields -1.0
        assert_eq!(flip_bit(1.0f32, 31), -1.0);
        assert_eq!(bitcast::to_bits(flip_bit(1.0f32, 0)), 0x3F80_0001);
        assert_eq!(flip_bit(flip_bit(2.5f64, 40), 40), 2.5);
    }

    #[test]
    fn test_rejects_bad_bit_ranges() {
        assert!(matches!(
            FaultInjector::<f32>::new(5, 4),
            Err(SdcError::InvalidBitRange { low: 5, high: 4, .. })
        ));
        assert!(FaultInjector::<f32>::new(0, 32).is_err());
        assert!(FaultInjector::<f64>::new(0, 63).is_ok());
    }

    #[test]
    fn test_rejects_budget_over_population() {
        let injector = FaultInjector::<f32>::new(0, 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = injector.inject(&ramp(4), 5, &mut rng);
        assert!(matches!(
            result,
            Err(SdcError::FaultBudgetExceeded { requested: 5, population: 4 })
        ));
    }

    #[test]
    fn test_exact_distinct_faults() {
        let values = ramp(50);
        let injector = FaultInjector::<f32>::new(3, 20).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (corrupted, record) = injector.inject(&values, 17, &mut rng).unwrap();

        assert_eq!(record.len(), values.len());
        assert_eq!(record.fault_count(), 17);
        for (i, (orig, new)) in values.iter().zip(&corrupted).enumerate() {
            let diff = bitcast::to_bits(*orig) ^ bitcast::to_bits(*new);
            match record.get(i) {
                Some(bit) => {
                    assert!((3..=20).contains(&bit));
                    assert_eq!(diff, 1u32 << bit);
                }
                None => {
                    assert_eq!(diff, 0);
                    assert_eq!(record.code(i), FaultRecord::NO_FAULT);
                }
            }
        }
    }

    #[test]
    fn test_full_budget_terminates() {
        let values = ramp(32);
        let injector = FaultInjector::<f32>::new(0, 31).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let (_, record) = injector.inject(&values, values.len(), &mut rng).unwrap();
        assert_eq!(record.fault_count(), values.len());
    }

    #[test]
    fn test_single_bit_range() {
        let values = ramp(20);
        let injector = FaultInjector::<f32>::new(12, 12).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (_, record) = injector.inject(&values, 10, &mut rng).unwrap();
        assert!(record.faults().all(|(_, bit)| bit == 12));
    }

    #[test]
    fn test_zero_budget_is_identity() {
        let values = ramp(8);
        let injector = FaultInjector::<f32>::new(0, 31).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (corrupted, record) = injector.inject(&values, 0, &mut rng).unwrap();
        assert_eq!(corrupted, values);
        assert_eq!(record.fault_count(), 0);

        let (empty, record) = injector.inject(&[], 0, &mut rng).unwrap();
        assert!(empty.is_empty() && record.is_empty());
    }

    #[test]
    fn test_seeded_injection_is_reproducible() {
        let values = ramp(10);
        let injector = FaultInjector::<f32>::new(0, 0).unwrap();

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            injector.inject(&values, 3, &mut rng).unwrap()
        };
        let (first_values, first_record) = run(2024);
        let (second_values, second_record) = run(2024);

        assert_eq!(first_record, second_record);
        assert_eq!(
            first_values.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second_values.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert_eq!(first_record.fault_count(), 3);
        for (i, bit) in first_record.faults() {
            assert_eq!(bit, 0);
            assert_eq!(first_values[i].to_bits(), values[i].to_bits() ^ 1);
        }
    }

    #[test]
    fn test_grid_injection_per_cell_budget() {
        let mut grid = Grid::from_fn(6, 6, |r, c| (r * 6 + c) as f64 + 0.5);
        let original = grid.clone();
        let injector = FaultInjector::<f64>::new(10, 50).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        // 4 cells, 9 faults: 2 per cell, remainder of 1 dropped.
        let record = injector.inject_grid(&mut grid, 2, 9, &mut rng).unwrap();
        assert_eq!(record.fault_count(), 8);

        let partition = CellPartition::new(6, 2).unwrap();
        for (cx, cy) in partition.iter_cells() {
            let bounds = partition.bounds(cx, cy);
            let mut in_cell = 0;
            for r in bounds.rows.clone() {
                for c in bounds.cols.clone() {
                    let pos = grid.flat_index(r, c);
                    let diff = grid[(r, c)].to_bits() ^ original[(r, c)].to_bits();
                    match record.get(pos) {
                        Some(bit) => {
                            in_cell += 1;
                            assert_eq!(diff, 1u64 << bit);
                        }
                        None => assert_eq!(diff, 0),
                    }
                }
            }
            assert_eq!(in_cell, 2);
        }
    }

    #[test]
    fn test_grid_injection_rejects_indivisible() {
        let mut grid = Grid::square(5, 1.0f32);
        let injector = FaultInjector::<f32>::new(0, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            injector.inject_grid(&mut grid, 2, 4, &mut rng),
            Err(SdcError::IndivisibleGrid { .. })
        ));
        assert!(grid.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_grid_injection_rejects_cell_overflow() {
        let mut grid = Grid::square(4, 1.0f32);
        let injector = FaultInjector::<f32>::new(0, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // 2x2 cells, 5 faults per cell > 4 values per cell
        assert!(matches!(
            injector.inject_grid(&mut grid, 2, 20, &mut rng),
            Err(SdcError::FaultBudgetExceeded { requested: 5, population: 4 })
        ));
    }
}
