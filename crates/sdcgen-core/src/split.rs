//! High/low word decomposition of bit-cast products.
//!
//! A value's bit pattern is read as a signed integer, multiplied by a signed
//! multiplier in double-width arithmetic, and the product is split into two
//! single-width words. Both words are sign-extended: `low` is the low half
//! read as a signed integer, not a zero-extended remainder. Downstream
//! feature consumers depend on that encoding.

use sdcgen_common::{FloatWidth, Result, SdcError};

use crate::bitcast;
use crate::grid::{Grid, SubRegion};

/// The two halves of one double-width product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SplitWord<S> {
    pub high: S,
    pub low: S,
}

/// Convert a caller multiplier to the signed type paired with `F`.
pub fn multiplier_for<F: FloatWidth>(multiplier: i64) -> Result<F::Signed> {
    <F::Signed as TryFrom<i128>>::try_from(i128::from(multiplier))
        .map_err(|_| SdcError::InvalidMultiplier { value: i128::from(multiplier), width: F::WIDTH })
}

/// Double-width product of `value`'s bit pattern and `multiplier`.
#[inline]
pub fn product<F: FloatWidth>(value: F, multiplier: F::Signed) -> F::Wide {
    let wide = <F::Wide as From<F::Signed>>::from;
    wide(bitcast::to_signed(value)) * wide(multiplier)
}

/// Split the product of `value`'s bit pattern and `multiplier`.
#[inline]
pub fn split<F: FloatWidth>(value: F, multiplier: F::Signed) -> SplitWord<F::Signed> {
    let y = product(value, multiplier);
    SplitWord {
        high: F::truncate_wide(y >> F::BITS),
        low: F::truncate_wide((y << F::BITS) >> F::BITS),
    }
}

/// Rebuild the double-width product from its two words.
pub fn recombine<F: FloatWidth>(word: SplitWord<F::Signed>) -> i128 {
    let high: i128 = word.high.into();
    let low: i128 = word.low.into();
    let mask = (1i128 << F::BITS) - 1;
    (high << F::BITS) | (low & mask)
}

/// Split every value of `values` into the parallel `high` / `low` buffers.
pub fn split_array<F: FloatWidth>(
    values: &[F],
    multiplier: F::Signed,
    high: &mut [F::Signed],
    low: &mut [F::Signed],
) -> Result<()> {
    if high.len() != values.len() || low.len() != values.len() {
        return Err(SdcError::ShapeMismatch {
            expected: format!("{} output slots", values.len()),
            actual: format!("{} high / {} low", high.len(), low.len()),
        });
    }
    for ((value, hi), lo) in values.iter().zip(high.iter_mut()).zip(low.iter_mut()) {
        let word = split(*value, multiplier);
        *hi = word.high;
        *lo = word.low;
    }
    Ok(())
}

/// Split `values` into freshly allocated high / low vectors.
pub fn split_values<F: FloatWidth>(
    values: &[F],
    multiplier: F::Signed,
) -> (Vec<F::Signed>, Vec<F::Signed>) {
    values
        .iter()
        .map(|&v| {
            let word = split(v, multiplier);
            (word.high, word.low)
        })
        .unzip()
}

/// Split the values of `grid` inside `region`, writing only that region of
/// `high` and `low`. All three grids must share one shape.
pub fn split_grid<F: FloatWidth>(
    grid: &Grid<F>,
    multiplier: F::Signed,
    region: &SubRegion,
    high: &mut Grid<F::Signed>,
    low: &mut Grid<F::Signed>,
) -> Result<()> {
    region.check_within(grid.rows(), grid.cols())?;
    high.require_shape(grid.rows(), grid.cols())?;
    low.require_shape(grid.rows(), grid.cols())?;

    let cols = region.cols.clone();
    for r in region.rows.clone() {
        split_array(
            &grid.row(r)[cols.clone()],
            multiplier,
            &mut high.row_mut(r)[cols.clone()],
            &mut low.row_mut(r)[cols.clone()],
        )?;
    }
    Ok(())
}

/// Split a whole grid into new high / low grids.
pub fn split_grid_full<F: FloatWidth>(
    grid: &Grid<F>,
    multiplier: F::Signed,
) -> (Grid<F::Signed>, Grid<F::Signed>) {
    let high = grid.map(|&v| split(v, multiplier).high);
    let low = grid.map(|&v| split(v, multiplier).low);
    (high, low)
}
