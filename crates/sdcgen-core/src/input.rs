//! Input grids and the registry of scalar functions applied to them.

use sdcgen_common::{FloatWidth, Result, SdcError, FUNCTION_COUNT};
use std::fmt;

use crate::grid::Grid;

/// Scalar functions selectable by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarFunction {
    Sin,
    Cos,
}

impl ScalarFunction {
    /// Registry order; a function's index is its position here.
    pub const ALL: [ScalarFunction; FUNCTION_COUNT] = [Self::Sin, Self::Cos];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(SdcError::UnknownFunction { index, available: Self::ALL.len() })
    }

    pub fn index(self) -> usize {
        match self {
            Self::Sin => 0,
            Self::Cos => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
        }
    }

    /// The function as a plain `f64 -> f64` pointer.
    pub fn as_fn(self) -> fn(f64) -> f64 {
        match self {
            Self::Sin => f64::sin,
            Self::Cos => f64::cos,
        }
    }

    /// Evaluate in `f64` and narrow back to `F`.
    pub fn apply<F: FloatWidth>(self, x: F) -> F {
        F::from_f64((self.as_fn())(x.to_f64()))
    }
}

impl fmt::Display for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn check_domain<F: FloatWidth>(low: F, high: F) -> Result<()> {
    // Written as a negated comparison so NaN bounds are rejected too.
    if !(low < high) {
        return Err(SdcError::InvalidDomain { low: low.to_f64(), high: high.to_f64() });
    }
    Ok(())
}

fn ramp<F: FloatWidth>(low: F, high: F, steps: usize) -> Vec<F> {
    let step = (high - low) / F::from_usize(steps);
    (0..steps).map(|i| low + F::from_usize(i) * step).collect()
}

/// `steps` evenly spaced samples of `[low, high)`.
pub fn generate_ramp<F: FloatWidth>(low: F, high: F, steps: usize) -> Result<Vec<F>> {
    check_domain(low, high)?;
    Ok(ramp(low, high, steps))
}

/// `side`×`side` input grid. Row `i` samples `[low - i·s, high - i·s)` at
/// `side` points, where `s = (high - low) / side`.
pub fn generate_grid<F: FloatWidth>(low: F, high: F, side: usize) -> Result<Grid<F>> {
    check_domain(low, high)?;
    let shift = (high - low) / F::from_usize(side);
    let mut data = Vec::with_capacity(side * side);
    for i in 0..side {
        let offset = shift * F::from_usize(i);
        data.extend(ramp(low - offset, high - offset, side));
    }
    Grid::from_vec(side, side, data)
}

/// Apply `f` to every value.
pub fn map_values<F: FloatWidth>(values: &[F], f: impl Fn(F) -> F) -> Vec<F> {
    values.iter().map(|&v| f(v)).collect()
}

/// Apply `f` to every element of `grid`.
pub fn map_grid<F: FloatWidth>(grid: &Grid<F>, f: impl Fn(F) -> F) -> Grid<F> {
    grid.map(|&v| f(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_indices() {
        for (i, func) in ScalarFunction::ALL.iter().enumerate() {
            assert_eq!(func.index(), i);
            assert_eq!(ScalarFunction::from_index(i).unwrap(), *func);
        }
        assert!(matches!(
            ScalarFunction::from_index(2),
            Err(SdcError::UnknownFunction { index: 2, available: 2 })
        ));
        assert_eq!(ScalarFunction::Cos.to_string(), "cos");
    }

    #[test]
    fn test_apply_narrows_to_width() {
        let y = ScalarFunction::Sin.apply(1.0f32);
        assert_eq!(y, 1.0f64.sin() as f32);
        assert_eq!(ScalarFunction::Cos.apply(0.0f64), 1.0);
    }

    #[test]
    fn test_ramp_samples() {
        let values = generate_ramp(0.0f32, 1.0, 4).unwrap();
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75]);
        assert!(generate_ramp(1.0f32, 1.0, 4).is_err());
        assert!(generate_ramp(f64::NAN, 1.0, 4).is_err());
    }

    #[test]
    fn test_grid_rows_are_shifted_ramps() {
        let grid = generate_grid(0.0f64, 4.0, 4).unwrap();
        assert_eq!(grid.row(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(grid.row(1), &[-1.0, 0.0, 1.0, 2.0]);
        assert_eq!(grid.row(3), &[-3.0, -2.0, -1.0, 0.0]);
    }

    #[test]
    fn test_grid_rejects_inverted_domain() {
        assert!(matches!(
            generate_grid(2.0f32, -2.0, 4),
            Err(SdcError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn test_map_grid() {
        let grid = generate_grid(0.0f64, 4.0, 4).unwrap();
        let mapped = map_grid(&grid, |v| ScalarFunction::Cos.apply(v));
        assert_eq!(mapped[(0, 0)], 1.0);
        assert_eq!(mapped[(2, 3)], 1.0f64.cos());
    }
}
