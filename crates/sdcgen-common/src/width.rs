//! Float width selection and the integer types paired with each width.
//!
//! Every float representation used by the generator carries three companion
//! integer types: an unsigned integer of the same size (the raw bit pattern),
//! a signed integer of the same size (the value fed to the product split), and
//! a signed integer of exactly twice the size (the product itself). The
//! pairing is checked at compile time for each implementation.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, LowerHex};
use std::mem::size_of;
use std::ops::{Add, BitXor, Div, Mul, Shl, Shr, Sub};

use crate::error::SdcError;

/// Runtime selection of the float representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitWidth {
    /// IEEE-754 binary32 paired with `u32` / `i32` / `i64`.
    #[default]
    F32,
    /// IEEE-754 binary64 paired with `u64` / `i64` / `i128`.
    F64,
}

impl BitWidth {
    /// Number of bits in the float representation.
    pub const fn bits(self) -> u32 {
        match self {
            Self::F32 => f32::BITS,
            Self::F64 => f64::BITS,
        }
    }

    /// Inclusive range of the signed integer paired with this width.
    pub const fn signed_range(self) -> (i128, i128) {
        match self {
            Self::F32 => (i32::MIN as i128, i32::MAX as i128),
            Self::F64 => (i64::MIN as i128, i64::MAX as i128),
        }
    }

    /// Whether `value` fits the signed integer paired with this width.
    pub fn fits_signed(self, value: i128) -> bool {
        let (min, max) = self.signed_range();
        (min..=max).contains(&value)
    }
}

impl Display for BitWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}

impl std::str::FromStr for BitWidth {
    type Err = SdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f32" | "32" | "single" => Ok(Self::F32),
            "f64" | "64" | "double" => Ok(Self::F64),
            other => Err(SdcError::InvalidWidth(format!(
                "unknown float width '{other}' (expected f32 or f64)"
            ))),
        }
    }
}

/// A float type usable by the generator, together with its paired integers.
pub trait FloatWidth:
    Copy
    + Debug
    + Display
    + Default
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Unsigned integer holding the raw bit pattern.
    type Bits: Copy
        + Debug
        + Eq
        + LowerHex
        + From<u8>
        + BitXor<Output = Self::Bits>
        + Shl<u32, Output = Self::Bits>
        + Send
        + Sync;

    /// Signed integer of the same width.
    type Signed: Copy
        + Debug
        + Display
        + Eq
        + Ord
        + Default
        + Into<i128>
        + TryFrom<i128>
        + Send
        + Sync;

    /// Signed integer of twice the width, wide enough for any product of
    /// two `Signed` values.
    type Wide: Copy
        + Debug
        + Display
        + Eq
        + From<Self::Signed>
        + Into<i128>
        + Mul<Output = Self::Wide>
        + Shl<u32, Output = Self::Wide>
        + Shr<u32, Output = Self::Wide>;

    /// Runtime tag for this width.
    const WIDTH: BitWidth;
    /// Number of bits in `Self`, `Self::Bits` and `Self::Signed`.
    const BITS: u32;

    /// Reinterpret the float's bit pattern as an unsigned integer.
    fn to_bit_pattern(self) -> Self::Bits;
    /// Reinterpret an unsigned bit pattern as a float.
    fn from_bit_pattern(bits: Self::Bits) -> Self;
    /// Reinterpret an unsigned bit pattern as a signed integer.
    fn bits_to_signed(bits: Self::Bits) -> Self::Signed;
    /// Reinterpret a signed integer as an unsigned bit pattern.
    fn signed_to_bits(value: Self::Signed) -> Self::Bits;
    /// Truncate a wide integer to its low `BITS` bits, read as signed.
    fn truncate_wide(value: Self::Wide) -> Self::Signed;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn from_usize(value: usize) -> Self;
}

macro_rules! impl_float_width {
    ($float:ty, $bits:ty, $signed:ty, $wide:ty, $tag:expr) => {
        const _: () = {
            assert!(size_of::<$float>() == size_of::<$bits>());
            assert!(size_of::<$float>() == size_of::<$signed>());
            assert!(size_of::<$wide>() == 2 * size_of::<$signed>());
        };

        impl FloatWidth for $float {
            type Bits = $bits;
            type Signed = $signed;
            type Wide = $wide;

            const WIDTH: BitWidth = $tag;
            const BITS: u32 = <$bits>::BITS;

            #[inline]
            fn to_bit_pattern(self) -> $bits {
                <$float>::to_bits(self)
            }

            #[inline]
            fn from_bit_pattern(bits: $bits) -> Self {
                <$float>::from_bits(bits)
            }

            #[inline]
            fn bits_to_signed(bits: $bits) -> $signed {
                <$signed>::from_ne_bytes(bits.to_ne_bytes())
            }

            #[inline]
            fn signed_to_bits(value: $signed) -> $bits {
                <$bits>::from_ne_bytes(value.to_ne_bytes())
            }

            #[inline]
            fn truncate_wide(value: $wide) -> $signed {
                value as $signed
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $float
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_usize(value: usize) -> Self {
                value as $float
            }
        }
    };
}

impl_float_width!(f32, u32, i32, i64, BitWidth::F32);
impl_float_width!(f64, u64, i64, i128, BitWidth::F64);

/// Compile-time width of a float type, as the runtime tag.
pub fn width_of<F: FloatWidth>() -> BitWidth {
    F::WIDTH
}
