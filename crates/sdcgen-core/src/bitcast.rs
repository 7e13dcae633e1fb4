//! Bit-pattern reinterpretation between floats and integers.
//!
//! These never go through a numeric conversion, so NaN payloads and the sign
//! of zero survive a round trip.

use sdcgen_common::FloatWidth;

/// Reinterpret `value` as its unsigned bit pattern.
#[inline]
pub fn to_bits<F: FloatWidth>(value: F) -> F::Bits {
    value.to_bit_pattern()
}

/// Reinterpret an unsigned bit pattern as a float.
#[inline]
pub fn from_bits<F: FloatWidth>(bits: F::Bits) -> F {
    F::from_bit_pattern(bits)
}

/// Reinterpret `value` as a signed integer of the same width.
#[inline]
pub fn to_signed<F: FloatWidth>(value: F) -> F::Signed {
    F::bits_to_signed(value.to_bit_pattern())
}

/// Reinterpret a signed integer as a float of the same width.
#[inline]
pub fn from_signed<F: FloatWidth>(value: F::Signed) -> F {
    F::from_bit_pattern(F::signed_to_bits(value))
}

/// Whether `a` and `b` have identical bit patterns.
#[inline]
pub fn bit_identical<F: FloatWidth>(a: F, b: F) -> bool {
    a.to_bit_pattern() == b.to_bit_pattern()
}
