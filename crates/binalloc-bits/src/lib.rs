#![cfg_attr(not(test), no_std)]

//! Word-level bit primitives the allocator's hot paths lean on: power-of-two
//! alignment, flag-bit tests and the size-class bucketing helpers.
//!
//! All functions are pure and total over `usize`. The power-of-two
//! preconditions are caller contracts, checked only by `debug_assert!`.

#[cfg(test)]
pub mod tests;

/// Aligns `value` downwards to `pow2`, clearing every bit below `pow2`'s
/// single set bit.
#[inline(always)]
pub const fn align_down(value: usize, pow2: usize) -> usize {
  debug_assert!(pow2.is_power_of_two());
  value & !(pow2 - 1)
}

/// Aligns `value` upwards to the next multiple of `pow2`, leaving it
/// unchanged when already aligned.
///
/// Uses the two's-complement form `value + ((-value) & (pow2 - 1))` rather
/// than aligning `value + pow2 - 1` down: the naive form wraps as soon as
/// `value + pow2 - 1` overflows, while this one only wraps when the aligned
/// result itself is unrepresentable.
#[inline(always)]
pub const fn align_up(value: usize, pow2: usize) -> usize {
  debug_assert!(pow2.is_power_of_two());
  value.wrapping_add(value.wrapping_neg() & (pow2 - 1))
}

/// Tests bit `n` of `value`.
#[inline(always)]
pub const fn bit_is_set(value: usize, n: u32) -> bool {
  value & (1usize << n) != 0
}

/// Keeps bit `n` and everything above it, clearing all lower bits.
///
/// `-(1 << n)` sets bit `n` and all higher bits, so the conjunction drops
/// the strict-low part. Used to restrict a non-empty-bins mask to classes
/// at or above a requested index.
#[inline(always)]
pub const fn mask_high_bits(value: usize, n: u32) -> usize {
  value & (1usize << n).wrapping_neg()
}

/// Turns off exactly the lowest set bit of `value`; zero stays zero.
///
/// `value & -value` isolates the lowest set bit, subtracting removes it.
/// Repeated application walks set bits from low to high, which is how the
/// bin search advances through non-empty size classes.
#[inline(always)]
pub const fn clear_lowest_set_bit(value: usize) -> usize {
  value - (value & value.wrapping_neg())
}

/// Isolates the lowest set bit of `value` (0 when `value` is 0).
#[inline(always)]
pub const fn lowest_set_bit(value: usize) -> usize {
  value & value.wrapping_neg()
}

/// True iff `a` and `b` have the same most-significant set bit.
///
/// When the highest bits coincide they cancel in the xor but survive the
/// conjunction, so the xor is the smaller of the two; when they differ the
/// xor keeps the larger input's highest bit while the conjunction sits
/// strictly below it. This classifies two sizes into the same exponential
/// bucket without computing a log2.
#[inline(always)]
pub const fn share_highest_bit(a: usize, b: usize) -> bool {
  (a ^ b) <= (a & b)
}
