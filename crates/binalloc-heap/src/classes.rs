use binalloc_bits::{
  clear_lowest_set_bit,
  share_highest_bit,
};

use crate::config::{
  EXACT_LIMIT,
  NBINS,
  SIZE_ALIGN,
};

/// Chunk size expressed in `SIZE_ALIGN` granules, minus one. The smallest
/// chunk (one granule) has unit count 0.
#[inline(always)]
const fn units(size: usize) -> usize {
  size / SIZE_ALIGN - 1
}

/// Size class for a chunk of `size` bytes (a multiple of `SIZE_ALIGN`).
///
/// Unit counts up to `EXACT_LIMIT` get one bin each; above that, chunks
/// whose unit counts share a highest bit share a bin, so class width doubles
/// per bin and the table stays logarithmic.
pub fn bin_index(size: usize) -> usize {
  let u = units(size);
  if u <= EXACT_LIMIT {
    return u;
  }

  let mut probe = EXACT_LIMIT;
  let mut idx = EXACT_LIMIT + 1;
  while idx < NBINS - 1 && !share_highest_bit(u, probe) {
    probe <<= 1;
    idx += 1;
  }
  idx
}

/// Smallest class index every member of which can satisfy `size`.
///
/// Exact classes hold a single size, so this is `bin_index` itself there.
/// An exponential class holds sizes below twice its smallest member, so a
/// request inside the class (not at its floor) must start one class up.
pub fn bin_index_up(size: usize) -> usize {
  let u = units(size);
  let idx = bin_index(size);
  if u <= EXACT_LIMIT || clear_lowest_set_bit(u) == 0 {
    idx
  } else {
    (idx + 1).min(NBINS - 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exact_classes() {
    assert_eq!(bin_index(SIZE_ALIGN), 0);
    assert_eq!(bin_index(SIZE_ALIGN * 2), 1);
    assert_eq!(bin_index(SIZE_ALIGN * 33), 32);
    for i in 0..=EXACT_LIMIT {
      let size = SIZE_ALIGN * (i + 1);
      assert_eq!(bin_index(size), i);
      assert_eq!(bin_index_up(size), i);
    }
  }

  #[test]
  fn test_exponential_classes() {
    // Unit counts 33..=63 share highest bit 5 and land in the first
    // exponential class.
    assert_eq!(bin_index(SIZE_ALIGN * 34), 33);
    assert_eq!(bin_index(SIZE_ALIGN * 64), 33);
    assert_eq!(bin_index(SIZE_ALIGN * 65), 34);
    assert_eq!(bin_index(SIZE_ALIGN * 128), 34);
    assert_eq!(bin_index(SIZE_ALIGN * 129), 35);
  }

  #[test]
  fn test_class_grouping_matches_highest_bit() {
    let high = |v: usize| usize::BITS - 1 - v.leading_zeros();
    for u in EXACT_LIMIT + 1..4096 {
      for v in [u, u + 1, u * 2 - 1, u * 2] {
        let a = SIZE_ALIGN * (u + 1);
        let b = SIZE_ALIGN * (v + 1);
        let same = bin_index(a) == bin_index(b);
        if units(b) > EXACT_LIMIT {
          assert_eq!(same, high(u) == high(units(b)), "u={u} v={}", units(b));
        }
      }
    }
  }

  #[test]
  fn test_index_up_guarantees_fit() {
    // Any chunk belonging to a class at or above bin_index_up(size) is
    // large enough for size.
    for u in 1..2048usize {
      let size = SIZE_ALIGN * (u + 1);
      let start = bin_index_up(size);
      for member_u in 1..4096usize {
        let member = SIZE_ALIGN * (member_u + 1);
        if bin_index(member) >= start && bin_index(member) < NBINS - 1 {
          assert!(member >= size, "size={size} member={member} start={start}");
        }
      }
    }
  }

  #[test]
  fn test_monotone() {
    let mut last = 0;
    for u in 0..8192usize {
      let idx = bin_index(SIZE_ALIGN * (u + 1));
      assert!(idx >= last);
      assert!(idx < NBINS);
      last = idx;
    }
  }
}
