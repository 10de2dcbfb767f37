use super::*;

#[test]
fn test_align_down_basic() {
  assert_eq!(align_down(0, 8), 0);
  assert_eq!(align_down(7, 8), 0);
  assert_eq!(align_down(8, 8), 8);
  assert_eq!(align_down(15, 8), 8);
  assert_eq!(align_down(0b01_011, 0b01_000), 0b01_000);
  assert_eq!(align_down(123, 64), 64);
  assert_eq!(align_down(256, 64), 256);
}

#[test]
fn test_align_down_bounds() {
  for &v in &[0usize, 1, 31, 32, 33, 4095, 4096, 4097, usize::MAX] {
    for shift in [0u32, 3, 5, 12, 20] {
      let p = 1usize << shift;
      let d = align_down(v, p);
      assert!(d <= v);
      assert!(v - d < p);
      assert_eq!(d % p, 0);
    }
  }
}

#[test]
fn test_align_up_basic() {
  assert_eq!(align_up(0, 8), 0);
  assert_eq!(align_up(1, 8), 8);
  assert_eq!(align_up(8, 8), 8);
  assert_eq!(align_up(9, 8), 16);
  assert_eq!(align_up(0b01_011, 0b01_000), 0b10_000);
  assert_eq!(align_up(17, 32), 32);
  assert_eq!(align_up(32, 32), 32);
}

#[test]
fn test_align_up_bounds() {
  for &v in &[0usize, 1, 31, 32, 33, 4095, 4096, 4097] {
    for shift in [0u32, 3, 5, 12, 20] {
      let p = 1usize << shift;
      let u = align_up(v, p);
      assert!(u >= v);
      assert!(u - v < p);
      assert_eq!(u % p, 0);
    }
  }
}

#[test]
fn test_align_up_near_max() {
  // The highest representable multiple of p is usize::MAX - p + 1; aligning
  // it up must be the identity, not a wrap. The naive add-then-mask form
  // already overflows here.
  for shift in [3u32, 5, 12] {
    let p = 1usize << shift;
    let v = usize::MAX - p + 1;
    assert_eq!(align_up(v, p), v);
    assert!(align_up(v, p) >= v);
  }
}

#[test]
fn test_bit_is_set() {
  assert!(!bit_is_set(0, 0));
  assert!(bit_is_set(1, 0));
  assert!(!bit_is_set(1, 1));
  assert!(bit_is_set(0b1010, 1));
  assert!(!bit_is_set(0b1010, 2));
  assert!(bit_is_set(0b1010, 3));
  assert!(bit_is_set(usize::MAX, usize::BITS - 1));
}

#[test]
fn test_mask_high_bits() {
  assert_eq!(mask_high_bits(0b1110111, 3), 0b1110000);
  assert_eq!(mask_high_bits(0b1111, 0), 0b1111);
  assert_eq!(mask_high_bits(0b1111, 4), 0);
  assert_eq!(mask_high_bits(usize::MAX, 0), usize::MAX);
  assert_eq!(
    mask_high_bits(usize::MAX, usize::BITS - 1),
    1usize << (usize::BITS - 1)
  );
}

#[test]
fn test_clear_lowest_set_bit() {
  assert_eq!(clear_lowest_set_bit(0), 0);
  assert_eq!(clear_lowest_set_bit(1), 0);
  assert_eq!(clear_lowest_set_bit(0b1010), 0b1000);
  assert_eq!(clear_lowest_set_bit(0b1000), 0);
  assert_eq!(clear_lowest_set_bit(usize::MAX), usize::MAX - 1);
}

#[test]
fn test_clear_lowest_reaches_zero_in_popcount_steps() {
  for &v in &[
    0b1usize,
    0b1010,
    0b1111,
    0xdead_beef,
    usize::MAX,
    1usize << (usize::BITS - 1),
  ] {
    let mut x = v;
    let mut steps = 0;
    while x != 0 {
      x = clear_lowest_set_bit(x);
      steps += 1;
    }
    assert_eq!(steps, v.count_ones());
  }
}

#[test]
fn test_lowest_set_bit() {
  assert_eq!(lowest_set_bit(0), 0);
  assert_eq!(lowest_set_bit(0b1010), 0b10);
  assert_eq!(lowest_set_bit(0b1000), 0b1000);
  for &v in &[1usize, 6, 40, 96, 0xf00d] {
    assert_eq!(lowest_set_bit(v), 1usize << v.trailing_zeros());
    assert_eq!(clear_lowest_set_bit(v) + lowest_set_bit(v), v);
  }
}

#[test]
fn test_share_highest_bit() {
  assert!(share_highest_bit(0b1100, 0b1000));
  assert!(!share_highest_bit(0b0100, 0b1000));
  assert!(share_highest_bit(1, 1));
  assert!(!share_highest_bit(1, 2));
  // Low-bit noise under the other operand's highest bit must not count.
  assert!(!share_highest_bit(1, 3));
  assert!(!share_highest_bit(3, 1));
  assert!(!share_highest_bit(1, 9));
  assert!(share_highest_bit(5, 7));
  assert!(share_highest_bit(usize::MAX, 1usize << (usize::BITS - 1)));
}

#[test]
fn test_share_highest_bit_matches_explicit_log() {
  let samples = [
    1usize, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 31, 33, 64, 100, 1023, 1024, 4096, 0xbeef,
  ];
  let high = |v: usize| usize::BITS - 1 - v.leading_zeros();
  for &a in &samples {
    for &b in &samples {
      let expected = high(a) == high(b);
      assert_eq!(share_highest_bit(a, b), expected, "a={a} b={b}");
      // Symmetry over nonzero inputs.
      assert_eq!(share_highest_bit(a, b), share_highest_bit(b, a));
    }
  }
}
