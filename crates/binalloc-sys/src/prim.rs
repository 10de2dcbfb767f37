use core::sync::atomic::{
  AtomicBool,
  AtomicUsize,
  Ordering,
};

use binalloc_bits::{
  align_down,
  align_up,
};

#[derive(Debug, PartialEq)]
pub enum PrimError {
  InvalidAlignment,
  Overflow,
}

pub type PrimResult<T> = Result<T, PrimError>;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const COMMON_PAGE_SIZE: usize = 4096;

pub const fn word_width() -> usize {
  core::mem::size_of::<usize>()
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn page_size_helper() -> usize {
  unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn page_size_helper() -> usize {
  COMMON_PAGE_SIZE
}

pub fn page_size() -> usize {
  static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);
  static INIT: AtomicBool = AtomicBool::new(false);

  if !INIT.load(Ordering::Acquire) {
    let size = page_size_helper();
    PAGE_SIZE.store(size, Ordering::Release);
    INIT.store(true, Ordering::Release);
    size
  } else {
    PAGE_SIZE.load(Ordering::Acquire)
  }
}

pub fn page_align(value: usize) -> PrimResult<usize> {
  let aligned = align_up(value, page_size());
  if aligned < value {
    return Err(PrimError::Overflow);
  }
  Ok(aligned)
}

pub fn is_page_aligned(value: usize) -> bool {
  align_down(value, page_size()) == value
}
