#![cfg_attr(not(test), no_std)]

//! Boundary-tagged, size-class binned heap with an mmap path for large
//! requests. Small and medium chunks live in a brk-style managed segment
//! and recycle through 64 sentinel-anchored free lists; a one-word bitmap
//! of non-empty bins accelerates best-fit search.

pub mod bin;
pub mod chunk;
pub mod classes;
pub mod config;
pub mod heap;
pub mod segment;


use core::ptr::NonNull;

use heap::HEAP;

#[derive(Debug, PartialEq)]
pub enum AllocError {
  /// The OS refused to grant more address space. Never retried internally.
  OutOfMemory,
}

pub type AllocResult<T> = Result<T, AllocError>;

/// Allocates `size` usable bytes from the process-wide heap.
pub fn allocate(size: usize) -> AllocResult<NonNull<u8>> {
  HEAP.allocate(size)
}

/// Returns an allocation to the process-wide heap.
///
/// # Safety
///
/// `p` must come from [`allocate`] or [`reallocate`] on this heap and must
/// not be used afterwards. Passing any other pointer is undefined behavior;
/// no validation is performed.
pub unsafe fn release(p: NonNull<u8>) {
  unsafe { HEAP.release(p) }
}

/// Resizes an allocation, preserving the payload prefix. Grows in place
/// when the physically next chunk is free and large enough, otherwise
/// moves the data.
///
/// # Safety
///
/// Same contract as [`release`]; on success the old pointer may be stale.
pub unsafe fn reallocate(p: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>> {
  unsafe { HEAP.reallocate(p, new_size) }
}

pub mod prelude {
  pub use super::{
    AllocError,
    AllocResult,
    allocate,
    config::{
      MMAP_THRESHOLD,
      OVERHEAD,
      SIZE_ALIGN,
    },
    heap::Heap,
    reallocate,
    release,
  };
}
