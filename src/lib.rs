#![no_std]

//! `GlobalAlloc` facade over the binned boundary-tag heap.

use core::{
  alloc::{
    GlobalAlloc,
    Layout,
  },
  ptr::NonNull,
};

use binalloc_heap::config::OVERHEAD;

pub mod prelude {
  pub use binalloc_heap::prelude::*;
  pub use binalloc_sys::prelude::*;
}

/// Payload pointers sit one header (`OVERHEAD`) into a `SIZE_ALIGN`-aligned
/// chunk, so this is the strongest alignment the heap can promise without
/// over-allocating.
pub const MAX_ALIGN: usize = OVERHEAD;

pub struct BinAlloc {}

unsafe impl GlobalAlloc for BinAlloc {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    if layout.align() > MAX_ALIGN {
      return core::ptr::null_mut();
    }
    match binalloc_heap::allocate(layout.size()) {
      Ok(p) => p.as_ptr(),
      Err(_) => core::ptr::null_mut(),
    }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
    _ = layout;
    if let Some(p) = NonNull::new(ptr) {
      unsafe { binalloc_heap::release(p) };
    }
  }

  unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
    let Some(p) = NonNull::new(ptr) else {
      let layout = unsafe { Layout::from_size_align_unchecked(new_size, layout.align()) };
      return unsafe { self.alloc(layout) };
    };
    match unsafe { binalloc_heap::reallocate(p, new_size) } {
      Ok(q) => q.as_ptr(),
      Err(_) => core::ptr::null_mut(),
    }
  }
}
