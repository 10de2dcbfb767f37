#![no_std]

pub use binalloc::prelude::*;
use binalloc::MAX_ALIGN;
use core::ptr::{
  self,
  NonNull,
};

mod handler;

#[unsafe(no_mangle)]
pub extern "C" fn bn_page_size() -> usize {
  page_size()
}

#[unsafe(no_mangle)]
pub extern "C" fn malloc(size: usize) -> *mut u8 {
  match allocate(size) {
    Ok(p) => p.as_ptr(),
    Err(_) => ptr::null_mut(),
  }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(p: *mut u8) {
  if let Some(p) = NonNull::new(p) {
    unsafe { release(p) };
  }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(p: *mut u8, size: usize) -> *mut u8 {
  let Some(p) = NonNull::new(p) else {
    return malloc(size);
  };
  match unsafe { reallocate(p, size) } {
    Ok(q) => q.as_ptr(),
    Err(_) => ptr::null_mut(),
  }
}

#[unsafe(no_mangle)]
pub extern "C" fn calloc(num: usize, size: usize) -> *mut u8 {
  let Some(total) = num.checked_mul(size) else {
    return ptr::null_mut();
  };
  match allocate(total) {
    Ok(p) => {
      // Recycled chunks carry stale payloads; mapped ones are already
      // zero, but zeroing unconditionally keeps this simple.
      unsafe { ptr::write_bytes(p.as_ptr(), 0, total) };
      p.as_ptr()
    }
    Err(_) => ptr::null_mut(),
  }
}

#[unsafe(no_mangle)]
pub extern "C" fn aligned_alloc(align: usize, size: usize) -> *mut u8 {
  if align > MAX_ALIGN || !align.is_power_of_two() {
    return ptr::null_mut();
  }
  malloc(size)
}
