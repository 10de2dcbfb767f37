use core::ptr::NonNull;

use binalloc_sys::prelude::*;
use getset::CopyGetters;

use crate::{
  AllocError,
  AllocResult,
  chunk::Chunk,
  config::{
    C_INUSE,
    SEGMENT_RESERVE,
    SIZE_ALIGN,
  },
};

/// The managed heap region: a single reserved mapping whose committed
/// prefix `[base, brk)` stands in for the program break. The prefix is
/// tiled with chunks between two permanently in-use sentinels, one at
/// `base` and one at `brk - SIZE_ALIGN`, so coalescing never walks off
/// either end.
#[derive(CopyGetters)]
pub struct Segment {
  #[getset(get_copy = "pub")]
  base: *mut u8,
  #[getset(get_copy = "pub")]
  brk: *mut u8,
  end: *mut u8,
}

// Only ever mutated through the heap-wide segment mutex.
unsafe impl Send for Segment {}

impl Segment {
  pub const fn new() -> Self {
    Self {
      base: core::ptr::null_mut(),
      brk: core::ptr::null_mut(),
      end: core::ptr::null_mut(),
    }
  }

  /// Committed bytes of the managed region.
  pub fn grown(&self) -> usize {
    if self.base.is_null() {
      return 0;
    }
    self.brk as usize - self.base as usize
  }

  /// Address of the tail sentinel, null before the first growth.
  pub fn tail_sentinel(&self) -> *mut u8 {
    if self.base.is_null() || self.brk == self.base {
      return core::ptr::null_mut();
    }
    unsafe { self.brk.sub(SIZE_ALIGN) }
  }

  fn reserve(&mut self) -> AllocResult<()> {
    let slice = unsafe { GLOBAL_SYSTEM.alloc(SEGMENT_RESERVE, SysOption::Reserve) }
      .map_err(|_| AllocError::OutOfMemory)?;
    self.base = slice.as_mut_ptr();
    self.brk = self.base;
    self.end = unsafe { self.base.add(slice.len()) };
    Ok(())
  }

  /// Grows the heap top by at least `need` usable bytes and returns the
  /// freshly carved chunk, privately owned by the caller with its in-use
  /// flag set. The previous tail sentinel becomes the new chunk's header,
  /// so its boundary tag toward the predecessor is already in place.
  pub fn expand(&mut self, need: usize) -> AllocResult<NonNull<Chunk>> {
    if self.base.is_null() {
      self.reserve()?;
    }

    let grow = need
      .checked_add(2 * SIZE_ALIGN)
      .and_then(|n| page_align(n).ok())
      .ok_or(AllocError::OutOfMemory)?;

    let available = self.end as usize - self.brk as usize;
    if grow > available {
      return Err(AllocError::OutOfMemory);
    }

    let fresh = unsafe { core::slice::from_raw_parts_mut(self.brk, grow) };
    unsafe { GLOBAL_SYSTEM.modify(fresh, SysOption::Commit) }
      .map_err(|_| AllocError::OutOfMemory)?;

    let first = self.brk == self.base;
    let old_brk = self.brk;
    self.brk = unsafe { self.brk.add(grow) };

    let chunk_addr = if first {
      // Head sentinel guards the bottom boundary.
      let head = self.base as *mut Chunk;
      unsafe {
        (*head).set_psize(C_INUSE);
        (*head).set_csize(SIZE_ALIGN | C_INUSE);
      }
      let c = unsafe { self.base.add(SIZE_ALIGN) } as *mut Chunk;
      unsafe { (*c).set_psize(SIZE_ALIGN | C_INUSE) };
      c
    } else {
      (unsafe { old_brk.sub(SIZE_ALIGN) }) as *mut Chunk
    };

    let tail = unsafe { self.brk.sub(SIZE_ALIGN) } as *mut Chunk;
    let size = tail as usize - chunk_addr as usize;
    unsafe {
      (*chunk_addr).set_csize(size | C_INUSE);
      (*tail).set_psize(size | C_INUSE);
      (*tail).set_csize(C_INUSE);
    }

    debug_assert!(size >= need);
    debug_assert!(size % SIZE_ALIGN == 0);

    Ok(unsafe { NonNull::new_unchecked(chunk_addr) })
  }

  /// Gives the excess pages of a privately held top chunk back to the OS,
  /// moving the break down and rewriting the tail sentinel. Returns false
  /// when `c` turns out not to be the top chunk (the caller's unlocked
  /// pre-check raced with a growth) or nothing can be released.
  pub fn shrink(&mut self, c: NonNull<Chunk>) -> bool {
    let c_addr = c.as_ptr() as usize;
    let c_end = c_addr + unsafe { c.as_ref() }.size();
    if c_end != self.tail_sentinel() as usize {
      return false;
    }

    let new_brk = match page_align(c_addr + 2 * SIZE_ALIGN) {
      Ok(v) => v,
      Err(_) => return false,
    };
    if new_brk >= self.brk as usize {
      return false;
    }

    let released = self.brk as usize - new_brk;
    let slice = unsafe { core::slice::from_raw_parts(new_brk as *mut u8, released) };
    if unsafe { GLOBAL_SYSTEM.modify(slice, SysOption::Reclaim) }.is_err() {
      return false;
    }
    // Best effort: a failed re-protect leaves the released tail accessible
    // as zero pages until the next expand commits over it.
    let _ = unsafe { GLOBAL_SYSTEM.modify(slice, SysOption::Reserve) };

    self.brk = new_brk as *mut u8;

    let tail = unsafe { self.brk.sub(SIZE_ALIGN) } as *mut Chunk;
    let size = tail as usize - c_addr;
    unsafe {
      c.as_ref().set_csize(size | C_INUSE);
      (*tail).set_psize(size | C_INUSE);
      (*tail).set_csize(C_INUSE);
    }

    debug_assert!(size >= SIZE_ALIGN);
    true
  }
}
