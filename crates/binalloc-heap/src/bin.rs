use core::{
  cell::UnsafeCell,
  ptr::NonNull,
};

use spin::{
  Mutex,
  MutexGuard,
};

use crate::chunk::Chunk;

/// One size class: a lock plus a sentinel pseudo-chunk anchoring a circular
/// doubly linked list of free chunks. The sentinel is a permanent dummy node
/// whose `next`/`prev` double as the list head and tail, so splicing never
/// branches on the empty case.
pub struct Bin {
  lock: Mutex<()>,
  sentinel: UnsafeCell<Chunk>,
}

// The sentinel is only touched while `lock` is held.
unsafe impl Sync for Bin {}

impl Bin {
  pub const fn new() -> Self {
    Self {
      lock: Mutex::new(()),
      sentinel: UnsafeCell::new(Chunk::new()),
    }
  }

  /// Acquires the bin lock, priming the sentinel's self-links on first use.
  /// The links cannot be set up in `new` because the bin's final address is
  /// not known until it sits in its static slot.
  pub fn lock(&self) -> MutexGuard<'_, ()> {
    let guard = self.lock.lock();
    let s = self.sentinel.get();
    unsafe {
      if (*s).next.is_null() {
        (*s).next = s;
        (*s).prev = s;
      }
    }
    guard
  }

  /// # Safety
  ///
  /// The bin lock must be held.
  pub unsafe fn is_empty(&self) -> bool {
    let s = self.sentinel.get();
    unsafe { (*s).next == s }
  }

  /// Appends a free chunk at the tail.
  ///
  /// # Safety
  ///
  /// The bin lock must be held and `c` must not be linked anywhere.
  pub unsafe fn push_tail(&self, c: NonNull<Chunk>) {
    let s = self.sentinel.get();
    let c = c.as_ptr();
    unsafe {
      let tail = (*s).prev;
      (*c).next = s;
      (*c).prev = tail;
      (*tail).next = c;
      (*s).prev = c;
    }
  }

  /// Pops the oldest free chunk, or `None` when the bin is empty.
  ///
  /// # Safety
  ///
  /// The bin lock must be held.
  pub unsafe fn pop_head(&self) -> Option<NonNull<Chunk>> {
    let s = self.sentinel.get();
    unsafe {
      let head = (*s).next;
      if head == s {
        return None;
      }
      let head = NonNull::new_unchecked(head);
      Self::unlink(head);
      Some(head)
    }
  }

  /// Splices a chunk out of whatever bin list it is linked into.
  ///
  /// # Safety
  ///
  /// The lock of the bin owning `c` must be held.
  pub unsafe fn unlink(c: NonNull<Chunk>) {
    let c = c.as_ptr();
    unsafe {
      (*(*c).prev).next = (*c).next;
      (*(*c).next).prev = (*c).prev;
      (*c).next = core::ptr::null_mut();
      (*c).prev = core::ptr::null_mut();
    }
  }
}
