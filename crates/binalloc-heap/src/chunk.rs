use core::{
  ptr::NonNull,
  sync::atomic::{
    AtomicUsize,
    Ordering,
  },
};

use crate::config::{
  C_INUSE,
  OVERHEAD,
};

/// Boundary-tagged chunk header. Lives at the start of every unit of heap
/// memory; `next`/`prev` overlap the payload and are only meaningful while
/// the chunk sits in a bin, guarded by that bin's lock.
///
/// `psize` and `csize` are relaxed atomics: the coalescer has to read
/// neighbor headers before it knows which bin locks to take, so those reads
/// are racy by construction and get re-validated under the locks.
#[repr(C)]
pub struct Chunk {
  pub(crate) psize: AtomicUsize,
  pub(crate) csize: AtomicUsize,
  pub(crate) next: *mut Chunk,
  pub(crate) prev: *mut Chunk,
}

impl Chunk {
  pub const fn new() -> Self {
    Self {
      psize: AtomicUsize::new(0),
      csize: AtomicUsize::new(0),
      next: core::ptr::null_mut(),
      prev: core::ptr::null_mut(),
    }
  }

  /// Own size with the flag bit masked off.
  #[inline(always)]
  pub fn size(&self) -> usize {
    self.csize.load(Ordering::Relaxed) & !C_INUSE
  }

  /// Predecessor's size with the flag bit masked off. Only meaningful when
  /// the predecessor is free.
  #[inline(always)]
  pub fn psize(&self) -> usize {
    self.psize.load(Ordering::Relaxed) & !C_INUSE
  }

  #[inline(always)]
  pub fn csize_raw(&self) -> usize {
    self.csize.load(Ordering::Relaxed)
  }

  #[inline(always)]
  pub fn psize_raw(&self) -> usize {
    self.psize.load(Ordering::Relaxed)
  }

  #[inline(always)]
  pub fn set_csize(&self, raw: usize) {
    self.csize.store(raw, Ordering::Relaxed);
  }

  #[inline(always)]
  pub fn set_psize(&self, raw: usize) {
    self.psize.store(raw, Ordering::Relaxed);
  }

  #[inline(always)]
  pub fn in_use(&self) -> bool {
    self.csize.load(Ordering::Relaxed) & C_INUSE != 0
  }

  /// Mapped-allocation discriminator: a chunk handed to release with the
  /// in-use bit clear never lived in the managed segment.
  #[inline(always)]
  pub fn is_mapped(&self) -> bool {
    !self.in_use()
  }

  /// Physically next chunk.
  ///
  /// # Safety
  ///
  /// `c` must be a live chunk inside the managed segment and not the tail
  /// sentinel; the successor of a mapped chunk does not exist.
  #[inline(always)]
  pub unsafe fn next_of(c: NonNull<Chunk>) -> NonNull<Chunk> {
    let size = unsafe { c.as_ref() }.size();
    unsafe { NonNull::new_unchecked(c.as_ptr().cast::<u8>().add(size).cast()) }
  }

  /// Physically previous chunk, located through the boundary tag.
  ///
  /// # Safety
  ///
  /// `c` must be a live chunk inside the managed segment, not the head
  /// sentinel, and its predecessor must be free (otherwise `psize` is
  /// stale).
  #[inline(always)]
  pub unsafe fn prev_of(c: NonNull<Chunk>) -> NonNull<Chunk> {
    let psize = unsafe { c.as_ref() }.psize();
    unsafe { NonNull::new_unchecked(c.as_ptr().cast::<u8>().sub(psize).cast()) }
  }

  /// Payload pointer for a chunk: fixed `OVERHEAD` offset, no validation.
  ///
  /// # Safety
  ///
  /// `c` must point at a real chunk header.
  #[inline(always)]
  pub unsafe fn payload_of(c: NonNull<Chunk>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(c.as_ptr().cast::<u8>().add(OVERHEAD)) }
  }

  /// Recovers the chunk header from a payload pointer. Passing a pointer
  /// this allocator never returned is a caller error with undefined
  /// behavior, matching the malloc contract.
  ///
  /// # Safety
  ///
  /// `p` must be a payload pointer previously produced by `payload_of`.
  #[inline(always)]
  pub unsafe fn from_payload(p: NonNull<u8>) -> NonNull<Chunk> {
    unsafe { NonNull::new_unchecked(p.as_ptr().sub(OVERHEAD).cast()) }
  }
}
