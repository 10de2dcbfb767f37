use core::{
  ptr::NonNull,
  sync::atomic::{
    AtomicPtr,
    AtomicUsize,
    Ordering,
  },
};

use binalloc_bits::{
  align_up,
  clear_lowest_set_bit,
  lowest_set_bit,
  mask_high_bits,
};
use binalloc_sys::prelude::*;
use spin::Mutex;

use crate::{
  AllocError,
  AllocResult,
  bin::Bin,
  chunk::Chunk,
  classes::{
    bin_index,
    bin_index_up,
  },
  config::{
    C_INUSE,
    DONTCARE,
    MMAP_THRESHOLD,
    NBINS,
    OVERHEAD,
    RECLAIM,
    SIZE_ALIGN,
  },
  segment::Segment,
};

/// The process-wide heap. Lazily grows its segment on first use and is
/// never torn down.
pub static HEAP: Heap = Heap::new();

pub struct Heap {
  bins: [Bin; NBINS],
  /// One bit per bin, set while the bin is non-empty. Mutated only under
  /// the owning bin's lock; read without a lock during search, with the
  /// target bin re-checked under its own lock afterwards.
  binmap: AtomicUsize,
  segment: Mutex<Segment>,
  /// Mirror of the segment's tail-sentinel address for the lock-free
  /// top-chunk pre-check; authoritative only under the segment lock.
  top: AtomicPtr<u8>,
}

impl Heap {
  pub const fn new() -> Self {
    Self {
      bins: [const { Bin::new() }; NBINS],
      binmap: AtomicUsize::new(0),
      segment: Mutex::new(Segment::new()),
      top: AtomicPtr::new(core::ptr::null_mut()),
    }
  }

  /// Rounds a request up to a chunk size: payload plus header, in whole
  /// `SIZE_ALIGN` granules.
  fn adjust(size: usize) -> AllocResult<usize> {
    let n = size.checked_add(OVERHEAD).ok_or(AllocError::OutOfMemory)?;
    let n = align_up(n, SIZE_ALIGN);
    if n < size {
      return Err(AllocError::OutOfMemory);
    }
    debug_assert!(n % SIZE_ALIGN == 0 && n >= SIZE_ALIGN);
    Ok(n)
  }

  pub fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
    let n = Self::adjust(size)?;
    if n >= MMAP_THRESHOLD {
      return self.allocate_mapped(n);
    }

    let first = bin_index_up(n);
    loop {
      let mut mask = mask_high_bits(self.binmap.load(Ordering::Relaxed), first as u32);
      if mask == 0 {
        break;
      }
      while mask != 0 {
        let idx = lowest_set_bit(mask).trailing_zeros() as usize;
        mask = clear_lowest_set_bit(mask);
        if let Some(c) = self.try_pop(idx, n) {
          return Ok(self.finish(c, n));
        }
      }
      // Every candidate bit was stale and got cleared; re-read the map.
    }

    let c = {
      let mut seg = self.segment.lock();
      let c = seg.expand(n)?;
      self.top.store(seg.tail_sentinel(), Ordering::Relaxed);
      c
    };
    Ok(self.finish(c, n))
  }

  /// Returns an allocation to the heap.
  ///
  /// # Safety
  ///
  /// `p` must be a live payload pointer produced by this heap and must not
  /// be used again. No validation is performed.
  pub unsafe fn release(&self, p: NonNull<u8>) {
    let c = unsafe { Chunk::from_payload(p) };
    if unsafe { c.as_ref() }.is_mapped() {
      unsafe { self.unmap(c) };
      return;
    }
    unsafe { self.free_chunk(c) };
  }

  /// Resizes an allocation.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::release`]. On success the returned pointer
  /// supersedes `p`.
  pub unsafe fn reallocate(&self, p: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>> {
    let c = unsafe { Chunk::from_payload(p) };
    let n = Self::adjust(new_size)?;

    if unsafe { c.as_ref() }.is_mapped() {
      // The mapped length is not a granule multiple, but the flag bit is
      // clear, so the masked size is exact.
      if n <= unsafe { c.as_ref() }.size() {
        return Ok(p);
      }
    } else {
      let old = unsafe { c.as_ref() }.size();
      if n <= old {
        if old - n > DONTCARE {
          return Ok(self.finish(c, n));
        }
        return Ok(p);
      }

      // Grow in place when the physically next chunk is free and covers
      // the difference.
      let next = unsafe { Chunk::next_of(c) };
      let ncraw = unsafe { next.as_ref() }.csize_raw();
      if ncraw & C_INUSE == 0 && old + ncraw >= n {
        let idx = bin_index(ncraw);
        let bin = &self.bins[idx];
        let guard = bin.lock();
        if unsafe { next.as_ref() }.csize_raw() == ncraw {
          unsafe {
            Bin::unlink(next);
            if bin.is_empty() {
              self.binmap.fetch_and(!(1 << idx), Ordering::Relaxed);
            }
            let merged = old + ncraw;
            c.as_ref().set_csize(merged | C_INUSE);
            Chunk::next_of(c).as_ref().set_psize(merged | C_INUSE);
          }
          drop(guard);
          return Ok(self.finish(c, n));
        }
        // The neighbor changed under us; fall through to the move path.
      }
    }

    let np = self.allocate(new_size)?;
    let cap = unsafe { c.as_ref() }.size() - OVERHEAD;
    unsafe {
      core::ptr::copy_nonoverlapping(p.as_ptr(), np.as_ptr(), cap.min(new_size));
      self.release(p);
    }
    Ok(np)
  }

  /// Pops a chunk from bin `idx`, marking it in-use before the lock drops.
  /// Clears the binmap bit when the bin turns out empty (stale bit) or the
  /// pop drained it.
  fn try_pop(&self, idx: usize, need: usize) -> Option<NonNull<Chunk>> {
    let bin = &self.bins[idx];
    let _guard = bin.lock();
    match unsafe { bin.pop_head() } {
      None => {
        self.binmap.fetch_and(!(1 << idx), Ordering::Relaxed);
        None
      }
      Some(c) => {
        let size = unsafe { c.as_ref() }.size();
        debug_assert!(size >= need);
        unsafe {
          c.as_ref().set_csize(size | C_INUSE);
          Chunk::next_of(c).as_ref().set_psize(size | C_INUSE);
          if bin.is_empty() {
            self.binmap.fetch_and(!(1 << idx), Ordering::Relaxed);
          }
        }
        Some(c)
      }
    }
  }

  /// Takes a privately held in-use chunk of at least `n` bytes, carves off
  /// the tail when the leftover exceeds the don't-care slack, and returns
  /// the payload. The remainder goes back through the normal release path.
  fn finish(&self, c: NonNull<Chunk>, n: usize) -> NonNull<u8> {
    unsafe {
      let size = c.as_ref().size();
      debug_assert!(size >= n);
      if size - n > DONTCARE {
        let whole_next = Chunk::next_of(c);
        let rem: NonNull<Chunk> = NonNull::new_unchecked(c.as_ptr().cast::<u8>().add(n).cast());
        let rem_size = size - n;
        rem.as_ref().set_psize(n | C_INUSE);
        rem.as_ref().set_csize(rem_size | C_INUSE);
        whole_next.as_ref().set_psize(rem_size | C_INUSE);
        c.as_ref().set_csize(n | C_INUSE);
        self.free_chunk(rem);
      }
      Chunk::payload_of(c)
    }
  }

  /// Frees a privately held in-use chunk: coalesces with free physical
  /// neighbors, reclaims top pages past the threshold, then publishes the
  /// chunk into its bin.
  ///
  /// # Safety
  ///
  /// `c` must be an in-use chunk inside the managed segment owned by the
  /// caller.
  unsafe fn free_chunk(&self, c: NonNull<Chunk>) {
    let mut c = c;

    // Phase 1: absorb free neighbors. Neighbor headers are snapshot before
    // the bin locks can be chosen, so everything re-validates under the
    // locks and retries on any change. Lock order is ascending bin index.
    'coalesce: loop {
      let size = unsafe { c.as_ref() }.size();
      let psraw = unsafe { c.as_ref() }.psize_raw();
      let next = unsafe { Chunk::next_of(c) };
      let ncraw = unsafe { next.as_ref() }.csize_raw();

      let prev_free = psraw & C_INUSE == 0;
      let next_free = ncraw & C_INUSE == 0;
      if !prev_free && !next_free {
        break;
      }

      let mut idxs = [usize::MAX; 2];
      let mut count = 0;
      if prev_free {
        idxs[count] = bin_index(psraw);
        count += 1;
      }
      if next_free {
        idxs[count] = bin_index(ncraw);
        count += 1;
      }
      idxs[..count].sort_unstable();

      let guard0 = self.bins[idxs[0]].lock();
      let guard1 = if count == 2 && idxs[1] != idxs[0] {
        Some(self.bins[idxs[1]].lock())
      } else {
        None
      };

      if unsafe { c.as_ref() }.psize_raw() != psraw || unsafe { next.as_ref() }.csize_raw() != ncraw
      {
        drop(guard1);
        drop(guard0);
        continue 'coalesce;
      }

      let mut merged = size;
      let mut start = c;
      if prev_free {
        let prev = unsafe { Chunk::prev_of(c) };
        debug_assert_eq!(unsafe { prev.as_ref() }.size(), psraw);
        let idx = bin_index(psraw);
        unsafe {
          Bin::unlink(prev);
          if self.bins[idx].is_empty() {
            self.binmap.fetch_and(!(1 << idx), Ordering::Relaxed);
          }
        }
        merged += psraw;
        start = prev;
      }
      if next_free {
        let idx = bin_index(ncraw);
        unsafe {
          Bin::unlink(next);
          if self.bins[idx].is_empty() {
            self.binmap.fetch_and(!(1 << idx), Ordering::Relaxed);
          }
        }
        merged += ncraw;
      }

      unsafe {
        start.as_ref().set_csize(merged | C_INUSE);
        Chunk::next_of(start).as_ref().set_psize(merged | C_INUSE);
      }
      c = start;
      drop(guard1);
      drop(guard0);
      // A new neighbor may have been freed meanwhile; look again.
    }

    // Phase 2: a big free chunk at the very top gives its excess pages
    // back instead of sitting in a bin indefinitely.
    let size = unsafe { c.as_ref() }.size();
    if size > RECLAIM
      && unsafe { Chunk::next_of(c) }.as_ptr().cast::<u8>() == self.top.load(Ordering::Relaxed)
    {
      let mut seg = self.segment.lock();
      if seg.shrink(c) {
        self.top.store(seg.tail_sentinel(), Ordering::Relaxed);
      }
    }

    // Phase 3: publish into the final size class. The in-use flag clears
    // under the bin lock so a neighbor cannot observe the chunk free
    // without also serializing on this bin.
    let size = unsafe { c.as_ref() }.size();
    let idx = bin_index(size);
    let bin = &self.bins[idx];
    let _guard = bin.lock();
    unsafe {
      let was_empty = bin.is_empty();
      c.as_ref().set_csize(size);
      Chunk::next_of(c).as_ref().set_psize(size);
      bin.push_tail(c);
      if was_empty {
        self.binmap.fetch_or(1 << idx, Ordering::Relaxed);
      }
    }
  }

  /// Direct OS-backed path for large requests; no bin state is touched.
  /// The header records the offset back to the mapping base in `psize` and
  /// leaves the in-use bit clear, which is what `is_mapped` keys on.
  fn allocate_mapped(&self, n: usize) -> AllocResult<NonNull<u8>> {
    let extra = SIZE_ALIGN - OVERHEAD;
    let full = n
      .checked_add(extra)
      .map(page_align)
      .and_then(Result::ok)
      .ok_or(AllocError::OutOfMemory)?;

    let slice = unsafe { GLOBAL_SYSTEM.alloc(full, SysOption::Commit) }
      .map_err(|_| AllocError::OutOfMemory)?;

    let c = unsafe { slice.as_mut_ptr().add(extra) }.cast::<Chunk>();
    unsafe {
      (*c).set_psize(extra);
      (*c).set_csize(full - extra);
      Ok(Chunk::payload_of(NonNull::new_unchecked(c)))
    }
  }

  /// # Safety
  ///
  /// `c` must be a mapped chunk that is never touched again.
  unsafe fn unmap(&self, c: NonNull<Chunk>) {
    let extra = unsafe { c.as_ref() }.psize_raw();
    let len = unsafe { c.as_ref() }.csize_raw();
    let base = unsafe { c.as_ptr().cast::<u8>().sub(extra) };
    let slice = unsafe { core::slice::from_raw_parts(base, len + extra) };
    let _ = unsafe { GLOBAL_SYSTEM.dealloc(slice) };
  }
}

#[cfg(test)]
impl Heap {
  /// Committed bytes of the managed segment.
  pub(crate) fn managed_bytes(&self) -> usize {
    self.segment.lock().grown()
  }

  /// Walks the segment by boundary tags at a quiescent point and counts
  /// (free, in-use) chunks, sentinels excluded.
  pub(crate) fn chunk_census(&self) -> (usize, usize) {
    let seg = self.segment.lock();
    let base = seg.base();
    let brk = seg.brk();
    if base.is_null() || brk == base {
      return (0, 0);
    }

    let mut free = 0;
    let mut used = 0;
    let tail = unsafe { brk.sub(SIZE_ALIGN) };
    let mut p = unsafe { base.add(SIZE_ALIGN) };
    while (p as usize) < tail as usize {
      let raw = unsafe { (*p.cast::<Chunk>()).csize_raw() };
      if raw & C_INUSE == 0 {
        free += 1;
      } else {
        used += 1;
      }
      p = unsafe { p.add(raw & !C_INUSE) };
    }
    (free, used)
  }

  /// Checks every binmap bit against actual bin emptiness under the bin
  /// locks.
  pub(crate) fn binmap_consistent(&self) -> bool {
    for idx in 0..NBINS {
      let bin = &self.bins[idx];
      let _guard = bin.lock();
      let bit = self.binmap.load(Ordering::Relaxed) & (1 << idx) != 0;
      if bit == unsafe { bin.is_empty() } {
        return false;
      }
    }
    true
  }
}
