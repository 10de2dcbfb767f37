#[cfg(any(target_os = "linux", target_os = "macos"))]
use crate::unix::UNIX_SYSTEM;

#[derive(Debug, PartialEq)]
pub enum SysError {
  Unsupported,
  OutOfMemory,
  InvalidArgument,
}

#[derive(Debug, Clone, Copy)]
pub enum SysOption {
  /// Readable/writable, backed by pages on demand.
  Commit,
  /// Address space only; any access faults until committed.
  Reserve,
  /// Give the backing pages back to the OS, keeping the address range.
  Reclaim,
}

pub type SysResult<T> = Result<T, SysError>;

/// Low-level system memory management trait.
///
/// # Safety
///
/// Implementors must ensure that:
/// - `alloc` returns valid, page-aligned memory usable per `options`
/// - `modify` and `dealloc` only operate on memory previously allocated by
///   this system and still valid
/// - memory is not accessed after `dealloc`
pub unsafe trait System
where
  Self: Send + Sync,
{
  /// Allocates a page-aligned region from the system.
  ///
  /// # Safety
  ///
  /// Caller must ensure `size` is page-aligned and only use the returned
  /// memory according to `options`.
  unsafe fn alloc<'mem>(&self, size: usize, options: SysOption) -> SysResult<&'mem mut [u8]> {
    _ = (size, options);
    Err(SysError::Unsupported)
  }

  /// Changes protection (`Commit`/`Reserve`) or advises reclaim of a
  /// sub-range of a region obtained from `alloc`.
  ///
  /// # Safety
  ///
  /// Caller must ensure `slice` lies inside a live allocation of this
  /// system and is page-aligned in address and length.
  unsafe fn modify(&self, slice: &[u8], options: SysOption) -> SysResult<()> {
    _ = (slice, options);
    Err(SysError::Unsupported)
  }

  /// Unmaps a region previously returned by `alloc`.
  ///
  /// # Safety
  ///
  /// Caller must ensure `slice` is exactly a live allocation of this
  /// system and never touch it afterwards.
  unsafe fn dealloc(&self, slice: &[u8]) -> SysResult<()> {
    _ = slice;
    Err(SysError::Unsupported)
  }
}

pub struct UnsupportedSystem {}
unsafe impl System for UnsupportedSystem {}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub static GLOBAL_SYSTEM: &dyn System = &UNIX_SYSTEM;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub static GLOBAL_SYSTEM: &dyn System = &UnsupportedSystem {};

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prim::page_size;

  #[test]
  fn test_alloc_commit_roundtrip() {
    let ps = page_size();
    let slice = unsafe { GLOBAL_SYSTEM.alloc(ps * 2, SysOption::Commit) }.unwrap();
    assert_eq!(slice.len(), ps * 2);
    slice[0] = 0xaa;
    slice[ps * 2 - 1] = 0xbb;
    assert_eq!(slice[0], 0xaa);
    unsafe { GLOBAL_SYSTEM.dealloc(slice) }.unwrap();
  }

  #[test]
  fn test_alloc_unaligned_rejected() {
    let err = unsafe { GLOBAL_SYSTEM.alloc(123, SysOption::Commit) };
    assert!(matches!(err, Err(SysError::InvalidArgument)));
  }

  #[test]
  fn test_reserve_then_commit() {
    let ps = page_size();
    let slice = unsafe { GLOBAL_SYSTEM.alloc(ps * 4, SysOption::Reserve) }.unwrap();
    let head = &slice[..ps];
    unsafe { GLOBAL_SYSTEM.modify(head, SysOption::Commit) }.unwrap();
    let p = head.as_ptr() as *mut u8;
    unsafe { p.write(7) };
    assert_eq!(unsafe { p.read() }, 7);
    unsafe { GLOBAL_SYSTEM.dealloc(slice) }.unwrap();
  }

  #[test]
  fn test_reclaim() {
    let ps = page_size();
    let slice = unsafe { GLOBAL_SYSTEM.alloc(ps, SysOption::Commit) }.unwrap();
    slice[0] = 1;
    unsafe { GLOBAL_SYSTEM.modify(slice, SysOption::Reclaim) }.unwrap();
    // Pages are zero-filled on next touch after a reclaim.
    assert_eq!(slice[0], 0);
    unsafe { GLOBAL_SYSTEM.dealloc(slice) }.unwrap();
  }
}
