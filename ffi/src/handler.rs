use libc::FILE;

#[cfg(target_os = "linux")]
unsafe extern "C" {
  static mut stderr: *mut FILE;
}

#[cfg(target_os = "macos")]
unsafe extern "C" {
  #[link_name = "__stderrp"]
  static mut stderr: *mut FILE;
}

#[cfg(not(test))]
#[panic_handler]
pub fn panic_handler(info: &core::panic::PanicInfo) -> ! {
  unsafe {
    // Panic messages and locations are not NUL terminated; print with an
    // explicit length.
    if let Some(message) = info.message().as_str() {
      libc::fprintf(
        stderr,
        b"panic: %.*s\n\0".as_ptr() as *const i8,
        message.len() as i32,
        message.as_ptr() as *const i8,
      );
    } else {
      libc::fprintf(stderr, b"panic: (no message)\n\0".as_ptr() as *const i8);
    }

    if let Some(loc) = info.location() {
      libc::fprintf(
        stderr,
        b"at %.*s:%d:%d\n\0".as_ptr() as *const i8,
        loc.file().len() as i32,
        loc.file().as_ptr() as *const i8,
        loc.line() as i32,
        loc.column() as i32,
      );
    }

    libc::abort();
  }
}
