use binalloc_sys::prelude::word_width;

/// Chunk sizes are multiples of four words, reserving the low bits of the
/// size fields for flags.
pub const SIZE_ALIGN: usize = 4 * word_width();

/// Header bytes in front of every payload (`psize` + `csize`).
pub const OVERHEAD: usize = 2 * word_width();

/// Requests at or above this bypass the bins and go straight to the OS.
pub const MMAP_THRESHOLD: usize = 0x1c00 * SIZE_ALIGN;

/// Leftover at or below this is not worth splitting off a chunk for.
pub const DONTCARE: usize = 16;

/// A free top chunk larger than this gives its excess pages back.
pub const RECLAIM: usize = 163840;

/// In-use flag in the low bit of `csize` (and mirrored into the successor's
/// `psize`). A chunk reaching release with this bit clear is a mapped one.
pub const C_INUSE: usize = 1;

/// Total number of size-class bins.
pub const NBINS: usize = 64;

/// Bins 0..=EXACT_LIMIT hold exactly one size each (`units - 1` granules);
/// everything above is exponentially spaced by shared highest bit.
pub const EXACT_LIMIT: usize = 32;

/// Address space reserved up front for the managed segment. The committed
/// prefix plays the role of the program break.
pub const SEGMENT_RESERVE: usize = 1 << 30;

// The non-empty-bins map is one machine word.
const _: () = assert!(usize::BITS as usize >= NBINS);
