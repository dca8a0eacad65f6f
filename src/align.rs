use std::mem;

/// One machine word in bytes: the width of a single boundary tag.
pub const WORD: usize = mem::size_of::<usize>();

/// Double word: the alignment unit. Every block size, and every payload
/// address handed to a caller, is a multiple of this.
pub const DWORD: usize = 2 * WORD;

/// Smallest legal block: header + footer + the two free-list link words.
pub const MIN_BLOCK: usize = 2 * DWORD;

/// Default heap extension, amortizing the cost of repeated small growth
/// requests.
pub const CHUNK: usize = 1 << 12;

/// Rounds the given size up to the next multiple of [`DWORD`].
///
/// # Examples
///
/// ```rust
/// use flalloc::align_up;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align_up!(17), 32), // 64 bit machine.
///     4 => assert_eq!(align_up!(17), 24), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align_up {
  ($value:expr) => {
    (($value) + $crate::align::DWORD - 1) & !($crate::align::DWORD - 1)
  };
}
