use crate::align::DWORD;

/// A boundary tag: a block's size and allocated flag packed into one word.
///
/// Sizes are always multiples of [`DWORD`], so their low bits are zero and
/// the lowest bit is free to carry the allocated flag. Every header and
/// footer in the heap is one of these; the packing lives here and nowhere
/// else.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoundaryTag(usize);

impl BoundaryTag {
  pub fn pack(
    size: usize,
    allocated: bool,
  ) -> Self {
    debug_assert_eq!(size % DWORD, 0, "block sizes are double-word multiples");

    Self(size | allocated as usize)
  }

  pub fn from_raw(word: usize) -> Self {
    Self(word)
  }

  pub fn raw(self) -> usize {
    self.0
  }

  pub fn size(self) -> usize {
    self.0 & !(DWORD - 1)
  }

  pub fn is_allocated(self) -> bool {
    self.0 & 0x1 == 0x1
  }
}
