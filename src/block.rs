use crate::align::{DWORD, WORD};
use crate::tag::BoundaryTag;

/// A heap block, identified by its payload address.
///
/// ```text
///            header                            footer
///   ┌──────────┬──────────────────────────────┬──────────┐
///   │ size | a │           payload            │ size | a │
///   └──────────┴──────────────────────────────┴──────────┘
///              ▲
///              └── the `Block` pointer (and what callers receive)
/// ```
///
/// While a block is free, the first two payload words are reinterpreted as
/// the free-list `prev` and `next` links:
///
/// ```text
///   ┌──────────┬──────────┬──────────┬────────┬──────────┐
///   │ size | 0 │   prev   │   next   │  ...   │ size | 0 │
///   └──────────┴──────────┴──────────┴────────┴──────────┘
/// ```
///
/// A `Block` is a bare pointer; every method that touches heap memory is
/// unsafe and requires the pointer to sit inside an initialized heap.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Block(*mut u8);

impl Block {
  pub fn from_payload(payload: *mut u8) -> Self {
    Self(payload)
  }

  pub fn payload(self) -> *mut u8 {
    self.0
  }

  fn header_ptr(self) -> *mut usize {
    self.0.wrapping_sub(WORD) as *mut usize
  }

  unsafe fn footer_ptr(self) -> *mut usize {
    unsafe { self.0.add(self.size() - DWORD) as *mut usize }
  }

  pub unsafe fn tag(self) -> BoundaryTag {
    unsafe { BoundaryTag::from_raw(self.header_ptr().read()) }
  }

  pub unsafe fn footer_tag(self) -> BoundaryTag {
    unsafe { BoundaryTag::from_raw(self.footer_ptr().read()) }
  }

  pub unsafe fn size(self) -> usize {
    unsafe { self.tag().size() }
  }

  pub unsafe fn is_allocated(self) -> bool {
    unsafe { self.tag().is_allocated() }
  }

  /// Usable payload bytes: total size minus the two tag words.
  pub unsafe fn payload_size(self) -> usize {
    unsafe { self.size() - DWORD }
  }

  /// Writes the tag to the header and then to the footer the new size
  /// implies. Header first: the footer position moves with the size.
  pub unsafe fn set_tag(
    self,
    tag: BoundaryTag,
  ) {
    unsafe {
      self.header_ptr().write(tag.raw());
      self.footer_ptr().write(tag.raw());
    }
  }

  /// Writes the header only. Used for the epilogue, which has no footer.
  pub unsafe fn set_header(
    self,
    tag: BoundaryTag,
  ) {
    unsafe { self.header_ptr().write(tag.raw()) }
  }

  /// The physically following block.
  pub unsafe fn next_in_heap(self) -> Block {
    unsafe { Block(self.0.add(self.size())) }
  }

  /// The physically preceding block, located through its footer. At the
  /// low end of the heap the preceding footer reads as size 0 and this
  /// resolves to the block itself; the coalescer guards against that.
  pub unsafe fn prev_in_heap(self) -> Block {
    unsafe {
      let footer = BoundaryTag::from_raw((self.0.sub(DWORD) as *const usize).read());

      Block(self.0.sub(footer.size()))
    }
  }

  // Free-list links. Only meaningful while the block is free; the normal
  // accessors assert that, the unchecked ones exist for the checker,
  // which must be able to look at a corrupted heap without tripping the
  // assertion it is there to report.

  fn prev_link_ptr(self) -> *mut *mut u8 {
    self.0 as *mut *mut u8
  }

  fn next_link_ptr(self) -> *mut *mut u8 {
    self.0.wrapping_add(WORD) as *mut *mut u8
  }

  pub unsafe fn prev_free(self) -> Option<Block> {
    unsafe {
      debug_assert!(!self.is_allocated(), "free-list link read from an allocated block");

      self.prev_free_unchecked()
    }
  }

  pub unsafe fn next_free(self) -> Option<Block> {
    unsafe {
      debug_assert!(!self.is_allocated(), "free-list link read from an allocated block");

      self.next_free_unchecked()
    }
  }

  pub(crate) unsafe fn prev_free_unchecked(self) -> Option<Block> {
    let link = unsafe { self.prev_link_ptr().read() };

    (!link.is_null()).then_some(Block(link))
  }

  pub(crate) unsafe fn next_free_unchecked(self) -> Option<Block> {
    let link = unsafe { self.next_link_ptr().read() };

    (!link.is_null()).then_some(Block(link))
  }

  pub unsafe fn set_prev_free(
    self,
    prev: Option<Block>,
  ) {
    unsafe {
      debug_assert!(!self.is_allocated(), "free-list link written to an allocated block");

      self
        .prev_link_ptr()
        .write(prev.map_or(std::ptr::null_mut(), Block::payload));
    }
  }

  pub unsafe fn set_next_free(
    self,
    next: Option<Block>,
  ) {
    unsafe {
      debug_assert!(!self.is_allocated(), "free-list link written to an allocated block");

      self
        .next_link_ptr()
        .write(next.map_or(std::ptr::null_mut(), Block::payload));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::MIN_BLOCK;
  use std::alloc::{self, Layout};

  #[test]
  fn test_tags_and_navigation() {
    let layout = Layout::from_size_align(4 * MIN_BLOCK, DWORD).unwrap();

    unsafe {
      let buf = alloc::alloc(layout);
      assert!(!buf.is_null());

      // Two adjacent blocks, the first one's header at the buffer start.
      let first = Block::from_payload(buf.add(WORD));
      first.set_tag(BoundaryTag::pack(MIN_BLOCK, false));

      let second = first.next_in_heap();
      second.set_tag(BoundaryTag::pack(2 * MIN_BLOCK, true));

      assert_eq!(second.payload(), buf.add(WORD + MIN_BLOCK));
      assert_eq!(second.prev_in_heap(), first);

      assert_eq!(first.size(), MIN_BLOCK);
      assert!(!first.is_allocated());
      assert_eq!(first.tag(), first.footer_tag());

      assert_eq!(second.payload_size(), 2 * MIN_BLOCK - DWORD);
      assert!(second.is_allocated());

      alloc::dealloc(buf, layout);
    }
  }

  #[test]
  fn test_free_links() {
    let layout = Layout::from_size_align(4 * MIN_BLOCK, DWORD).unwrap();

    unsafe {
      let buf = alloc::alloc(layout);
      assert!(!buf.is_null());

      let a = Block::from_payload(buf.add(WORD));
      a.set_tag(BoundaryTag::pack(MIN_BLOCK, false));

      let b = a.next_in_heap();
      b.set_tag(BoundaryTag::pack(MIN_BLOCK, false));

      a.set_prev_free(None);
      a.set_next_free(Some(b));
      b.set_prev_free(Some(a));
      b.set_next_free(None);

      assert_eq!(a.prev_free(), None);
      assert_eq!(a.next_free(), Some(b));
      assert_eq!(b.prev_free(), Some(a));
      assert_eq!(b.next_free(), None);

      alloc::dealloc(buf, layout);
    }
  }
}
