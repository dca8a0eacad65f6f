use crate::block::Block;

/// The explicit free list: an unordered doubly-linked list threaded
/// through the payloads of free blocks, with LIFO head insertion.
///
/// The head is the only external handle. It is independent of the heap
/// base; the two were one variable in classic textbook allocators, which
/// made the list's termination depend on heap geometry. Here the list is
/// simply null-terminated.
pub struct FreeList {
  head: Option<Block>,
}

impl FreeList {
  pub fn new() -> Self {
    Self { head: None }
  }

  pub fn head(&self) -> Option<Block> {
    self.head
  }

  /// O(1) head insertion. The block must already carry free tags.
  pub unsafe fn insert(
    &mut self,
    block: Block,
  ) {
    unsafe {
      block.set_prev_free(None);
      block.set_next_free(self.head);

      if let Some(old_head) = self.head {
        old_head.set_prev_free(Some(block));
      }

      self.head = Some(block);
    }
  }

  /// O(1) unlink. The block must be in the list and still carry free
  /// tags; callers remove a block *before* marking it allocated.
  pub unsafe fn remove(
    &mut self,
    block: Block,
  ) {
    unsafe {
      let prev = block.prev_free();
      let next = block.next_free();

      match prev {
        Some(prev) => prev.set_next_free(next),
        None => self.head = next,
      }

      if let Some(next) = next {
        next.set_prev_free(prev);
      }
    }
  }

  /// Whether the block is reachable from the head. Diagnostic use only;
  /// reads links without asserting free status so it stays total on a
  /// corrupted heap.
  pub unsafe fn contains(
    &self,
    block: Block,
  ) -> bool {
    unsafe {
      let mut current = self.head;

      while let Some(candidate) = current {
        if candidate == block {
          return true;
        }
        current = candidate.next_free_unchecked();
      }

      false
    }
  }
}

impl Default for FreeList {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::{DWORD, MIN_BLOCK, WORD};
  use crate::tag::BoundaryTag;
  use std::alloc::{self, Layout};

  unsafe fn scratch_blocks<const N: usize>(buf: *mut u8) -> [Block; N] {
    unsafe {
      let mut blocks = [Block::from_payload(buf.add(WORD)); N];

      for (i, block) in blocks.iter_mut().enumerate() {
        *block = Block::from_payload(buf.add(WORD + i * MIN_BLOCK));
        block.set_tag(BoundaryTag::pack(MIN_BLOCK, false));
      }

      blocks
    }
  }

  #[test]
  fn test_lifo_insert() {
    let layout = Layout::from_size_align(4 * MIN_BLOCK, DWORD).unwrap();

    unsafe {
      let buf = alloc::alloc(layout);
      assert!(!buf.is_null());

      let [a, b, c] = scratch_blocks::<3>(buf);

      let mut list = FreeList::new();
      assert!(list.head().is_none());

      list.insert(a);
      list.insert(b);
      list.insert(c);

      // Most recently inserted first.
      assert_eq!(list.head(), Some(c));
      assert_eq!(c.next_free(), Some(b));
      assert_eq!(b.next_free(), Some(a));
      assert_eq!(a.next_free(), None);
      assert_eq!(a.prev_free(), Some(b));

      assert!(list.contains(a));
      assert!(list.contains(b));
      assert!(list.contains(c));

      alloc::dealloc(buf, layout);
    }
  }

  #[test]
  fn test_remove_head_middle_tail() {
    let layout = Layout::from_size_align(4 * MIN_BLOCK, DWORD).unwrap();

    unsafe {
      let buf = alloc::alloc(layout);
      assert!(!buf.is_null());

      let [a, b, c] = scratch_blocks::<3>(buf);

      let mut list = FreeList::new();
      list.insert(a);
      list.insert(b);
      list.insert(c);

      // Middle.
      list.remove(b);
      assert_eq!(list.head(), Some(c));
      assert_eq!(c.next_free(), Some(a));
      assert_eq!(a.prev_free(), Some(c));
      assert!(!list.contains(b));

      // Head.
      list.remove(c);
      assert_eq!(list.head(), Some(a));
      assert_eq!(a.prev_free(), None);

      // Tail, which is also the head by now.
      list.remove(a);
      assert!(list.head().is_none());
      assert!(!list.contains(a));

      alloc::dealloc(buf, layout);
    }
  }
}
