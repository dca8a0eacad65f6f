use crate::block::Block;
use crate::error::Violation;
use crate::heap::Heap;
use crate::provider::MemoryProvider;

impl<P: MemoryProvider> Heap<P> {
  /// Walks the whole heap and cross-checks it against the free list.
  ///
  /// Verifies, in address order from prologue to epilogue: header and
  /// footer of every block agree; no two consecutive blocks are both
  /// free; every free-flagged block is reachable from the free-list
  /// head. Then verifies the reverse direction: everything on the list
  /// carries a free tag. All violations found are returned, not just the
  /// first; nothing is repaired.
  ///
  /// Diagnostic only; never called on the allocation path.
  pub fn check(&self) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    unsafe {
      let mut block = Block::from_payload(self.base).next_in_heap();
      let mut previous_free = false;

      // The epilogue's zero size terminates the walk.
      while block.size() != 0 {
        let address = block.payload() as usize;

        if block.tag() != block.footer_tag() {
          violations.push(Violation::TagMismatch { address });
        }

        let free = !block.is_allocated();

        if free && previous_free {
          violations.push(Violation::UncoalescedNeighbors { address });
        }

        if free && !self.free.contains(block) {
          violations.push(Violation::MissingFromFreeList { address });
        }

        previous_free = free;
        block = block.next_in_heap();
      }

      let mut current = self.free.head();

      while let Some(listed) = current {
        if listed.is_allocated() {
          violations.push(Violation::ListedButAllocated {
            address: listed.payload() as usize,
          });
        }
        // Unchecked read: the entry may just have been diagnosed as
        // allocated, and its links are still worth following.
        current = listed.next_free_unchecked();
      }
    }

    if violations.is_empty() { Ok(()) } else { Err(violations) }
  }
}
