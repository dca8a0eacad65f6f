use std::cmp;
use std::ptr::{self, NonNull};

use log::{debug, trace};

use crate::align::{CHUNK, DWORD, MIN_BLOCK, WORD};
use crate::align_up;
use crate::block::Block;
use crate::error::InitError;
use crate::free_list::FreeList;
use crate::provider::MemoryProvider;
use crate::tag::BoundaryTag;

/// How many same-sized fit requests in a row the finder tolerates before
/// it stops scanning and extends the heap instead. A tunable guess, not a
/// tuned optimum: it bounds the amortized scan cost when fragmentation
/// keeps defeating one recurring request size, at the price of extra heap
/// growth.
pub const REPEAT_LIMIT: u32 = 30;

/// An explicit free-list heap over a [`MemoryProvider`].
///
/// Single-threaded by construction: every operation takes `&mut self` and
/// runs to completion. The region only grows; freed blocks are recycled
/// through the free list, never returned to the provider.
pub struct Heap<P: MemoryProvider> {
  provider: P,
  /// Prologue payload address. Fixed after construction; used only for
  /// physical-order walks and boundary lookups.
  pub(crate) base: *mut u8,
  /// The free list, with its own head handle.
  pub(crate) free: FreeList,
  /// Anti-starvation state: the last adjusted size a scan satisfied, and
  /// how many times in a row it has come back.
  last_fit_size: usize,
  repeat_hits: u32,
  grown: usize,
}

impl<P: MemoryProvider> Heap<P> {
  /// Builds the prologue and epilogue sentinels and seeds the heap with
  /// one minimum-sized free block.
  pub fn new(mut provider: P) -> Result<Self, InitError> {
    let start = provider.grow(4 * WORD).ok_or(InitError)?.as_ptr();

    let base = unsafe {
      // Padding word, then the prologue header/footer pair, then the
      // epilogue header. The padding keeps payload addresses on the
      // double-word boundary.
      (start as *mut usize).write(0);

      let prologue = Block::from_payload(start.add(2 * WORD));
      prologue.set_tag(BoundaryTag::pack(DWORD, true));

      let epilogue = Block::from_payload(start.add(4 * WORD));
      epilogue.set_header(BoundaryTag::pack(0, true));

      prologue.payload()
    };

    let mut heap = Self {
      provider,
      base,
      free: FreeList::new(),
      last_fit_size: 0,
      repeat_hits: 0,
      grown: 4 * WORD,
    };

    unsafe { heap.extend(MIN_BLOCK).ok_or(InitError)? };

    debug!("heap initialized, base = {:?}", heap.base);

    Ok(heap)
  }

  /// Allocates `size` payload bytes. Returns a double-word aligned
  /// address, or `None` when `size` is 0 or the provider is exhausted.
  pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }

    // Adjusted block size: payload plus header/footer overhead, rounded
    // up to the alignment unit, never below the minimum block.
    let asize = if size <= DWORD {
      2 * DWORD
    } else {
      align_up!(size + DWORD)
    };

    unsafe {
      let block = match self.find_fit(asize) {
        Some(block) => block,
        None => self.extend(cmp::max(asize, CHUNK))?,
      };

      self.place(block, asize);

      debug!("allocated {} bytes ({} requested) at {:?}", asize, size, block.payload());

      NonNull::new(block.payload())
    }
  }

  /// Frees a previously allocated block. `None` is a no-op.
  ///
  /// # Safety
  ///
  /// `address` must have been returned by [`allocate`](Self::allocate) or
  /// [`resize`](Self::resize) on this heap and not freed since. Double
  /// frees and foreign pointers are undefined behavior; only
  /// [`check`](Self::check) may reveal the resulting corruption.
  pub unsafe fn free(&mut self, address: Option<NonNull<u8>>) {
    let Some(address) = address else {
      return;
    };

    unsafe {
      let block = Block::from_payload(address.as_ptr());
      let size = block.size();

      block.set_tag(BoundaryTag::pack(size, false));

      debug!("freed {} bytes at {:?}", size, address);

      self.coalesce(block);
    }
  }

  /// Changes the size of an allocation.
  ///
  /// A `None` address degenerates to [`allocate`](Self::allocate); a zero
  /// `size` degenerates to [`free`](Self::free) and returns `None`. If
  /// the block's total size already matches the adjusted request the same
  /// address comes back unchanged. Every other case allocates a new
  /// block, copies the lesser of the old and new usable sizes, and frees
  /// the old block. There is no in-place growth, by contract.
  ///
  /// # Safety
  ///
  /// Same contract as [`free`](Self::free) for a `Some` address.
  pub unsafe fn resize(
    &mut self,
    address: Option<NonNull<u8>>,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let Some(address) = address else {
      return self.allocate(size);
    };

    if size == 0 {
      unsafe { self.free(Some(address)) };
      return None;
    }

    unsafe {
      let block = Block::from_payload(address.as_ptr());
      let needed = cmp::max(align_up!(size) + DWORD, MIN_BLOCK);

      if needed == block.size() {
        return Some(address);
      }

      let new_address = self.allocate(size)?;
      let new_block = Block::from_payload(new_address.as_ptr());
      let preserved = cmp::min(block.payload_size(), new_block.payload_size());

      ptr::copy_nonoverlapping(address.as_ptr(), new_address.as_ptr(), preserved);

      self.free(Some(address));

      Some(new_address)
    }
  }

  /// Total bytes obtained from the provider so far. The region's
  /// high-water mark, in effect; useful for observing reuse vs. growth.
  pub fn grown_bytes(&self) -> usize {
    self.grown
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  /// Grows the region and formats the fresh space as one free block,
  /// merging it with a trailing free block if one exists. This is the
  /// only place new free space enters the heap.
  pub(crate) unsafe fn extend(&mut self, bytes: usize) -> Option<Block> {
    let size = cmp::max(align_up!(bytes), MIN_BLOCK);

    let start = self.provider.grow(size)?;
    self.grown += size;

    debug!("extended heap by {} bytes at {:?}", size, start);

    unsafe {
      // The new space begins where the old epilogue's payload would be,
      // so the block's header overwrites that epilogue.
      let block = Block::from_payload(start.as_ptr());
      block.set_tag(BoundaryTag::pack(size, false));
      block.next_in_heap().set_header(BoundaryTag::pack(0, true));

      Some(self.coalesce(block))
    }
  }

  /// First-fit scan from the free-list head, with the anti-starvation
  /// bypass: once the same adjusted size has repeated more than
  /// [`REPEAT_LIMIT`] times, skip the scan and hand out fresh space.
  unsafe fn find_fit(&mut self, asize: usize) -> Option<Block> {
    if self.last_fit_size == asize {
      if self.repeat_hits > REPEAT_LIMIT {
        trace!("fit scan bypassed for recurring {}-byte request", asize);
        return unsafe { self.extend(cmp::max(asize, MIN_BLOCK)) };
      }
      self.repeat_hits += 1;
    } else {
      self.repeat_hits = 0;
    }

    unsafe {
      let mut current = self.free.head();

      while let Some(block) = current {
        if block.size() >= asize {
          self.last_fit_size = asize;
          return Some(block);
        }
        current = block.next_free();
      }
    }

    None
  }

  /// Carves an `asize`-byte allocated block out of a free block. Splits
  /// off the remainder as a new free block when it reaches the minimum
  /// block size; otherwise the whole block is used and the excess is
  /// accepted as internal fragmentation.
  unsafe fn place(&mut self, block: Block, asize: usize) {
    unsafe {
      let total = block.size();

      // Unlink while the block still carries free tags; the link
      // accessors refuse to touch allocated blocks.
      self.free.remove(block);

      if total - asize >= MIN_BLOCK {
        block.set_tag(BoundaryTag::pack(asize, true));

        let remainder = block.next_in_heap();
        remainder.set_tag(BoundaryTag::pack(total - asize, false));

        trace!("split {} -> {} + {}", total, asize, total - asize);

        self.coalesce(remainder);
      } else {
        block.set_tag(BoundaryTag::pack(total, true));
      }
    }
  }

  /// Merges the block with its free physical neighbors, then head-inserts
  /// the result. The caller hands in a block that carries free tags but
  /// is not in the list.
  unsafe fn coalesce(&mut self, block: Block) -> Block {
    unsafe {
      let prev = block.prev_in_heap();
      let next = block.next_in_heap();

      // At the very start of the heap the preceding footer reads as size
      // zero and `prev` resolves to the block itself; treat that as an
      // allocated neighbor so nothing self-merges.
      let prev_allocated = prev == block || prev.is_allocated();
      let next_allocated = next.is_allocated();

      let mut merged = block;
      let mut size = block.size();

      match (prev_allocated, next_allocated) {
        (true, true) => {}
        (true, false) => {
          size += next.size();
          self.free.remove(next);
          merged.set_tag(BoundaryTag::pack(size, false));
        }
        (false, true) => {
          size += prev.size();
          self.free.remove(prev);
          merged = prev;
          merged.set_tag(BoundaryTag::pack(size, false));
        }
        (false, false) => {
          size += prev.size() + next.size();
          self.free.remove(prev);
          self.free.remove(next);
          merged = prev;
          merged.set_tag(BoundaryTag::pack(size, false));
        }
      }

      self.free.insert(merged);

      merged
    }
  }
}
