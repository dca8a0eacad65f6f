use std::alloc::{self, Layout};
use std::ptr::NonNull;

use libc::{c_void, intptr_t, sbrk};

use crate::align::DWORD;

/// Where the heap's bytes come from.
///
/// The heap only ever asks for more space at the top of the region, in
/// double-word multiples, and never gives any back.
///
/// # Safety
///
/// Implementors must return the start of `extra` fresh bytes that are
/// valid for reads and writes, do not overlap any range returned before,
/// and directly follow the previously returned range (addresses strictly
/// increase across calls, with no gaps once the first call has been made).
pub unsafe trait MemoryProvider {
  /// Makes `extra` more bytes available and returns their starting
  /// address, or `None` when the provider is exhausted.
  fn grow(&mut self, extra: usize) -> Option<NonNull<u8>>;
}

/// Grows the process data segment through `sbrk(2)`.
///
/// The first call pads the program break up to a double-word boundary so
/// that every payload address the heap derives from it stays aligned;
/// later calls keep that property because the heap only requests
/// double-word multiples.
pub struct Sbrk;

unsafe impl MemoryProvider for Sbrk {
  fn grow(&mut self, extra: usize) -> Option<NonNull<u8>> {
    unsafe {
      let brk = sbrk(0);

      if brk == usize::MAX as *mut c_void {
        return None;
      }

      let pad = (DWORD - brk as usize % DWORD) % DWORD;
      let address = sbrk((pad + extra) as intptr_t);

      if address == usize::MAX as *mut c_void {
        return None;
      }

      NonNull::new((address as *mut u8).add(pad))
    }
  }
}

/// A fixed-capacity provider over one owned slab. Exhausts instead of
/// growing past its capacity, which makes out-of-memory paths testable
/// without touching the real program break.
pub struct Arena {
  base: *mut u8,
  capacity: usize,
  used: usize,
}

impl Arena {
  pub fn new(capacity: usize) -> Self {
    let layout = Self::layout(capacity);
    let base = unsafe { alloc::alloc(layout) };

    if base.is_null() {
      alloc::handle_alloc_error(layout);
    }

    Self { base, capacity, used: 0 }
  }

  pub fn used(&self) -> usize {
    self.used
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  fn layout(capacity: usize) -> Layout {
    Layout::from_size_align(capacity, DWORD).expect("arena capacity overflows a layout")
  }
}

unsafe impl MemoryProvider for Arena {
  fn grow(&mut self, extra: usize) -> Option<NonNull<u8>> {
    if self.capacity - self.used < extra {
      return None;
    }

    let address = unsafe { self.base.add(self.used) };
    self.used += extra;

    NonNull::new(address)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base, Self::layout(self.capacity)) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_arena_addresses_increase() {
    let mut arena = Arena::new(256);

    let first = arena.grow(64).unwrap();
    let second = arena.grow(64).unwrap();

    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 64);
    assert_eq!(arena.used(), 128);
  }

  #[test]
  fn test_arena_alignment() {
    let mut arena = Arena::new(256);

    let address = arena.grow(32).unwrap();

    assert_eq!(address.as_ptr() as usize % DWORD, 0);
  }

  #[test]
  fn test_arena_exhaustion() {
    let mut arena = Arena::new(64);

    assert!(arena.grow(48).is_some());
    assert!(arena.grow(32).is_none());

    // A smaller request that still fits must succeed after a failure.
    assert!(arena.grow(16).is_some());
    assert!(arena.grow(1).is_none());
  }
}
