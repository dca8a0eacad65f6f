//! # flalloc - An Explicit Free-List Memory Allocator
//!
//! This crate implements a classic **explicit free-list allocator** over a
//! single contiguous, monotonically growing heap region, exposing
//! allocate/free/resize operations analogous to `malloc`/`free`/`realloc`.
//!
//! ## Overview
//!
//! Every block in the heap carries a boundary tag at both ends, and free
//! blocks are threaded into a doubly-linked list through their payloads:
//!
//! ```text
//!   Heap Region:
//!
//!   ┌─────┬──────────┬───────────┬───────────┬───────────┬──────────┐
//!   │ pad │ prologue │ allocated │   free    │ allocated │ epilogue │
//!   └─────┴──────────┴───────────┴───────────┴───────────┴──────────┘
//!         (sentinel)                  │                   (sentinel)
//!                                     │
//!             free-list head ─────────┘
//!
//!   Each block, allocated or free:
//!
//!   ┌──────────┬──────────────────────────────────────────┬──────────┐
//!   │ size | a │                 payload                  │ size | a │
//!   └──────────┴──────────────────────────────────────────┴──────────┘
//!     header     (free blocks: prev/next links live here)    footer
//! ```
//!
//! Allocation is **first fit** over the free list with LIFO head
//! insertion, splitting off remainders that reach the minimum block size.
//! Freeing coalesces immediately with both physical neighbors, so no two
//! adjacent blocks are ever both free. When the same request size keeps
//! recurring, an anti-starvation heuristic stops rescanning a list that
//! keeps failing it and grows the heap instead.
//!
//! ## Crate Structure
//!
//! ```text
//!   flalloc
//!   ├── align      - Alignment constants and the align_up! macro
//!   ├── tag        - BoundaryTag: size + allocated flag in one word
//!   ├── block      - Block navigation over raw heap memory (internal)
//!   ├── free_list  - The doubly-linked free list (internal)
//!   ├── provider   - MemoryProvider trait, Sbrk and Arena providers
//!   ├── heap       - Heap: allocate / free / resize
//!   ├── check      - Heap::check, the offline consistency checker
//!   └── error      - InitError and Violation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use flalloc::{Arena, Heap};
//!
//! let mut heap = Heap::new(Arena::new(64 * 1024)).unwrap();
//!
//! let ptr = heap.allocate(100).unwrap();
//!
//! unsafe {
//!     ptr.as_ptr().write(42);
//!     assert_eq!(ptr.as_ptr().read(), 42);
//!
//!     // Shrinks keep the payload prefix; the block may move.
//!     let smaller = heap.resize(Some(ptr), 10).unwrap();
//!     assert_eq!(smaller.as_ptr().read(), 42);
//!
//!     heap.free(Some(smaller));
//! }
//!
//! assert!(heap.check().is_ok());
//! ```
//!
//! On Unix, [`Sbrk`] grows the real program break instead of an owned
//! slab; see `demos/sbrk.rs` for a walkthrough.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: every operation takes `&mut Heap`; wrap it
//!   in your own lock if you must share it.
//! - **The heap never shrinks**: freed blocks are recycled, not returned
//!   to the provider.
//! - **Resize always copies**: unless the adjusted size is an exact
//!   match, `resize` allocates, copies, and frees - it never grows a
//!   block in place.
//! - **Misuse is undefined behavior**: double frees and foreign pointers
//!   are not detected at call time; [`Heap::check`] may reveal the
//!   resulting corruption after the fact.

pub mod align;
mod block;
mod check;
mod error;
mod free_list;
mod heap;
mod provider;
mod tag;

pub use error::{InitError, Violation};
pub use heap::{Heap, REPEAT_LIMIT};
pub use provider::{Arena, MemoryProvider, Sbrk};
pub use tag::BoundaryTag;
