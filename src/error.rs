use thiserror::Error;

/// The memory provider could not supply the initial heap bytes. Fatal:
/// there is no heap to operate on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("memory provider could not supply the initial heap")]
pub struct InitError;

/// A broken heap invariant, reported by the consistency checker. These
/// are diagnoses, not exceptions: the checker collects them and repairs
/// nothing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
  #[error("header and footer disagree for the block at {address:#x}")]
  TagMismatch { address: usize },

  #[error("adjacent free blocks at {address:#x} escaped coalescing")]
  UncoalescedNeighbors { address: usize },

  #[error("free block at {address:#x} is missing from the free list")]
  MissingFromFreeList { address: usize },

  #[error("free-list entry at {address:#x} is marked allocated")]
  ListedButAllocated { address: usize },
}
