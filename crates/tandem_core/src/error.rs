//! # Core Error Types
//!
//! Errors raised by the identity and ownership primitives.
//!
//! None of these are fatal to a running session. Callers log them and drop
//! the offending message.

use thiserror::Error;

use crate::ids::{BodyHandle, Slot};

/// Errors from the handle/slot bijection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The handle already owns a slot.
    #[error("duplicate binding: {handle} already bound to {existing}, refused {requested}")]
    DuplicateBinding {
        /// Handle that was bound twice.
        handle: BodyHandle,
        /// Slot it already owns.
        existing: Slot,
        /// Slot of the rejected bind.
        requested: Slot,
    },

    /// Another live handle owns the slot.
    #[error("{slot} is occupied by {owner}")]
    SlotOccupied {
        /// Contested slot.
        slot: Slot,
        /// Current owner.
        owner: BodyHandle,
    },

    /// The slot is beyond the registry capacity.
    #[error("{slot} out of range for capacity {capacity}")]
    SlotOutOfRange {
        /// Offending slot.
        slot: Slot,
        /// Registry capacity.
        capacity: usize,
    },
}

/// Errors from transfer buffer (de)serialization.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The word count is not a non-zero multiple of the record stride.
    #[error("malformed transfer buffer: {words} words is not a multiple of {stride}")]
    MalformedLength {
        /// Words received.
        words: usize,
        /// Record stride in words.
        stride: usize,
    },
}

/// Errors from the buffer ownership baton.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    /// The buffer is currently owned by the other context.
    #[error("transfer buffer is not owned by this context")]
    NotOwned,

    /// A buffer arrived while one is already held.
    #[error("transfer buffer received while already owned")]
    AlreadyOwned,

    /// A buffer of the wrong size arrived.
    #[error("transfer buffer capacity mismatch: expected {expected}, got {actual}")]
    CapacityMismatch {
        /// Capacity fixed at construction.
        expected: usize,
        /// Capacity of the received buffer.
        actual: usize,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Result type for handoff operations.
pub type HandoffResult<T> = Result<T, HandoffError>;
