//! # Slot Memory
//!
//! Fixed-capacity slot allocation for the simulation context.
//!
//! All storage is reserved at construction. Allocation and release are O(1)
//! and never touch the heap, so adding bodies mid-session costs nothing but a
//! free-list pop.

mod slots;

pub use slots::SlotAllocator;
