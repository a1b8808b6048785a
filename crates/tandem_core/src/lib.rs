//! # TANDEM Core
//!
//! Ownership, identity and layout primitives shared by the control and
//! simulation contexts:
//! - Stable handles vs. dense slots, and the bijection between them
//! - The fixed-capacity transfer buffer with a typed per-slot record
//! - Baton-pass ownership of that buffer
//! - The shared debug vertex buffer with its atomic cursor
//!
//! ## Architecture Rules
//!
//! 1. **No allocation per tick** - buffers are allocated once and moved
//! 2. **One owner at a time** - the buffer is never shared, only passed
//! 3. **No numeric sentinels for liveness** - presence is always an `Option`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem_core::{BodyHandle, Slot, SlotRegistry, TransferBuffer};
//!
//! let mut registry = SlotRegistry::new(10_000);
//! registry.bind(BodyHandle::new(7), Slot::new(3))?;
//!
//! let buffer = TransferBuffer::new(10_000);
//! let pose = buffer.transform(registry.resolve_slot(BodyHandle::new(7)).unwrap());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod debug;
pub mod error;
pub mod ids;
pub mod memory;
pub mod registry;
pub mod sync;

pub use buffer::{TransferBuffer, TransferRecord};
pub use debug::{Capabilities, DebugBuffer, DebugChannel, DebugToggle, DebugView};
pub use error::{
    BufferError, BufferResult, HandoffError, HandoffResult, RegistryError, RegistryResult,
};
pub use ids::{BodyHandle, ConstraintHandle, Handle, HandleAllocator, ShapeHandle, Slot};
pub use memory::SlotAllocator;
pub use registry::SlotRegistry;
pub use sync::BufferBaton;
