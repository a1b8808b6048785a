//! # Synchronization Primitives
//!
//! Ownership handoff of the transfer buffer between the control and
//! simulation contexts.
//!
//! ```text
//!   control                         simulation
//!   ┌────────────┐   TRANSFER_DATA  ┌────────────┐
//!   │ BufferBaton│ ───── move ────► │  engine    │
//!   │  (None)    │                  │  step()    │
//!   │            │ ◄──── move ───── │            │
//!   │  (Some)    │   TRANSFER_DATA  └────────────┘
//!   └────────────┘
//! ```
//!
//! Exactly one side holds the buffer at a time. The type system enforces it:
//! the buffer is moved into the outgoing message and cannot be reached until
//! it is moved back.

mod baton;

pub use baton::BufferBaton;
