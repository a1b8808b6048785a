//! # Debug Geometry Channel
//!
//! Line geometry produced by the simulation and consumed by the renderer,
//! exchanged through genuinely shared memory instead of the transfer buffer.
//!
//! ```text
//!   simulation                         control (once per tick)
//!   push_line() ──► fetch_add(cursor)   sync(): count = swap(cursor, 0)
//!                   write positions     draw range = 0..count
//!                   write colors        needs_upload = true
//! ```
//!
//! The simulation may append while the control side reads. A line written
//! during the read shows up one tick late or is overwritten; that is
//! acceptable for debug output.

mod channel;

pub use channel::{Capabilities, DebugBuffer, DebugChannel, DebugToggle, DebugView};
