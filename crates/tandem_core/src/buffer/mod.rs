//! # Transfer Buffer
//!
//! The fixed-capacity record array exchanged once per tick.
//!
//! ## Layout
//!
//! ```text
//! slot 0                          slot 1
//! ┌──────────────┬───┬───┬──────────┬──────────────┬─── ...
//! │ transform 16 │lin│ang│ coll × 8 │ transform 16 │
//! │   (f32)      │f32│f32│  (i32)   │              │
//! └──────────────┴───┴───┴──────────┴──────────────┴─── ...
//!  word 0         16  17  18..26     26
//! ```
//!
//! Floats and integers are separate typed fields of [`TransferRecord`].
//! The raw word view exists only for transport and never leaks into callers'
//! arithmetic.

mod record;
mod transfer;

pub use record::TransferRecord;
pub use transfer::TransferBuffer;
