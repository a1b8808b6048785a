//! # Transfer Layout & Session Constants
//!
//! The per-slot record layout is shared by both execution contexts.
//!
//! **CRITICAL:** Both sides must agree on every value in this file.
//! A mismatch shows up as garbage transforms, not as an error.

// =============================================================================
// TRANSFER RECORD LAYOUT (in 4-byte words)
// =============================================================================

/// Number of words holding the 4x4 transform matrix.
pub const MATRIX_WORDS: usize = 16;

/// Word offset of the column-major transform within a record.
pub const MATRIX_OFFSET: usize = 0;

/// Word offset of the linear velocity magnitude.
pub const LINEAR_VELOCITY_OFFSET: usize = 16;

/// Word offset of the angular velocity magnitude.
pub const ANGULAR_VELOCITY_OFFSET: usize = 17;

/// Word offset of the first collision partner entry.
pub const COLLISIONS_OFFSET: usize = 18;

/// Collision partner entries per record.
pub const MAX_COLLISIONS_PER_BODY: usize = 8;

/// Record stride in words.
pub const BODY_DATA_SIZE: usize = COLLISIONS_OFFSET + MAX_COLLISIONS_PER_BODY;

/// Sentinel stored in unused collision entries.
pub const NO_COLLISION: i32 = -1;

// =============================================================================
// SESSION DEFAULTS
// =============================================================================

/// Default slot capacity of the transfer buffer.
pub const DEFAULT_MAX_BODIES: usize = 10_000;

/// Default debug vertex capacity, reserved on first enable.
pub const DEFAULT_DEBUG_VERTEX_CAPACITY: usize = 1_000_000;

/// Default fixed simulation step in seconds (60Hz).
pub const DEFAULT_FIXED_TIME_STEP: f32 = 1.0 / 60.0;

/// Default maximum sub-steps per round trip.
pub const DEFAULT_MAX_SUB_STEPS: u32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_contiguous() {
        assert_eq!(MATRIX_OFFSET + MATRIX_WORDS, LINEAR_VELOCITY_OFFSET);
        assert_eq!(LINEAR_VELOCITY_OFFSET + 1, ANGULAR_VELOCITY_OFFSET);
        assert_eq!(ANGULAR_VELOCITY_OFFSET + 1, COLLISIONS_OFFSET);
        assert_eq!(BODY_DATA_SIZE, 26);
    }
}
