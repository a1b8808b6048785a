//! # TANDEM Shared
//!
//! Common types used by both the control context and the simulation context.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - channel or threading crates
//! - the simulation engine
//! - anything that owns a transfer buffer
//!
//! If you need ownership or synchronization types, put them in `tandem_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod debug;
pub mod math;
pub mod options;

pub use constants::{
    ANGULAR_VELOCITY_OFFSET, BODY_DATA_SIZE, COLLISIONS_OFFSET, DEFAULT_MAX_BODIES,
    LINEAR_VELOCITY_OFFSET, MATRIX_OFFSET, MATRIX_WORDS, MAX_COLLISIONS_PER_BODY, NO_COLLISION,
};
pub use debug::DebugDrawMode;
pub use math::{Mat4, Quaternion, Vec3};
pub use options::{
    ActivationState, BodyKind, BodyOptions, ConstraintKind, ConstraintOptions, ShapeKind,
    ShapeOptions,
};
