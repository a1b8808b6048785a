//! Control-side records for bodies, shapes and constraints.

use std::fmt;

use tandem_core::{BodyHandle, ConstraintHandle, ShapeHandle};
use tandem_shared::{BodyOptions, ConstraintOptions, Mat4, ShapeOptions};

use crate::scene::SceneRef;

/// A body known to the control context, pending or live.
pub struct BodyEntry {
    /// Scene object driven by or driving this body.
    pub(crate) object: SceneRef,
    /// Current options.
    pub(crate) options: BodyOptions,
    /// Linear velocity magnitude from the last tick that tracked it.
    pub(crate) linear_velocity: f32,
    /// Angular velocity magnitude from the last tick that tracked it.
    pub(crate) angular_velocity: f32,
    /// Partners reported on the last tick, in buffer order.
    pub(crate) collisions: Vec<BodyHandle>,
    /// Acknowledged shape sets, in attach order.
    pub(crate) shapes: Vec<ShapeEntry>,
    /// World transform this context last wrote into the body's slot.
    pub(crate) last_written: Option<Mat4>,
}

impl BodyEntry {
    pub(crate) fn new(object: SceneRef, options: BodyOptions) -> Self {
        Self {
            object,
            options,
            linear_velocity: 0.0,
            angular_velocity: 0.0,
            collisions: Vec::new(),
            shapes: Vec::new(),
            last_written: None,
        }
    }

    /// Scene object of the body.
    #[must_use]
    pub fn object(&self) -> &SceneRef {
        &self.object
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &BodyOptions {
        &self.options
    }
}

impl fmt::Debug for BodyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyEntry")
            .field("options", &self.options)
            .field("linear_velocity", &self.linear_velocity)
            .field("angular_velocity", &self.angular_velocity)
            .field("collisions", &self.collisions)
            .field("shapes", &self.shapes)
            .finish_non_exhaustive()
    }
}

/// A shape set attached to a body.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeEntry {
    /// Shape set handle.
    pub handle: ShapeHandle,
    /// Owning body.
    pub body: BodyHandle,
    /// Parent-relative geometry.
    pub options: ShapeOptions,
}

/// A constraint between two bodies.
///
/// Outlives its bodies: removing a body leaves its constraints in place.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintEntry {
    /// Constraint handle.
    pub handle: ConstraintHandle,
    /// First body.
    pub source: BodyHandle,
    /// Second body.
    pub target: BodyHandle,
    /// Parameters.
    pub options: ConstraintOptions,
}
