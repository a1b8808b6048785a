//! Solver boundary.

use tandem_core::{BodyHandle, ConstraintHandle, DebugBuffer, ShapeHandle};
use tandem_shared::{BodyOptions, ConstraintOptions, DebugDrawMode, Mat4, ShapeOptions};

use crate::config::WorldConfig;

/// Pose and speed of a body after a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    /// World transform.
    pub transform: Mat4,
    /// Linear velocity magnitude.
    pub linear_speed: f32,
    /// Angular velocity magnitude.
    pub angular_speed: f32,
}

/// A physics solver driven by the simulation worker.
///
/// Every entity is keyed by the handle the control context issued. Calls for
/// unknown handles must be ignored.
pub trait SimulationEngine {
    /// Configures the world. Called once, before anything else.
    fn init(&mut self, config: &WorldConfig);

    /// Creates a body at `transform`. Until the body moves, `body_state`
    /// reports `transform` unchanged.
    fn add_body(&mut self, handle: BodyHandle, options: &BodyOptions, transform: Mat4);

    /// Replaces a body's options.
    fn update_body(&mut self, handle: BodyHandle, options: &BodyOptions);

    /// Destroys a body.
    fn remove_body(&mut self, handle: BodyHandle);

    /// Attaches a shape set to a body.
    fn add_shapes(&mut self, body: BodyHandle, shape: ShapeHandle, options: &ShapeOptions);

    /// Detaches a shape set.
    fn remove_shapes(&mut self, body: BodyHandle, shape: ShapeHandle);

    /// Creates a constraint.
    fn add_constraint(
        &mut self,
        handle: ConstraintHandle,
        source: BodyHandle,
        target: BodyHandle,
        options: &ConstraintOptions,
    );

    /// Destroys a constraint.
    fn remove_constraint(&mut self, handle: ConstraintHandle);

    /// Moves a kinematic or static body to the pose the scene reported.
    ///
    /// `body_state` must report this exact transform back until the next
    /// call. The control side recognises its own poses bit for bit, and a
    /// rounded echo would overwrite scene-side moves made in between.
    fn set_kinematic_transform(&mut self, handle: BodyHandle, transform: Mat4);

    /// Advances the world by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Current state of a body.
    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Appends the bodies currently touching `handle` to `out`.
    fn contacts(&self, handle: BodyHandle, out: &mut Vec<BodyHandle>);

    /// Zeroes velocities and accumulated forces.
    fn reset_body(&mut self, handle: BodyHandle);

    /// Wakes a sleeping body.
    fn activate_body(&mut self, handle: BodyHandle);

    /// Emits debug geometry for `mode` into `out`.
    fn draw_debug(&self, mode: DebugDrawMode, out: &DebugBuffer) {
        let _ = (mode, out);
    }
}
