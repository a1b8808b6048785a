//! # Wire Protocol
//!
//! Messages exchanged between the control and simulation contexts.
//!
//! ```text
//! control                                   simulation
//!    │ ── INIT (config + buffer) ───────────────► │
//!    │ ◄─────────────────────────────── READY ──  │
//!    │ ── ADD_BODY / ADD_SHAPES / ... ──────────► │
//!    │ ◄──────────── BODY_READY / SHAPES_READY ── │
//!    │ ◄───────── TRANSFER_DATA (buffer + dt) ──  │
//!    │ ── TRANSFER_DATA (buffer) ───────────────► │   once per tick
//! ```
//!
//! Buffers travel by move. A sent buffer is unreachable from the sender.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tandem_core::{BodyHandle, ConstraintHandle, DebugBuffer, ShapeHandle, Slot, TransferBuffer};
use tandem_shared::{BodyOptions, ConstraintOptions, Mat4, ShapeOptions};

use crate::config::WorldConfig;

/// Control → simulation.
#[derive(Debug)]
pub enum ControlMessage {
    // =========================================================================
    // Session
    // =========================================================================
    /// Starts the simulation and hands over the transfer buffer.
    Init {
        /// World configuration.
        config: WorldConfig,
        /// The transfer buffer, by move.
        buffer: TransferBuffer,
    },

    /// Returns the transfer buffer after a tick.
    TransferData {
        /// The transfer buffer, by move.
        buffer: TransferBuffer,
    },

    /// Toggles debug geometry emission.
    SetDebug {
        /// Whether to emit debug geometry.
        enabled: bool,
        /// Shared debug buffer, present when enabling.
        buffer: Option<Arc<DebugBuffer>>,
    },

    // =========================================================================
    // Bodies
    // =========================================================================
    /// Creates a body. Answered by BODY_READY.
    AddBody {
        /// New body.
        handle: BodyHandle,
        /// Creation options.
        options: BodyOptions,
        /// Initial world transform.
        transform: Mat4,
    },

    /// Replaces a body's options.
    UpdateBody {
        /// Target body.
        handle: BodyHandle,
        /// New options.
        options: BodyOptions,
    },

    /// Destroys a body and frees its slot.
    RemoveBody {
        /// Target body.
        handle: BodyHandle,
    },

    /// Zeroes a body's velocities and accumulated forces.
    ResetDynamicBody {
        /// Target body.
        handle: BodyHandle,
    },

    /// Wakes a sleeping body.
    ActivateBody {
        /// Target body.
        handle: BodyHandle,
    },

    // =========================================================================
    // Shapes
    // =========================================================================
    /// Attaches a shape set to a body. Answered by SHAPES_READY.
    AddShapes {
        /// Owning body.
        body: BodyHandle,
        /// New shape set.
        shape: ShapeHandle,
        /// Geometry.
        options: ShapeOptions,
    },

    /// Detaches a shape set.
    RemoveShapes {
        /// Owning body.
        body: BodyHandle,
        /// Shape set to remove.
        shape: ShapeHandle,
    },

    // =========================================================================
    // Constraints
    // =========================================================================
    /// Creates a constraint between two bodies.
    AddConstraint {
        /// New constraint.
        handle: ConstraintHandle,
        /// First body.
        source: BodyHandle,
        /// Second body.
        target: BodyHandle,
        /// Constraint parameters.
        options: ConstraintOptions,
    },

    /// Destroys a constraint.
    RemoveConstraint {
        /// Target constraint.
        handle: ConstraintHandle,
    },
}

impl ControlMessage {
    /// Protocol name of the message kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "INIT",
            Self::TransferData { .. } => "TRANSFER_DATA",
            Self::SetDebug { .. } => "SET_DEBUG",
            Self::AddBody { .. } => "ADD_BODY",
            Self::UpdateBody { .. } => "UPDATE_BODY",
            Self::RemoveBody { .. } => "REMOVE_BODY",
            Self::ResetDynamicBody { .. } => "RESET_DYNAMIC_BODY",
            Self::ActivateBody { .. } => "ACTIVATE_BODY",
            Self::AddShapes { .. } => "ADD_SHAPES",
            Self::RemoveShapes { .. } => "REMOVE_SHAPES",
            Self::AddConstraint { .. } => "ADD_CONSTRAINT",
            Self::RemoveConstraint { .. } => "REMOVE_CONSTRAINT",
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Simulation → control.
#[derive(Debug)]
pub enum SimulationMessage {
    /// The simulation is operational.
    Ready,

    /// A body was created and assigned a slot.
    BodyReady {
        /// Created body.
        handle: BodyHandle,
        /// Assigned slot.
        slot: Slot,
    },

    /// A shape set was attached.
    ShapesReady {
        /// Owning body.
        body: BodyHandle,
        /// Attached shape set.
        shape: ShapeHandle,
    },

    /// Hands the transfer buffer to the control context after a step.
    TransferData {
        /// The transfer buffer, by move.
        buffer: TransferBuffer,
        /// Time spent stepping the engine.
        step_duration: Duration,
    },
}

impl SimulationMessage {
    /// Protocol name of the message kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::BodyReady { .. } => "BODY_READY",
            Self::ShapesReady { .. } => "SHAPES_READY",
            Self::TransferData { .. } => "TRANSFER_DATA",
        }
    }
}

impl fmt::Display for SimulationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
