//! # TANDEM
//!
//! Keeps a physics simulation running on its own thread in step with a
//! scene graph owned by the control thread.
//!
//! ```text
//!   CONTROL THREAD                              SIMULATION THREAD
//!   ┌──────────────────────┐   ControlMessage   ┌──────────────────────┐
//!   │ PhysicsWorld         │ ─────────────────► │ SimulationWorker     │
//!   │  ├─ handles/entries  │                    │  ├─ SimulationEngine │
//!   │  ├─ SlotRegistry     │ ◄───────────────── │  └─ SlotAllocator    │
//!   │  └─ SyncLoop         │ SimulationMessage  │                      │
//!   └──────────┬───────────┘                    └──────────┬───────────┘
//!              └────────── TransferBuffer (baton) ─────────┘
//! ```
//!
//! ## Architecture Rules
//!
//! 1. **One buffer, one owner** - the transfer buffer moves, it is never shared
//! 2. **Handles are ours, slots are theirs** - the registry maps between them
//! 3. **Never block the control thread** - an absent buffer means "skip this tick"
//! 4. **Violations are logged** - a misbehaving peer never takes the session down
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem::{BallisticEngine, BodyOptions, PhysicsWorld, SceneNode, Vec3, WorldConfig};
//!
//! let (mut world, worker) = PhysicsWorld::launch(WorldConfig::default(), BallisticEngine::new())?;
//! let ball = SceneNode::new().with_position(Vec3::new(0.0, 10.0, 0.0)).shared();
//! let handle = world.add_body(ball.clone(), BodyOptions::dynamic(1.0))?;
//!
//! loop {
//!     world.tick()?;
//!     // render ball.read().position()
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod scene;
pub mod simulation;
pub mod sync_loop;
pub mod world;

pub use channel::{ChannelState, SimulationChannel, SimulationEndpoint};
pub use config::WorldConfig;
pub use error::{
    ChannelError, ChannelResult, ConfigError, ConfigResult, LifecycleError, LifecycleResult,
    TandemError, TandemResult,
};
pub use protocol::{ControlMessage, SimulationMessage};
pub use scene::{SceneNode, SceneObject, SceneRef};
pub use simulation::{BallisticEngine, BodyState, SimulationEngine, SimulationWorker, WorkerStats};
pub use sync_loop::{CollisionEvent, SyncLoop, SyncStats};
pub use world::{BodyEntry, ConstraintEntry, PhysicsWorld, ShapeEntry};

pub use tandem_core::{
    BodyHandle, Capabilities, ConstraintHandle, DebugBuffer, DebugView, ShapeHandle, Slot,
    TransferBuffer,
};
pub use tandem_shared::{
    ActivationState, BodyKind, BodyOptions, ConstraintKind, ConstraintOptions, DebugDrawMode,
    Mat4, Quaternion, ShapeKind, ShapeOptions, Vec3,
};
