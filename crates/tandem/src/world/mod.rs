//! # Physics World
//!
//! Control-side owner of the whole session: handles, entries, the slot
//! registry, the channel and the sync loop. No globals.
//!
//! ## Body lifecycle
//!
//! ```text
//!   add_body ──► pending ──BODY_READY──► live ──remove_body──► gone
//!                   │                                 ▲
//!                   └──remove_body──► tombstone ──────┘
//!                                  (late BODY_READY dropped)
//! ```
//!
//! A pending body has a handle and an entry but no slot; nothing reads the
//! buffer for it until BODY_READY binds one.

mod entries;

pub use entries::{BodyEntry, ConstraintEntry, ShapeEntry};

use std::collections::{BTreeMap, HashMap, HashSet};

use tandem_core::{
    BodyHandle, Capabilities, ConstraintHandle, DebugChannel, DebugToggle, DebugView,
    HandleAllocator, ShapeHandle, Slot, SlotRegistry, TransferBuffer,
};
use tandem_shared::{BodyOptions, ConstraintOptions, ShapeOptions};

use crate::channel::{ChannelState, SimulationChannel, SimulationEndpoint};
use crate::config::WorldConfig;
use crate::error::{LifecycleError, LifecycleResult, TandemError, TandemResult};
use crate::protocol::{ControlMessage, SimulationMessage};
use crate::scene::SceneRef;
use crate::simulation::{SimulationEngine, SimulationWorker};
use crate::sync_loop::{CollisionEvent, SyncLoop, SyncStats, SyncTargets};

/// The control context's view of a simulation session.
#[derive(Debug)]
pub struct PhysicsWorld {
    config: WorldConfig,
    channel: SimulationChannel,
    sync: SyncLoop,
    registry: SlotRegistry,
    debug: DebugChannel,

    bodies: BTreeMap<BodyHandle, BodyEntry>,
    /// Bodies removed before their BODY_READY arrived.
    tombstones: HashSet<BodyHandle>,
    /// Shape sets sent but not yet acknowledged.
    pending_shapes: HashMap<ShapeHandle, ShapeEntry>,
    constraints: BTreeMap<ConstraintHandle, ConstraintEntry>,

    body_ids: HandleAllocator<BodyHandle>,
    shape_ids: HandleAllocator<ShapeHandle>,
    constraint_ids: HandleAllocator<ConstraintHandle>,

    collision_events: Vec<CollisionEvent>,
}

impl PhysicsWorld {
    /// Starts a session over `channel`: validates the config, allocates the
    /// transfer buffer and sends INIT.
    ///
    /// # Errors
    ///
    /// - [`TandemError::Config`] if the configuration is invalid
    /// - [`TandemError::Channel`] if the simulation side is gone
    pub fn new(config: WorldConfig, channel: SimulationChannel) -> TandemResult<Self> {
        Self::with_capabilities(config, channel, Capabilities::detect())
    }

    /// Like [`PhysicsWorld::new`] with explicit platform capabilities.
    ///
    /// # Errors
    ///
    /// As [`PhysicsWorld::new`].
    pub fn with_capabilities(
        config: WorldConfig,
        mut channel: SimulationChannel,
        capabilities: Capabilities,
    ) -> TandemResult<Self> {
        config.validate()?;

        let capacity = config.max_bodies;
        channel.start(config.clone(), TransferBuffer::new(capacity))?;

        let mut world = Self {
            debug: DebugChannel::new(capabilities, config.debug_vertex_capacity),
            sync: SyncLoop::new(capacity),
            registry: SlotRegistry::new(capacity),
            channel,
            config,
            bodies: BTreeMap::new(),
            tombstones: HashSet::new(),
            pending_shapes: HashMap::new(),
            constraints: BTreeMap::new(),
            body_ids: HandleAllocator::new(),
            shape_ids: HandleAllocator::new(),
            constraint_ids: HandleAllocator::new(),
            collision_events: Vec::new(),
        };

        if !world.config.debug_draw_mode.is_empty() {
            world.set_debug(true)?;
        }

        tracing::info!("physics world started, {} slots", capacity);
        Ok(world)
    }

    /// Starts a session with `engine` running on its own thread.
    ///
    /// # Errors
    ///
    /// As [`PhysicsWorld::new`], plus [`TandemError::Spawn`] if the thread
    /// cannot be created.
    pub fn launch<E>(config: WorldConfig, engine: E) -> TandemResult<(Self, SimulationWorker)>
    where
        E: SimulationEngine + Send + 'static,
    {
        let (channel, endpoint): (SimulationChannel, SimulationEndpoint) =
            SimulationChannel::pair();
        let worker = SimulationWorker::spawn(endpoint, engine).map_err(TandemError::Spawn)?;
        let world = Self::new(config, channel)?;
        Ok((world, worker))
    }

    // =========================================================================
    // Per-tick driving
    // =========================================================================

    /// Processes every message that has arrived from the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Disconnected`](crate::ChannelError::Disconnected)
    /// if the simulation side is gone.
    pub fn pump(&mut self) -> LifecycleResult<()> {
        for message in self.channel.drain()? {
            self.handle(message);
        }
        Ok(())
    }

    /// Pumps messages and runs one sync tick.
    ///
    /// Returns the tick's statistics, or `None` when the buffer was not
    /// here to sync.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Disconnected`](crate::ChannelError::Disconnected)
    /// if the simulation side is gone.
    pub fn tick(&mut self) -> LifecycleResult<Option<SyncStats>> {
        self.pump()?;
        let stats = self.sync.tick(SyncTargets {
            registry: &self.registry,
            bodies: &mut self.bodies,
            channel: &mut self.channel,
            debug: &mut self.debug,
            events: &mut self.collision_events,
        })?;
        Ok(stats)
    }

    fn handle(&mut self, message: SimulationMessage) {
        tracing::debug!("received {}", message.kind());
        match message {
            SimulationMessage::Ready => {}
            SimulationMessage::BodyReady { handle, slot } => self.on_body_ready(handle, slot),
            SimulationMessage::ShapesReady { body, shape } => self.on_shapes_ready(body, shape),
            SimulationMessage::TransferData {
                buffer,
                step_duration,
            } => {
                self.sync.receive(buffer, step_duration);
            }
        }
    }

    fn on_body_ready(&mut self, handle: BodyHandle, slot: Slot) {
        if self.tombstones.remove(&handle) {
            tracing::debug!("late BODY_READY for removed {}, ignored", handle);
            return;
        }
        if !self.bodies.contains_key(&handle) {
            tracing::warn!("protocol violation: BODY_READY for unknown {}, ignored", handle);
            return;
        }
        if let Err(err) = self.registry.bind(handle, slot) {
            tracing::warn!("protocol violation: {}, BODY_READY ignored", err);
        }
    }

    fn on_shapes_ready(&mut self, body: BodyHandle, shape: ShapeHandle) {
        let Some(entry) = self.pending_shapes.remove(&shape) else {
            tracing::warn!("protocol violation: SHAPES_READY for unknown {}, ignored", shape);
            return;
        };
        if entry.body != body {
            tracing::warn!(
                "protocol violation: SHAPES_READY names {} but {} belongs to {}, ignored",
                body,
                shape,
                entry.body
            );
            self.pending_shapes.insert(shape, entry);
            return;
        }
        match self.bodies.get_mut(&body) {
            Some(owner) => owner.shapes.push(entry),
            None => tracing::warn!("protocol violation: SHAPES_READY for unknown {}, ignored", body),
        }
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// Registers a body for `object`. The body stays pending until the
    /// simulation assigns it a slot.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::CapacityExceeded`] if `max_bodies` bodies exist
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn add_body(&mut self, object: SceneRef, options: BodyOptions) -> LifecycleResult<BodyHandle> {
        let capacity = self.config.max_bodies;
        if self.bodies.len() >= capacity {
            return Err(LifecycleError::CapacityExceeded { capacity });
        }

        let transform = {
            let mut object = object.write();
            object.update_world_transform();
            object.world_transform()
        };

        let handle = self.body_ids.allocate();
        let mut entry = BodyEntry::new(object, options.clone());
        // The engine echoes this pose until it moves the body
        entry.last_written = Some(transform);
        self.bodies.insert(handle, entry);
        self.channel.send(ControlMessage::AddBody {
            handle,
            options,
            transform,
        })?;
        tracing::debug!("added {}", handle);
        Ok(handle)
    }

    /// Replaces a body's options.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownBody`] if the body does not exist
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn update_body(&mut self, handle: BodyHandle, options: BodyOptions) -> LifecycleResult<()> {
        let entry = self
            .bodies
            .get_mut(&handle)
            .ok_or(LifecycleError::UnknownBody(handle))?;
        entry.options = options.clone();
        self.channel
            .send(ControlMessage::UpdateBody { handle, options })?;
        Ok(())
    }

    /// Removes a body. Returns false if it was already gone.
    ///
    /// Constraints referencing the body are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Channel`] if the simulation side is gone.
    pub fn remove_body(&mut self, handle: BodyHandle) -> LifecycleResult<bool> {
        if self.bodies.remove(&handle).is_none() {
            return Ok(false);
        }

        if self.registry.unbind(handle).is_none() {
            self.tombstones.insert(handle);
        }
        self.pending_shapes.retain(|_, shape| shape.body != handle);

        self.channel.send(ControlMessage::RemoveBody { handle })?;
        tracing::debug!("removed {}", handle);
        Ok(true)
    }

    /// Zeroes a body's velocities and forces.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownBody`] if the body does not exist
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn reset_dynamic_body(&mut self, handle: BodyHandle) -> LifecycleResult<()> {
        self.require_body(handle)?;
        self.channel
            .send(ControlMessage::ResetDynamicBody { handle })?;
        Ok(())
    }

    /// Wakes a sleeping body.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownBody`] if the body does not exist
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn activate_body(&mut self, handle: BodyHandle) -> LifecycleResult<()> {
        self.require_body(handle)?;
        self.channel.send(ControlMessage::ActivateBody { handle })?;
        Ok(())
    }

    // =========================================================================
    // Shapes
    // =========================================================================

    /// Attaches a shape set to a body. It joins the body's shape list when
    /// SHAPES_READY arrives.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownBody`] if the body does not exist
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn add_shapes(&mut self, body: BodyHandle, options: ShapeOptions) -> LifecycleResult<ShapeHandle> {
        self.require_body(body)?;

        let shape = self.shape_ids.allocate();
        self.pending_shapes.insert(
            shape,
            ShapeEntry {
                handle: shape,
                body,
                options: options.clone(),
            },
        );
        self.channel.send(ControlMessage::AddShapes {
            body,
            shape,
            options,
        })?;
        Ok(shape)
    }

    /// Detaches a shape set, acknowledged or still pending.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownBody`] if the body does not exist
    /// - [`LifecycleError::UnknownShape`] if the body has no such shape
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn remove_shapes(&mut self, body: BodyHandle, shape: ShapeHandle) -> LifecycleResult<()> {
        let entry = self
            .bodies
            .get_mut(&body)
            .ok_or(LifecycleError::UnknownBody(body))?;

        if let Some(index) = entry.shapes.iter().position(|s| s.handle == shape) {
            entry.shapes.remove(index);
        } else if self
            .pending_shapes
            .get(&shape)
            .is_some_and(|pending| pending.body == body)
        {
            self.pending_shapes.remove(&shape);
        } else {
            return Err(LifecycleError::UnknownShape { body, shape });
        }

        self.channel
            .send(ControlMessage::RemoveShapes { body, shape })?;
        Ok(())
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    /// Creates a constraint between two bodies.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownBody`] if either body does not exist
    /// - [`LifecycleError::Channel`] if the simulation side is gone
    pub fn add_constraint(
        &mut self,
        source: BodyHandle,
        target: BodyHandle,
        options: ConstraintOptions,
    ) -> LifecycleResult<ConstraintHandle> {
        self.require_body(source)?;
        self.require_body(target)?;

        let handle = self.constraint_ids.allocate();
        self.constraints.insert(
            handle,
            ConstraintEntry {
                handle,
                source,
                target,
                options: options.clone(),
            },
        );
        self.channel.send(ControlMessage::AddConstraint {
            handle,
            source,
            target,
            options,
        })?;
        Ok(handle)
    }

    /// Removes a constraint. Returns false if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Channel`] if the simulation side is gone.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> LifecycleResult<bool> {
        if self.constraints.remove(&handle).is_none() {
            return Ok(false);
        }
        self.channel
            .send(ControlMessage::RemoveConstraint { handle })?;
        Ok(true)
    }

    // =========================================================================
    // Debug geometry
    // =========================================================================

    /// Turns debug geometry on or off. Returns whether it is now on.
    ///
    /// Without shared memory support, enabling degrades to disabled with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Channel`] if the simulation side is gone.
    pub fn set_debug(&mut self, enabled: bool) -> LifecycleResult<bool> {
        if !enabled {
            self.debug.disable();
            self.channel.send(ControlMessage::SetDebug {
                enabled: false,
                buffer: None,
            })?;
            return Ok(false);
        }

        match self.debug.enable() {
            DebugToggle::Enabled(buffer) => {
                self.channel.send(ControlMessage::SetDebug {
                    enabled: true,
                    buffer: Some(buffer),
                })?;
                Ok(true)
            }
            DebugToggle::Unsupported => {
                tracing::warn!("debug drawing needs shared memory, leaving it disabled");
                Ok(false)
            }
        }
    }

    /// Debug geometry for a renderer, while enabled.
    #[must_use]
    pub fn debug_view(&self) -> Option<DebugView<'_>> {
        self.debug.view()
    }

    /// Marks debug geometry as uploaded.
    pub fn mark_debug_uploaded(&mut self) {
        self.debug.mark_uploaded();
    }

    /// Returns true while debug geometry is flowing.
    #[must_use]
    pub fn is_debug_enabled(&self) -> bool {
        self.debug.is_enabled()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Handshake state of the channel.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Statistics of the last completed tick.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.sync.stats()
    }

    /// Returns true while this context holds the transfer buffer.
    #[must_use]
    pub fn owns_buffer(&self) -> bool {
        self.sync.is_owned()
    }

    /// Number of bodies, pending and live.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Body entry, pending or live.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&BodyEntry> {
        self.bodies.get(&handle)
    }

    /// Returns true once the simulation has assigned the body a slot.
    #[must_use]
    pub fn is_body_ready(&self, handle: BodyHandle) -> bool {
        self.registry.is_bound(handle)
    }

    /// Returns true for a body that exists but has no slot yet.
    #[must_use]
    pub fn is_body_pending(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle) && !self.registry.is_bound(handle)
    }

    /// Slot assigned to the body.
    #[must_use]
    pub fn body_slot(&self, handle: BodyHandle) -> Option<Slot> {
        self.registry.resolve_slot(handle)
    }

    /// Partners reported on the last tick.
    #[must_use]
    pub fn collisions(&self, handle: BodyHandle) -> Option<&[BodyHandle]> {
        self.bodies.get(&handle).map(|e| e.collisions.as_slice())
    }

    /// Linear and angular velocity magnitudes from the last tick that
    /// tracked them.
    #[must_use]
    pub fn velocities(&self, handle: BodyHandle) -> Option<(f32, f32)> {
        self.bodies
            .get(&handle)
            .map(|e| (e.linear_velocity, e.angular_velocity))
    }

    /// Acknowledged shape sets of a body, in attach order.
    #[must_use]
    pub fn shapes(&self, body: BodyHandle) -> Option<&[ShapeEntry]> {
        self.bodies.get(&body).map(|e| e.shapes.as_slice())
    }

    /// A constraint.
    #[must_use]
    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&ConstraintEntry> {
        self.constraints.get(&handle)
    }

    /// Takes the collision events queued since the last call.
    pub fn drain_collision_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.collision_events)
    }

    fn require_body(&self, handle: BodyHandle) -> LifecycleResult<()> {
        if self.bodies.contains_key(&handle) {
            Ok(())
        } else {
            Err(LifecycleError::UnknownBody(handle))
        }
    }
}
