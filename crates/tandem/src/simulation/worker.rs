//! # Simulation Worker
//!
//! Runs an engine on its own thread and speaks the simulation side of the
//! protocol.
//!
//! ```text
//! recv loop:
//!   INIT          → engine.init, READY, first round trip
//!   TRANSFER_DATA → round trip
//!   commands      → engine calls, SHAPES_READY
//!
//! round trip:
//!   kinematic poses in → fixed steps → poses, speeds, contacts out
//!   → debug geometry → BODY_READY for new bodies → TRANSFER_DATA
//! ```
//!
//! BODY_READY is held back until the body's record has been written, so
//! the control side never binds a slot whose record is stale.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tandem_core::{BodyHandle, BufferBaton, DebugBuffer, Slot, SlotAllocator};
use tandem_shared::{BodyKind, DebugDrawMode};

use super::SimulationEngine;
use crate::channel::SimulationEndpoint;
use crate::config::WorldConfig;
use crate::error::ChannelResult;
use crate::protocol::{ControlMessage, SimulationMessage};

/// Counters reported when the worker stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Buffers handed back.
    pub round_trips: u64,
    /// Fixed steps taken.
    pub steps: u64,
    /// Commands processed.
    pub commands: u64,
    /// Bodies alive at shutdown.
    pub bodies: usize,
}

/// Handle to the simulation thread.
///
/// The thread stops once the control side drops its channel.
#[derive(Debug)]
pub struct SimulationWorker {
    thread: JoinHandle<WorkerStats>,
}

impl SimulationWorker {
    /// Starts `engine` on a new thread serving `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be created.
    pub fn spawn<E>(endpoint: SimulationEndpoint, engine: E) -> io::Result<Self>
    where
        E: SimulationEngine + Send + 'static,
    {
        let thread = thread::Builder::new()
            .name("tandem-simulation".into())
            .spawn(move || Worker::new(endpoint, engine).run())?;
        Ok(Self { thread })
    }

    /// Returns true once the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the thread to exit. `None` if it panicked.
    pub fn join(self) -> Option<WorkerStats> {
        self.thread.join().ok()
    }
}

struct WorkerBody {
    slot: Slot,
    kind: BodyKind,
    /// The control side knows the slot and writes its pose.
    announced: bool,
}

struct Worker<E> {
    engine: E,
    endpoint: SimulationEndpoint,
    config: WorldConfig,
    slots: Option<SlotAllocator>,
    baton: BufferBaton,
    bodies: BTreeMap<BodyHandle, WorkerBody>,
    /// Created bodies waiting for their BODY_READY.
    unannounced: Vec<(BodyHandle, Slot)>,
    /// Slots freed since the last round trip.
    released: Vec<Slot>,
    debug: Option<Arc<DebugBuffer>>,
    last_round_trip: Option<Instant>,
    accumulator: Duration,
    contacts: Vec<BodyHandle>,
    partner_slots: Vec<Slot>,
    stats: WorkerStats,
}

impl<E: SimulationEngine> Worker<E> {
    fn new(endpoint: SimulationEndpoint, engine: E) -> Self {
        Self {
            engine,
            endpoint,
            config: WorldConfig::default(),
            slots: None,
            baton: BufferBaton::empty(0),
            bodies: BTreeMap::new(),
            unannounced: Vec::new(),
            released: Vec::new(),
            debug: None,
            last_round_trip: None,
            accumulator: Duration::ZERO,
            contacts: Vec::new(),
            partner_slots: Vec::new(),
            stats: WorkerStats::default(),
        }
    }

    fn run(mut self) -> WorkerStats {
        while let Some(message) = self.endpoint.recv() {
            self.stats.commands += 1;
            if self.handle(message).is_err() {
                break;
            }
        }
        self.stats.bodies = self.bodies.len();
        tracing::debug!(
            "simulation worker stopped after {} round trips",
            self.stats.round_trips
        );
        self.stats
    }

    fn handle(&mut self, message: ControlMessage) -> ChannelResult<()> {
        match message {
            ControlMessage::Init { config, buffer } => {
                if self.slots.is_some() {
                    tracing::warn!("protocol violation: second INIT ignored");
                    return Ok(());
                }
                self.engine.init(&config);
                self.slots = Some(SlotAllocator::new(buffer.capacity()));
                self.baton = BufferBaton::new(buffer);
                self.config = config;
                self.endpoint.send(SimulationMessage::Ready)?;
                tracing::info!("simulation initialized");
                self.round_trip()
            }

            ControlMessage::TransferData { buffer } => {
                match self.baton.swap_in(buffer, Duration::ZERO) {
                    Ok(()) => self.round_trip(),
                    Err((err, _dropped)) => {
                        tracing::warn!("protocol violation: {}, TRANSFER_DATA dropped", err);
                        Ok(())
                    }
                }
            }

            ControlMessage::SetDebug { enabled, buffer } => {
                self.debug = if enabled { buffer } else { None };
                Ok(())
            }

            ControlMessage::AddBody {
                handle,
                options,
                transform,
            } => {
                let Some(slots) = self.slots.as_mut() else {
                    tracing::warn!("protocol violation: ADD_BODY before INIT, ignored");
                    return Ok(());
                };
                if self.bodies.contains_key(&handle) {
                    tracing::warn!("protocol violation: {} added twice, ignored", handle);
                    return Ok(());
                }
                let Some(slot) = slots.allocate() else {
                    tracing::warn!("slot capacity exhausted, {} not created", handle);
                    return Ok(());
                };

                self.engine.add_body(handle, &options, transform);
                self.bodies.insert(
                    handle,
                    WorkerBody {
                        slot,
                        kind: options.kind,
                        announced: false,
                    },
                );
                self.unannounced.push((handle, slot));
                Ok(())
            }

            ControlMessage::UpdateBody { handle, options } => {
                if let Some(body) = self.bodies.get_mut(&handle) {
                    body.kind = options.kind;
                    self.engine.update_body(handle, &options);
                }
                Ok(())
            }

            ControlMessage::RemoveBody { handle } => {
                if let Some(body) = self.bodies.remove(&handle) {
                    self.engine.remove_body(handle);
                    if let Some(slots) = self.slots.as_mut() {
                        slots.release(body.slot);
                    }
                    self.released.push(body.slot);
                }
                Ok(())
            }

            ControlMessage::ResetDynamicBody { handle } => {
                self.engine.reset_body(handle);
                Ok(())
            }

            ControlMessage::ActivateBody { handle } => {
                self.engine.activate_body(handle);
                Ok(())
            }

            ControlMessage::AddShapes {
                body,
                shape,
                options,
            } => {
                if !self.bodies.contains_key(&body) {
                    tracing::warn!("ADD_SHAPES for unknown {}, ignored", body);
                    return Ok(());
                }
                self.engine.add_shapes(body, shape, &options);
                self.endpoint
                    .send(SimulationMessage::ShapesReady { body, shape })
            }

            ControlMessage::RemoveShapes { body, shape } => {
                self.engine.remove_shapes(body, shape);
                Ok(())
            }

            ControlMessage::AddConstraint {
                handle,
                source,
                target,
                options,
            } => {
                self.engine.add_constraint(handle, source, target, &options);
                Ok(())
            }

            ControlMessage::RemoveConstraint { handle } => {
                self.engine.remove_constraint(handle);
                Ok(())
            }
        }
    }

    fn round_trip(&mut self) -> ChannelResult<()> {
        let Ok(buffer) = self.baton.get_mut() else {
            return Ok(());
        };

        for slot in self.released.drain(..) {
            let reused = self.slots.as_ref().is_some_and(|s| s.is_allocated(slot));
            if !reused {
                buffer.clear_slot(slot);
            }
        }

        // Scene-driven poses as the control side last wrote them
        for (&handle, body) in &self.bodies {
            if body.announced && body.kind.is_externally_driven() {
                self.engine
                    .set_kinematic_transform(handle, buffer.transform(body.slot));
            }
        }

        let now = Instant::now();
        if let Some(previous) = self.last_round_trip.replace(now) {
            self.accumulator += now - previous;
        }
        let fixed = self.config.fixed_step();
        let dt = self.config.fixed_time_step;
        let mut steps = 0;
        while self.accumulator >= fixed && steps < self.config.max_sub_steps {
            self.engine.step(dt);
            self.accumulator -= fixed;
            steps += 1;
        }
        if self.accumulator >= fixed {
            // Falling behind: drop the backlog instead of spiralling
            self.accumulator = Duration::ZERO;
        }
        let step_duration = now.elapsed();
        self.stats.steps += u64::from(steps);

        for (&handle, body) in &self.bodies {
            if let Some(state) = self.engine.body_state(handle) {
                buffer.set_transform(body.slot, state.transform);
                buffer.set_velocities(body.slot, state.linear_speed, state.angular_speed);
            }

            self.contacts.clear();
            self.engine.contacts(handle, &mut self.contacts);
            self.partner_slots.clear();
            self.partner_slots.extend(
                self.contacts
                    .iter()
                    .filter_map(|other| self.bodies.get(other).map(|b| b.slot)),
            );
            buffer.set_collisions(body.slot, &self.partner_slots);
        }

        if let Some(debug) = &self.debug {
            let mode = if self.config.debug_draw_mode.is_empty() {
                DebugDrawMode::DRAW_WIREFRAME
            } else {
                self.config.debug_draw_mode
            };
            self.engine.draw_debug(mode, debug);
        }

        for (handle, slot) in self.unannounced.drain(..) {
            if let Some(body) = self.bodies.get_mut(&handle) {
                body.announced = true;
            }
            // Sent for removed bodies too, so the control side can clear
            // its tombstone
            self.endpoint
                .send(SimulationMessage::BodyReady { handle, slot })?;
        }

        let Ok(buffer) = self.baton.hand_off() else {
            return Ok(());
        };
        self.stats.round_trips += 1;
        self.endpoint.send(SimulationMessage::TransferData {
            buffer,
            step_duration,
        })
    }
}
