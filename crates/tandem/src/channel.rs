//! # Simulation Channel
//!
//! Control-side end of the protocol, with the handshake state machine.
//!
//! ```text
//!  ┌───────────────┐  start()   ┌──────────────┐  READY   ┌───────┐
//!  │ Uninitialized │ ─────────► │ Initializing │ ───────► │ Ready │
//!  └───────────────┘  (INIT)    └──────────────┘  flush   └───────┘
//! ```
//!
//! Every command other than INIT is queued until READY and then flushed in
//! enqueue order, so a REMOVE can never overtake the ADD it refers to.

use std::collections::VecDeque;
use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::config::WorldConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::protocol::{ControlMessage, SimulationMessage};
use tandem_core::TransferBuffer;

/// Handshake state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// INIT not sent yet.
    #[default]
    Uninitialized,
    /// INIT sent, waiting for READY.
    Initializing,
    /// Operational.
    Ready,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        })
    }
}

/// Simulation-side end of the channel pair.
pub struct SimulationEndpoint {
    receiver: Receiver<ControlMessage>,
    sender: Sender<SimulationMessage>,
}

impl SimulationEndpoint {
    /// Blocks until the next command, or `None` once the control side is gone.
    pub fn recv(&self) -> Option<ControlMessage> {
        self.receiver.recv().ok()
    }

    /// Receives one command without blocking.
    pub fn try_recv(&self) -> Option<ControlMessage> {
        self.receiver.try_recv().ok()
    }

    /// Sends a message to the control side.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Disconnected`] if the control side is gone.
    pub fn send(&self, message: SimulationMessage) -> ChannelResult<()> {
        self.sender
            .send(message)
            .map_err(|_| ChannelError::Disconnected)
    }

    /// Number of commands waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Control-side end of the channel pair.
pub struct SimulationChannel {
    state: ChannelState,
    sender: Sender<ControlMessage>,
    receiver: Receiver<SimulationMessage>,
    /// Commands issued before READY, in issue order.
    queued: VecDeque<ControlMessage>,
}

impl SimulationChannel {
    /// Creates a connected control/simulation pair.
    ///
    /// Both directions are unbounded: the control side never blocks on send.
    #[must_use]
    pub fn pair() -> (Self, SimulationEndpoint) {
        let (control_tx, control_rx) = unbounded();
        let (sim_tx, sim_rx) = unbounded();
        let channel = Self {
            state: ChannelState::Uninitialized,
            sender: control_tx,
            receiver: sim_rx,
            queued: VecDeque::with_capacity(64),
        };
        let endpoint = SimulationEndpoint {
            receiver: control_rx,
            sender: sim_tx,
        };
        (channel, endpoint)
    }

    /// Current handshake state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Returns true once READY has been received.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ChannelState::Ready
    }

    /// Number of commands waiting for READY.
    #[inline]
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    /// Sends INIT with the transfer buffer and moves to `Initializing`.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::InvalidTransition`] unless `Uninitialized`
    /// - [`ChannelError::Disconnected`] if the simulation side is gone
    pub fn start(&mut self, config: WorldConfig, buffer: TransferBuffer) -> ChannelResult<()> {
        if self.state != ChannelState::Uninitialized {
            return Err(ChannelError::InvalidTransition {
                state: self.state,
                action: "send INIT",
            });
        }
        self.sender
            .send(ControlMessage::Init { config, buffer })
            .map_err(|_| ChannelError::Disconnected)?;
        self.state = ChannelState::Initializing;
        tracing::debug!("INIT sent, waiting for READY");
        Ok(())
    }

    /// Sends a command, or queues it until READY.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::InvalidTransition`] for INIT, which only `start` sends
    /// - [`ChannelError::Disconnected`] if the simulation side is gone
    pub fn send(&mut self, message: ControlMessage) -> ChannelResult<()> {
        if matches!(message, ControlMessage::Init { .. }) {
            return Err(ChannelError::InvalidTransition {
                state: self.state,
                action: "send INIT outside start",
            });
        }
        if self.is_ready() {
            self.deliver(message)
        } else {
            tracing::trace!("queued {} until READY", message.kind());
            self.queued.push_back(message);
            Ok(())
        }
    }

    /// Receives everything that has arrived, handling READY internally.
    ///
    /// READY is consumed here and never returned. A READY outside
    /// `Initializing` is logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Disconnected`] once the simulation side is
    /// gone and nothing is left to read.
    pub fn drain(&mut self) -> ChannelResult<Vec<SimulationMessage>> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(SimulationMessage::Ready) => self.on_ready()?,
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => return Ok(messages),
                Err(TryRecvError::Disconnected) => {
                    if messages.is_empty() {
                        return Err(ChannelError::Disconnected);
                    }
                    return Ok(messages);
                }
            }
        }
    }

    fn on_ready(&mut self) -> ChannelResult<()> {
        if self.state != ChannelState::Initializing {
            tracing::warn!("protocol violation: READY while {}, ignored", self.state);
            return Ok(());
        }

        self.state = ChannelState::Ready;
        let flushed = self.queued.len();
        while let Some(message) = self.queued.pop_front() {
            self.deliver(message)?;
        }
        tracing::info!("simulation ready, flushed {} queued commands", flushed);
        Ok(())
    }

    fn deliver(&self, message: ControlMessage) -> ChannelResult<()> {
        tracing::trace!("sending {}", message.kind());
        self.sender
            .send(message)
            .map_err(|_| ChannelError::Disconnected)
    }
}

impl fmt::Debug for SimulationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationChannel")
            .field("state", &self.state)
            .field("queued", &self.queued.len())
            .finish_non_exhaustive()
    }
}
