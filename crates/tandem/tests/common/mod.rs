//! Shared fixtures: a simulation peer scripted by the test itself.

#![allow(dead_code)]

use std::time::Duration;

use tandem::{
    BodyHandle, Capabilities, ControlMessage, PhysicsWorld, ShapeHandle, SimulationChannel,
    SimulationEndpoint, SimulationMessage, Slot, TransferBuffer, WorldConfig,
};

/// Plays the simulation side by hand, one message at a time.
pub struct ScriptedPeer {
    endpoint: SimulationEndpoint,
    buffer: Option<TransferBuffer>,
}

impl ScriptedPeer {
    /// World with `max_bodies` slots on a native platform.
    pub fn start(max_bodies: usize) -> (PhysicsWorld, Self) {
        Self::start_with(small_config(max_bodies), Capabilities::detect())
    }

    pub fn start_with(config: WorldConfig, capabilities: Capabilities) -> (PhysicsWorld, Self) {
        let (channel, endpoint) = SimulationChannel::pair();
        let world = PhysicsWorld::with_capabilities(config, channel, capabilities).unwrap();
        (
            world,
            Self {
                endpoint,
                buffer: None,
            },
        )
    }

    /// Takes INIT and its buffer, answers READY.
    pub fn accept_init(&mut self) -> WorldConfig {
        match self.endpoint.try_recv() {
            Some(ControlMessage::Init { config, buffer }) => {
                self.buffer = Some(buffer);
                self.endpoint.send(SimulationMessage::Ready).unwrap();
                config
            }
            other => panic!("expected INIT, got {other:?}"),
        }
    }

    /// Everything the control side sent since the last call. A returned
    /// buffer is kept and not listed.
    pub fn commands(&mut self) -> Vec<ControlMessage> {
        let mut out = Vec::new();
        while let Some(message) = self.endpoint.try_recv() {
            match message {
                ControlMessage::TransferData { buffer } => {
                    assert!(self.buffer.is_none(), "buffer returned while already held");
                    self.buffer = Some(buffer);
                }
                other => out.push(other),
            }
        }
        out
    }

    pub fn holds_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer_mut(&mut self) -> &mut TransferBuffer {
        self.buffer.as_mut().expect("peer does not hold the buffer")
    }

    /// Sends the buffer back as TRANSFER_DATA.
    pub fn hand_back(&mut self) {
        let buffer = self.buffer.take().expect("peer does not hold the buffer");
        self.endpoint
            .send(SimulationMessage::TransferData {
                buffer,
                step_duration: Duration::from_millis(2),
            })
            .unwrap();
    }

    pub fn body_ready(&self, handle: BodyHandle, slot: u32) {
        self.endpoint
            .send(SimulationMessage::BodyReady {
                handle,
                slot: Slot::new(slot),
            })
            .unwrap();
    }

    pub fn shapes_ready(&self, body: BodyHandle, shape: ShapeHandle) {
        self.endpoint
            .send(SimulationMessage::ShapesReady { body, shape })
            .unwrap();
    }

    pub fn send(&self, message: SimulationMessage) {
        self.endpoint.send(message).unwrap();
    }
}

pub fn small_config(max_bodies: usize) -> WorldConfig {
    WorldConfig::default()
        .with_max_bodies(max_bodies)
        .with_debug_vertex_capacity(1024)
}
