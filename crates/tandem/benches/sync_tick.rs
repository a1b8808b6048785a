//! # Sync Tick Benchmark
//!
//! Cost of one control-side tick: pose read-back, write-back and collision
//! rebuild for every live body, then the hand-off.
//!
//! The simulation side is played inline so only the control work is timed.

#![allow(missing_docs)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tandem::{
    BodyOptions, ControlMessage, PhysicsWorld, SceneNode, SimulationChannel, SimulationEndpoint,
    SimulationMessage, Slot, TransferBuffer, Vec3, WorldConfig,
};

fn take_buffer(endpoint: &SimulationEndpoint) -> TransferBuffer {
    loop {
        match endpoint.try_recv() {
            Some(ControlMessage::TransferData { buffer } | ControlMessage::Init { buffer, .. }) => {
                return buffer
            }
            Some(_) => {}
            None => panic!("buffer did not come back"),
        }
    }
}

fn hand_back(endpoint: &SimulationEndpoint, buffer: TransferBuffer) {
    endpoint
        .send(SimulationMessage::TransferData {
            buffer,
            step_duration: Duration::from_micros(500),
        })
        .unwrap();
}

/// A ready world with `count` dynamic bodies bound to slots 0..count, each
/// touching its neighbour.
fn setup(count: usize) -> (PhysicsWorld, SimulationEndpoint, TransferBuffer) {
    let (channel, endpoint) = SimulationChannel::pair();
    let config = WorldConfig::default()
        .with_max_bodies(count)
        .with_debug_vertex_capacity(16);
    let mut world = PhysicsWorld::new(config, channel).unwrap();
    let mut buffer = take_buffer(&endpoint);
    endpoint.send(SimulationMessage::Ready).unwrap();

    for i in 0..count {
        let node = SceneNode::new()
            .with_position(Vec3::new(i as f32, 0.0, 0.0))
            .shared();
        let handle = world
            .add_body(node, BodyOptions::default().with_velocity_tracking())
            .unwrap();
        let slot = Slot::new(i as u32);
        endpoint
            .send(SimulationMessage::BodyReady { handle, slot })
            .unwrap();
        let neighbour = Slot::new(((i + 1) % count) as u32);
        buffer.set_collisions(slot, &[neighbour]);
    }
    world.pump().unwrap();
    while endpoint.try_recv().is_some() {}

    (world, endpoint, buffer)
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_tick");

    for count in [100, 1_000, 10_000] {
        let (mut world, endpoint, buffer) = setup(count);
        let mut buffer = Some(buffer);

        group.bench_with_input(BenchmarkId::new("bodies", count), &count, |b, _| {
            b.iter(|| {
                if let Some(buffer) = buffer.take() {
                    hand_back(&endpoint, buffer);
                }
                black_box(world.tick().unwrap());
                buffer = Some(take_buffer(&endpoint));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
