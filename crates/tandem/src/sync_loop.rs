//! # Sync Loop
//!
//! The per-tick exchange between the transfer buffer and the scene.
//!
//! ```text
//! for (handle, slot) in registry (ascending handle):
//!   1. resolve slot + scene object
//!   2. apply the reported pose in parent space (scale is not reapplied)
//!   3. recompute world transform, write it into the slot
//!   4. read velocity magnitudes if tracked
//!   5. rebuild collision partners, skipping stale slots
//! hand the buffer back as TRANSFER_DATA
//! ```
//!
//! A tick without the buffer is a no-op. Nothing queues up behind it: the
//! next TRANSFER_DATA simply carries newer state.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tandem_core::{BodyHandle, BufferBaton, DebugChannel, SlotRegistry, TransferBuffer};
use tandem_shared::Mat4;

use crate::channel::SimulationChannel;
use crate::error::ChannelResult;
use crate::protocol::ControlMessage;
use crate::scene::SceneObject;
use crate::world::BodyEntry;

/// Statistics for one completed tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SyncStats {
    /// Live bodies processed.
    pub bodies_synced: u32,
    /// Kinematic and static bodies among them.
    pub kinematic_bodies: u32,
    /// Bodies whose local pose was replaced from the buffer.
    pub poses_applied: u32,
    /// Collision entries read before the sentinel.
    pub collisions_read: u32,
    /// Entries naming a slot with no live body.
    pub stale_collisions_skipped: u32,
    /// Time spent in the tick in microseconds.
    pub sync_time_us: u64,
    /// Step duration the simulation reported with the buffer.
    pub last_step_duration: Duration,
}

/// Change in a body's contact set between two ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionEvent {
    /// `other` started touching `body`.
    Started {
        /// Body that asked for events.
        body: BodyHandle,
        /// New partner.
        other: BodyHandle,
    },
    /// `other` stopped touching `body`.
    Ended {
        /// Body that asked for events.
        body: BodyHandle,
        /// Former partner.
        other: BodyHandle,
    },
}

/// Borrowed world state a tick operates on.
pub(crate) struct SyncTargets<'a> {
    pub registry: &'a SlotRegistry,
    pub bodies: &'a mut BTreeMap<BodyHandle, BodyEntry>,
    pub channel: &'a mut SimulationChannel,
    pub debug: &'a mut DebugChannel,
    pub events: &'a mut Vec<CollisionEvent>,
}

/// Control-side half of the buffer exchange.
#[derive(Debug)]
pub struct SyncLoop {
    baton: BufferBaton,
    stats: SyncStats,
    /// Previous partner list of the body being processed.
    previous: Vec<BodyHandle>,
}

impl SyncLoop {
    /// Creates a loop for buffers of `capacity` slots.
    ///
    /// The loop starts without the buffer: it travels with INIT and comes
    /// back with the first TRANSFER_DATA.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            baton: BufferBaton::empty(capacity),
            stats: SyncStats::default(),
            previous: Vec::with_capacity(tandem_shared::MAX_COLLISIONS_PER_BODY),
        }
    }

    /// Returns true while the buffer is held locally.
    #[inline]
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.baton.is_owned()
    }

    /// The ownership baton.
    #[inline]
    #[must_use]
    pub fn baton(&self) -> &BufferBaton {
        &self.baton
    }

    /// Statistics of the last completed tick.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Takes a buffer that arrived with TRANSFER_DATA.
    ///
    /// A buffer arriving while one is held, or with the wrong capacity, is a
    /// protocol violation: it is logged and dropped.
    pub fn receive(&mut self, buffer: TransferBuffer, step_duration: Duration) -> bool {
        match self.baton.swap_in(buffer, step_duration) {
            Ok(()) => true,
            Err((err, _dropped)) => {
                tracing::warn!("protocol violation: {}, TRANSFER_DATA dropped", err);
                false
            }
        }
    }

    /// Runs one tick. Returns `None` when there was nothing to do.
    pub(crate) fn tick(&mut self, targets: SyncTargets<'_>) -> ChannelResult<Option<SyncStats>> {
        let SyncTargets {
            registry,
            bodies,
            channel,
            debug,
            events,
        } = targets;

        if !channel.is_ready() {
            return Ok(None);
        }

        let started = Instant::now();
        let mut stats = SyncStats {
            last_step_duration: self.baton.last_step_duration(),
            ..SyncStats::default()
        };

        let Ok(buffer) = self.baton.get_mut() else {
            return Ok(None);
        };

        // The simulation draws during its round trip, so the geometry is
        // complete while the buffer is here
        if let Some(vertices) = debug.sync() {
            tracing::trace!("debug draw range 0..{}", vertices);
        }

        for (handle, slot) in registry.iter() {
            let Some(entry) = bodies.get_mut(&handle) else {
                tracing::warn!("{} bound to {} has no body entry", handle, slot);
                continue;
            };

            {
                let mut object = entry.object.write();
                let reported = buffer.transform(slot);

                // Skip only what this context wrote itself, so a scene-side
                // move of a kinematic body survives until it is written back.
                if entry.last_written != Some(reported) {
                    apply_in_parent_space(&mut *object, &reported);
                    stats.poses_applied += 1;
                }
                if entry.options.kind.is_externally_driven() {
                    stats.kinematic_bodies += 1;
                }

                object.update_world_transform();
                let world = object.world_transform();
                buffer.set_transform(slot, world);
                entry.last_written = Some(world);
            }

            if entry.options.track_velocities {
                entry.linear_velocity = buffer.linear_velocity(slot);
                entry.angular_velocity = buffer.angular_velocity(slot);
            }

            std::mem::swap(&mut entry.collisions, &mut self.previous);
            entry.collisions.clear();
            for partner in buffer.collisions(slot) {
                stats.collisions_read += 1;
                match registry.resolve_handle(partner) {
                    Some(other) => entry.collisions.push(other),
                    None => {
                        stats.stale_collisions_skipped += 1;
                        tracing::trace!("{} reports stale partner {}", handle, partner);
                    }
                }
            }

            if entry.options.emit_collision_events {
                diff_partners(handle, &self.previous, &entry.collisions, events);
            }
            stats.bodies_synced += 1;
        }

        let buffer = match self.baton.hand_off() {
            Ok(buffer) => buffer,
            Err(_) => return Ok(None),
        };
        channel.send(ControlMessage::TransferData { buffer })?;

        stats.sync_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.stats = stats;
        Ok(Some(stats))
    }
}

/// Converts a world pose into the object's parent space and applies
/// position and orientation. Decomposed scale is dropped.
fn apply_in_parent_space(object: &mut dyn SceneObject, world: &Mat4) {
    let parent = object.parent_world_transform();
    let local = match parent.inverse() {
        Some(inverse) => inverse * *world,
        None => {
            tracing::warn!("parent transform is singular, applying world pose as local");
            *world
        }
    };
    let (position, rotation, _scale) = local.decompose();
    object.set_position(position);
    object.set_rotation(rotation);
}

fn diff_partners(
    body: BodyHandle,
    previous: &[BodyHandle],
    current: &[BodyHandle],
    events: &mut Vec<CollisionEvent>,
) {
    for &other in current {
        if !previous.contains(&other) {
            events.push(CollisionEvent::Started { body, other });
        }
    }
    for &other in previous {
        if !current.contains(&other) {
            events.push(CollisionEvent::Ended { body, other });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::protocol::SimulationMessage;
    use crate::scene::{SceneNode, SceneRef};
    use crate::SimulationEndpoint;
    use tandem_core::{Capabilities, Slot};
    use tandem_shared::{BodyOptions, Quaternion, Vec3};

    struct Fixture {
        sync: SyncLoop,
        registry: SlotRegistry,
        bodies: BTreeMap<BodyHandle, BodyEntry>,
        channel: SimulationChannel,
        endpoint: SimulationEndpoint,
        debug: DebugChannel,
        events: Vec<CollisionEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let (mut channel, endpoint) = SimulationChannel::pair();
            channel
                .start(WorldConfig::default().with_max_bodies(8), TransferBuffer::new(8))
                .unwrap();
            let _init = endpoint.try_recv();
            endpoint.send(SimulationMessage::Ready).unwrap();
            channel.drain().unwrap();

            Self {
                sync: SyncLoop::new(8),
                registry: SlotRegistry::new(8),
                bodies: BTreeMap::new(),
                channel,
                endpoint,
                debug: DebugChannel::new(Capabilities::detect(), 16),
                events: Vec::new(),
            }
        }

        fn body(&mut self, handle: u64, slot: u32, options: BodyOptions) -> SceneRef {
            let object: SceneRef = SceneNode::new().shared();
            self.bodies.insert(
                BodyHandle::new(handle),
                BodyEntry::new(object.clone(), options),
            );
            self.registry
                .bind(BodyHandle::new(handle), Slot::new(slot))
                .unwrap();
            object
        }

        fn tick(&mut self) -> Option<SyncStats> {
            self.sync
                .tick(SyncTargets {
                    registry: &self.registry,
                    bodies: &mut self.bodies,
                    channel: &mut self.channel,
                    debug: &mut self.debug,
                    events: &mut self.events,
                })
                .unwrap()
        }

        /// Plays the simulation: take the returned buffer, edit, send back.
        fn round_trip(&mut self, edit: impl FnOnce(&mut TransferBuffer)) {
            let mut buffer = match self.endpoint.try_recv() {
                Some(ControlMessage::TransferData { buffer }) => buffer,
                other => panic!("expected TRANSFER_DATA, got {other:?}"),
            };
            edit(&mut buffer);
            assert!(self.sync.receive(buffer, Duration::from_millis(2)));
        }
    }

    #[test]
    fn test_tick_without_buffer_is_noop() {
        let mut fx = Fixture::new();
        fx.body(0, 0, BodyOptions::default());
        assert!(fx.tick().is_none());
        assert!(fx.endpoint.try_recv().is_none());
    }

    #[test]
    fn test_kinematic_pose_in_identity_parent() {
        let mut fx = Fixture::new();
        let object = fx.body(7, 3, BodyOptions::kinematic());

        let rotation = Quaternion::from_axis_angle(Vec3::Y, 0.75);
        let written = Mat4::compose(Vec3::new(1.0, -2.0, 0.5), rotation, Vec3::ONE);
        let mut buffer = TransferBuffer::new(8);
        buffer.set_transform(Slot::new(3), written);
        assert!(fx.sync.receive(buffer, Duration::ZERO));

        let stats = fx.tick().unwrap();
        assert_eq!(stats.kinematic_bodies, 1);
        assert_eq!(stats.poses_applied, 1);

        let local = object.read().local_transform();
        assert!(local.approx_eq(&written, 1e-5));
        assert!(!fx.sync.is_owned());
    }

    #[test]
    fn test_pose_converted_into_parent_space() {
        let mut fx = Fixture::new();
        let parent: SceneRef = SceneNode::new()
            .with_position(Vec3::new(10.0, 0.0, 0.0))
            .shared();
        let child: SceneRef = SceneNode::new().with_parent(parent).shared();
        fx.bodies
            .insert(BodyHandle::new(0), BodyEntry::new(child.clone(), BodyOptions::default()));
        fx.registry.bind(BodyHandle::new(0), Slot::new(0)).unwrap();

        let mut buffer = TransferBuffer::new(8);
        buffer.set_transform(Slot::new(0), Mat4::from_translation(Vec3::new(12.0, 1.0, 0.0)));
        fx.sync.receive(buffer, Duration::ZERO);
        fx.tick().unwrap();

        let child = child.read();
        assert!((child.position() - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
        assert!((child.world_transform().translation() - Vec3::new(12.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_world_transform_written_back() {
        let mut fx = Fixture::new();
        let object = fx.body(0, 1, BodyOptions::kinematic());
        fx.sync.receive(TransferBuffer::new(8), Duration::ZERO);
        fx.tick().unwrap();

        // Scene moves the kinematic body; the next tick reports it
        object.write().set_position(Vec3::new(0.0, 4.0, 0.0));
        let mut seen = Mat4::IDENTITY;
        fx.round_trip(|_| {});
        fx.tick().unwrap();
        fx.round_trip(|buffer| seen = buffer.transform(Slot::new(1)));

        assert_eq!(seen.translation(), Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(object.read().position(), Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn test_collision_partners_resolved() {
        let mut fx = Fixture::new();
        fx.body(7, 3, BodyOptions::default());
        fx.body(5, 5, BodyOptions::default());

        let mut buffer = TransferBuffer::new(8);
        buffer.set_collisions(Slot::new(3), &[Slot::new(5)]);
        fx.sync.receive(buffer, Duration::ZERO);
        fx.tick().unwrap();

        let partners = &fx.bodies[&BodyHandle::new(7)].collisions;
        assert_eq!(partners, &vec![BodyHandle::new(5)]);
    }

    #[test]
    fn test_stale_partner_is_skipped() {
        let mut fx = Fixture::new();
        fx.body(1, 0, BodyOptions::default());

        let mut buffer = TransferBuffer::new(8);
        buffer.set_collisions(Slot::new(0), &[Slot::new(6), Slot::new(7)]);
        fx.sync.receive(buffer, Duration::ZERO);
        let stats = fx.tick().unwrap();

        assert!(fx.bodies[&BodyHandle::new(1)].collisions.is_empty());
        assert_eq!(stats.collisions_read, 2);
        assert_eq!(stats.stale_collisions_skipped, 2);
    }

    #[test]
    fn test_partners_rebuilt_every_tick() {
        let mut fx = Fixture::new();
        fx.body(0, 0, BodyOptions::default().with_collision_events());
        fx.body(1, 1, BodyOptions::default());

        let mut buffer = TransferBuffer::new(8);
        buffer.set_collisions(Slot::new(0), &[Slot::new(1)]);
        fx.sync.receive(buffer, Duration::ZERO);
        fx.tick().unwrap();
        assert_eq!(
            fx.events,
            vec![CollisionEvent::Started {
                body: BodyHandle::new(0),
                other: BodyHandle::new(1)
            }]
        );

        fx.round_trip(|buffer| {
            buffer.set_collisions(Slot::new(0), &[]);
        });
        fx.tick().unwrap();
        assert!(fx.bodies[&BodyHandle::new(0)].collisions.is_empty());
        assert_eq!(
            fx.events[1],
            CollisionEvent::Ended {
                body: BodyHandle::new(0),
                other: BodyHandle::new(1)
            }
        );
    }

    #[test]
    fn test_velocities_only_when_tracked() {
        let mut fx = Fixture::new();
        fx.body(0, 0, BodyOptions::default().with_velocity_tracking());
        fx.body(1, 1, BodyOptions::default());

        let mut buffer = TransferBuffer::new(8);
        buffer.set_velocities(Slot::new(0), 3.0, 0.5);
        buffer.set_velocities(Slot::new(1), 9.0, 9.0);
        fx.sync.receive(buffer, Duration::from_millis(4));
        let stats = fx.tick().unwrap();

        let tracked = &fx.bodies[&BodyHandle::new(0)];
        assert_eq!((tracked.linear_velocity, tracked.angular_velocity), (3.0, 0.5));
        let untracked = &fx.bodies[&BodyHandle::new(1)];
        assert_eq!((untracked.linear_velocity, untracked.angular_velocity), (0.0, 0.0));
        assert_eq!(stats.last_step_duration, Duration::from_millis(4));
    }

    #[test]
    fn test_duplicate_transfer_is_dropped() {
        let mut fx = Fixture::new();
        assert!(fx.sync.receive(TransferBuffer::new(8), Duration::ZERO));
        assert!(!fx.sync.receive(TransferBuffer::new(8), Duration::ZERO));
        assert!(!fx.sync.receive(TransferBuffer::new(3), Duration::ZERO));
        assert_eq!(fx.sync.baton().round_trips(), 1);
    }
}
