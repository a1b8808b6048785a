//! Body, shape and constraint lifecycle against a scripted simulation peer.

mod common;

use common::ScriptedPeer;
use tandem::{
    BodyOptions, ChannelState, ConstraintOptions, ControlMessage, LifecycleError, SceneNode,
    ShapeHandle, ShapeOptions, Slot,
};

#[test]
fn test_commands_wait_for_ready() {
    let (mut world, mut peer) = ScriptedPeer::start(8);
    assert_eq!(world.state(), ChannelState::Initializing);

    let handle = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();

    let config = peer.accept_init();
    assert_eq!(config.max_bodies, 8);
    assert!(peer.holds_buffer());
    assert!(peer.commands().is_empty(), "nothing may pass before READY");

    world.pump().unwrap();
    assert_eq!(world.state(), ChannelState::Ready);

    let commands = peer.commands();
    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], ControlMessage::AddBody { handle: h, .. } if h == handle));
}

#[test]
fn test_two_rapid_adds_bind_the_right_slots() {
    let (mut world, mut peer) = ScriptedPeer::start(8);
    peer.accept_init();

    let first = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    let second = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    assert_ne!(first, second);

    world.pump().unwrap();
    assert!(world.is_body_pending(first));
    assert!(world.is_body_pending(second));

    // Acknowledged out of order
    peer.body_ready(second, 0);
    world.pump().unwrap();
    assert!(world.is_body_pending(first));
    assert_eq!(world.body_slot(second), Some(Slot::new(0)));

    peer.body_ready(first, 1);
    world.pump().unwrap();
    assert_eq!(world.body_slot(first), Some(Slot::new(1)));
    assert_eq!(world.body_slot(second), Some(Slot::new(0)));
}

#[test]
fn test_late_body_ready_after_removal_binds_nothing() {
    let (mut world, mut peer) = ScriptedPeer::start(8);
    peer.accept_init();

    let doomed = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    world.pump().unwrap();
    assert!(world.remove_body(doomed).unwrap());

    peer.body_ready(doomed, 2);
    world.pump().unwrap();

    assert!(!world.is_body_ready(doomed));
    assert_eq!(world.body_slot(doomed), None);

    // Slot 2 is free for the next body
    let next = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    peer.body_ready(next, 2);
    world.pump().unwrap();
    assert_eq!(world.body_slot(next), Some(Slot::new(2)));
}

#[test]
fn test_remove_body_twice_is_noop() {
    let (mut world, mut peer) = ScriptedPeer::start(8);
    peer.accept_init();

    let keep = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    let gone = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    world.pump().unwrap();
    peer.body_ready(keep, 0);
    peer.body_ready(gone, 1);
    world.pump().unwrap();

    assert!(world.remove_body(gone).unwrap());
    assert!(!world.remove_body(gone).unwrap());

    assert_eq!(world.body_count(), 1);
    assert_eq!(world.body_slot(keep), Some(Slot::new(0)));

    let removes = peer
        .commands()
        .into_iter()
        .filter(|c| matches!(c, ControlMessage::RemoveBody { .. }))
        .count();
    assert_eq!(removes, 1);
}

#[test]
fn test_handle_zero_is_a_real_body() {
    let (mut world, mut peer) = ScriptedPeer::start(4);
    peer.accept_init();

    let handle = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    assert_eq!(handle.get(), 0);

    world.pump().unwrap();
    peer.body_ready(handle, 0);
    world.pump().unwrap();
    assert!(world.is_body_ready(handle));
}

#[test]
fn test_capacity_is_enforced() {
    let (mut world, _peer) = ScriptedPeer::start(2);
    for _ in 0..2 {
        world
            .add_body(SceneNode::new().shared(), BodyOptions::default())
            .unwrap();
    }

    let err = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap_err();
    assert_eq!(err, LifecycleError::CapacityExceeded { capacity: 2 });
}

#[test]
fn test_shapes_join_on_acknowledgement() {
    let (mut world, mut peer) = ScriptedPeer::start(4);
    peer.accept_init();

    let body = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    let shape = world.add_shapes(body, ShapeOptions::sphere(1.0)).unwrap();
    world.pump().unwrap();
    assert_eq!(world.shapes(body).map(<[_]>::len), Some(0));

    peer.shapes_ready(body, shape);
    world.pump().unwrap();
    let shapes = world.shapes(body).unwrap();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].handle, shape);

    world.remove_shapes(body, shape).unwrap();
    assert_eq!(world.shapes(body).map(<[_]>::len), Some(0));
    assert_eq!(
        world.remove_shapes(body, shape),
        Err(LifecycleError::UnknownShape { body, shape })
    );
}

#[test]
fn test_shapes_ready_for_wrong_body_is_ignored() {
    let (mut world, mut peer) = ScriptedPeer::start(4);
    peer.accept_init();

    let a = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    let b = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    let shape = world.add_shapes(a, ShapeOptions::default()).unwrap();
    world.pump().unwrap();

    peer.shapes_ready(b, shape);
    peer.shapes_ready(a, ShapeHandle::new(99));
    world.pump().unwrap();
    assert_eq!(world.shapes(b).map(<[_]>::len), Some(0));

    // The real acknowledgement still lands
    peer.shapes_ready(a, shape);
    world.pump().unwrap();
    assert_eq!(world.shapes(a).map(<[_]>::len), Some(1));
}

#[test]
fn test_operations_on_unknown_bodies_fail() {
    let (mut world, mut peer) = ScriptedPeer::start(4);
    peer.accept_init();
    let body = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    world.remove_body(body).unwrap();

    assert_eq!(
        world.add_shapes(body, ShapeOptions::default()),
        Err(LifecycleError::UnknownBody(body))
    );
    assert_eq!(
        world.update_body(body, BodyOptions::kinematic()),
        Err(LifecycleError::UnknownBody(body))
    );
    assert_eq!(
        world.reset_dynamic_body(body),
        Err(LifecycleError::UnknownBody(body))
    );
    assert_eq!(world.activate_body(body), Err(LifecycleError::UnknownBody(body)));
}

#[test]
fn test_constraint_lifecycle() {
    let (mut world, mut peer) = ScriptedPeer::start(4);
    peer.accept_init();

    let a = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();
    let b = world
        .add_body(SceneNode::new().shared(), BodyOptions::default())
        .unwrap();

    let constraint = world
        .add_constraint(a, b, ConstraintOptions::default())
        .unwrap();
    let entry = world.constraint(constraint).unwrap();
    assert_eq!((entry.source, entry.target), (a, b));

    // Removing a body leaves its constraints alone
    world.remove_body(b).unwrap();
    assert!(world.constraint(constraint).is_some());

    assert!(world.remove_constraint(constraint).unwrap());
    assert!(!world.remove_constraint(constraint).unwrap());

    assert_eq!(
        world.add_constraint(a, b, ConstraintOptions::default()),
        Err(LifecycleError::UnknownBody(b))
    );

    world.pump().unwrap();
    let kinds: Vec<&str> = peer.commands().iter().map(ControlMessage::kind).collect();
    assert!(kinds.contains(&"ADD_CONSTRAINT"));
    assert!(kinds.contains(&"REMOVE_CONSTRAINT"));
}
