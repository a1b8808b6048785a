//! # Ballistic Engine
//!
//! A small reference solver: gravity, damping, kinematic driving and
//! bounding-sphere contacts. No impulses, no constraint solving.
//!
//! ```text
//! step(dt):
//!   dynamic  → v += g·dt, v *= (1 - damping)^dt, x += v·dt
//!   kinematic/static → pose from set_kinematic_transform
//!   contacts → every pair whose reach spheres overlap and filters agree
//! ```
//!
//! Good enough to drive the synchronization layer end to end. A real solver
//! plugs in through [`SimulationEngine`].

use std::collections::BTreeMap;

use tandem_core::{BodyHandle, ConstraintHandle, DebugBuffer, ShapeHandle};
use tandem_shared::{
    ActivationState, BodyOptions, ConstraintOptions, DebugDrawMode, Mat4, Quaternion,
    ShapeOptions, Vec3,
};

use super::{BodyState, SimulationEngine};
use crate::config::WorldConfig;

const AABB_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const CONTACT_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.0);

#[derive(Debug)]
struct Body {
    options: BodyOptions,
    position: Vec3,
    rotation: Quaternion,
    scale: Vec3,
    /// Pose as last handed in, reported verbatim until the body moves.
    echo: Option<Mat4>,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    activation: ActivationState,
    shapes: BTreeMap<ShapeHandle, ShapeOptions>,
    contacts: Vec<BodyHandle>,
}

impl Body {
    fn is_simulated(&self) -> bool {
        !self.options.kind.is_externally_driven()
            && self.options.mass > 0.0
            && !matches!(
                self.activation,
                ActivationState::IslandSleeping | ActivationState::DisableSimulation
            )
    }

    /// Radius around the origin containing every shape, `None` without shapes.
    fn reach(&self) -> Option<f32> {
        let scale = self.scale.max_element().abs();
        self.shapes
            .values()
            .map(|s| s.reach() * scale)
            .reduce(f32::max)
    }

    fn stop(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }
}

/// Reference [`SimulationEngine`] with point-mass dynamics.
#[derive(Debug, Default)]
pub struct BallisticEngine {
    gravity: Vec3,
    bodies: BTreeMap<BodyHandle, Body>,
    constraints: BTreeMap<ConstraintHandle, (BodyHandle, BodyHandle, ConstraintOptions)>,
    steps: u64,
}

impl BallisticEngine {
    /// Creates an empty engine. Gravity arrives with `init`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of stored constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Steps taken since creation.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Sets a body's linear velocity, waking it.
    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.linear_velocity = velocity;
            body.activation = ActivationState::Active;
        }
    }

    fn integrate(&mut self, dt: f32) {
        let world_gravity = self.gravity;
        for body in self.bodies.values_mut().filter(|b| b.is_simulated()) {
            let gravity = body.options.gravity.unwrap_or(world_gravity);
            let linear_keep = (1.0 - body.options.linear_damping.clamp(0.0, 1.0)).powf(dt);
            let angular_keep = (1.0 - body.options.angular_damping.clamp(0.0, 1.0)).powf(dt);

            body.linear_velocity = (body.linear_velocity + gravity * dt) * linear_keep;
            body.angular_velocity = body.angular_velocity * angular_keep;
            body.position += body.linear_velocity * dt;
            body.echo = None;

            let spin = body.angular_velocity.length();
            if spin > f32::EPSILON {
                let delta = Quaternion::from_axis_angle(body.angular_velocity * (1.0 / spin), spin * dt);
                body.rotation = (delta * body.rotation).normalize();
            }
        }
    }

    fn detect_contacts(&mut self) {
        let candidates: Vec<(BodyHandle, Vec3, f32)> = self
            .bodies
            .iter()
            .filter_map(|(&h, b)| b.reach().map(|r| (h, b.position, r)))
            .collect();

        for body in self.bodies.values_mut() {
            body.contacts.clear();
        }

        for (i, &(a, pa, ra)) in candidates.iter().enumerate() {
            for &(b, pb, rb) in &candidates[i + 1..] {
                if pa.distance(pb) > ra + rb {
                    continue;
                }
                let accepted = match (self.bodies.get(&a), self.bodies.get(&b)) {
                    (Some(x), Some(y)) => x.options.collides_with(&y.options),
                    _ => false,
                };
                if !accepted {
                    continue;
                }
                if let Some(x) = self.bodies.get_mut(&a) {
                    x.contacts.push(b);
                }
                if let Some(y) = self.bodies.get_mut(&b) {
                    y.contacts.push(a);
                }
            }
        }
    }
}

impl SimulationEngine for BallisticEngine {
    fn init(&mut self, config: &WorldConfig) {
        self.gravity = config.gravity;
        tracing::debug!("ballistic engine gravity {:?}", self.gravity);
    }

    fn add_body(&mut self, handle: BodyHandle, options: &BodyOptions, transform: Mat4) {
        let (position, rotation, scale) = transform.decompose();
        self.bodies.insert(
            handle,
            Body {
                activation: options.activation_state,
                options: options.clone(),
                position,
                rotation,
                scale,
                echo: Some(transform),
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                shapes: BTreeMap::new(),
                contacts: Vec::new(),
            },
        );
    }

    fn update_body(&mut self, handle: BodyHandle, options: &BodyOptions) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.options = options.clone();
            if options.kind.is_externally_driven() {
                body.stop();
            }
        }
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if self.bodies.remove(&handle).is_none() {
            return;
        }
        for body in self.bodies.values_mut() {
            body.contacts.retain(|&other| other != handle);
        }
    }

    fn add_shapes(&mut self, body: BodyHandle, shape: ShapeHandle, options: &ShapeOptions) {
        if let Some(body) = self.bodies.get_mut(&body) {
            body.shapes.insert(shape, options.clone());
        }
    }

    fn remove_shapes(&mut self, body: BodyHandle, shape: ShapeHandle) {
        if let Some(body) = self.bodies.get_mut(&body) {
            body.shapes.remove(&shape);
        }
    }

    fn add_constraint(
        &mut self,
        handle: ConstraintHandle,
        source: BodyHandle,
        target: BodyHandle,
        options: &ConstraintOptions,
    ) {
        if self.bodies.contains_key(&source) && self.bodies.contains_key(&target) {
            self.constraints
                .insert(handle, (source, target, options.clone()));
        }
    }

    fn remove_constraint(&mut self, handle: ConstraintHandle) {
        self.constraints.remove(&handle);
    }

    fn set_kinematic_transform(&mut self, handle: BodyHandle, transform: Mat4) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if body.options.kind.is_externally_driven() {
                let (position, rotation, scale) = transform.decompose();
                body.position = position;
                body.rotation = rotation;
                body.scale = scale;
                body.echo = Some(transform);
            }
        }
    }

    fn step(&mut self, dt: f32) {
        self.integrate(dt);
        self.detect_contacts();
        self.steps += 1;
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        let body = self.bodies.get(&handle)?;
        Some(BodyState {
            transform: body
                .echo
                .unwrap_or_else(|| Mat4::compose(body.position, body.rotation, body.scale)),
            linear_speed: body.linear_velocity.length(),
            angular_speed: body.angular_velocity.length(),
        })
    }

    fn contacts(&self, handle: BodyHandle, out: &mut Vec<BodyHandle>) {
        if let Some(body) = self.bodies.get(&handle) {
            out.extend_from_slice(&body.contacts);
        }
    }

    fn reset_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.stop();
        }
    }

    fn activate_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.activation = ActivationState::Active;
        }
    }

    fn draw_debug(&self, mode: DebugDrawMode, out: &DebugBuffer) {
        let boxes = mode.contains(DebugDrawMode::DRAW_AABB)
            || mode.contains(DebugDrawMode::DRAW_WIREFRAME);
        let contacts = mode.contains(DebugDrawMode::DRAW_CONTACT_POINTS);

        for (&handle, body) in &self.bodies {
            let Some(reach) = body.reach() else {
                continue;
            };
            if boxes && !draw_cube(out, body.position, reach) {
                return;
            }
            if contacts {
                for other in body.contacts.iter().filter(|&&o| o > handle) {
                    let Some(partner) = self.bodies.get(other) else {
                        continue;
                    };
                    if !out.push_line(body.position, partner.position, CONTACT_COLOR) {
                        return;
                    }
                }
            }
        }
    }
}

/// Twelve edges of an axis-aligned cube. False once the buffer is full.
fn draw_cube(out: &DebugBuffer, center: Vec3, half: f32) -> bool {
    let corner = |i: u32| {
        let sign = |bit: u32| if i & bit == 0 { -half } else { half };
        center + Vec3::new(sign(1), sign(2), sign(4))
    };
    for i in 0..8u32 {
        for bit in [1u32, 2, 4] {
            if i & bit == 0 && !out.push_line(corner(i), corner(i | bit), AABB_COLOR) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> BallisticEngine {
        let mut engine = BallisticEngine::new();
        engine.init(&WorldConfig::default().with_gravity(Vec3::new(0.0, -10.0, 0.0)));
        engine
    }

    fn at(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, z))
    }

    fn with_sphere(engine: &mut BallisticEngine, handle: u64, options: BodyOptions, pos: Mat4) {
        engine.add_body(BodyHandle::new(handle), &options, pos);
        engine.add_shapes(BodyHandle::new(handle), ShapeHandle::new(handle), &ShapeOptions::sphere(0.5));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut engine = engine();
        let handle = BodyHandle::new(0);
        let mut options = BodyOptions::dynamic(1.0);
        options.linear_damping = 0.0;
        engine.add_body(handle, &options, at(0.0, 10.0, 0.0));

        for _ in 0..10 {
            engine.step(0.1);
        }

        let state = engine.body_state(handle).unwrap();
        assert!(state.transform.translation().y < 5.0);
        assert!((state.linear_speed - 10.0).abs() < 1e-3);
        assert_eq!(engine.steps(), 10);
    }

    #[test]
    fn test_gravity_override() {
        let mut engine = engine();
        let mut options = BodyOptions::dynamic(1.0);
        options.gravity = Some(Vec3::ZERO);
        engine.add_body(BodyHandle::new(0), &options, at(0.0, 1.0, 0.0));

        engine.step(1.0);

        let state = engine.body_state(BodyHandle::new(0)).unwrap();
        assert_eq!(state.transform.translation(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_kinematic_body_follows_scene() {
        let mut engine = engine();
        let handle = BodyHandle::new(3);
        engine.add_body(handle, &BodyOptions::kinematic(), Mat4::IDENTITY);

        engine.set_kinematic_transform(handle, at(2.0, 0.0, 0.0));
        engine.step(0.5);

        let state = engine.body_state(handle).unwrap();
        assert!(state.transform.approx_eq(&at(2.0, 0.0, 0.0), 1e-5));
        assert_eq!(state.linear_speed, 0.0);
    }

    #[test]
    fn test_kinematic_pose_is_echoed_exactly() {
        let mut engine = engine();
        let handle = BodyHandle::new(0);
        let pose = Mat4::compose(
            Vec3::new(123.456, -7.89, 0.001),
            Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, 3.0) * (1.0 / 14f32.sqrt()), 0.7),
            Vec3::new(2.0, 2.0, 2.0),
        );
        engine.add_body(handle, &BodyOptions::kinematic(), pose);
        engine.step(0.1);

        assert_eq!(engine.body_state(handle).unwrap().transform, pose);
    }

    #[test]
    fn test_dynamic_body_ignores_kinematic_input() {
        let mut engine = engine();
        engine.add_body(BodyHandle::new(0), &BodyOptions::dynamic(1.0), Mat4::IDENTITY);
        engine.set_kinematic_transform(BodyHandle::new(0), at(5.0, 5.0, 5.0));

        let state = engine.body_state(BodyHandle::new(0)).unwrap();
        assert!(state.transform.approx_eq(&Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_sleeping_body_stays_put_until_activated() {
        let mut engine = engine();
        let mut options = BodyOptions::dynamic(1.0);
        options.activation_state = ActivationState::IslandSleeping;
        engine.add_body(BodyHandle::new(0), &options, Mat4::IDENTITY);

        engine.step(0.1);
        assert_eq!(engine.body_state(BodyHandle::new(0)).unwrap().linear_speed, 0.0);

        engine.activate_body(BodyHandle::new(0));
        engine.step(0.1);
        assert!(engine.body_state(BodyHandle::new(0)).unwrap().linear_speed > 0.0);
    }

    #[test]
    fn test_overlapping_bodies_touch() {
        let mut engine = engine();
        with_sphere(&mut engine, 0, BodyOptions::fixed(), Mat4::IDENTITY);
        with_sphere(&mut engine, 1, BodyOptions::fixed(), at(0.8, 0.0, 0.0));
        with_sphere(&mut engine, 2, BodyOptions::fixed(), at(10.0, 0.0, 0.0));
        engine.step(0.01);

        let mut out = Vec::new();
        engine.contacts(BodyHandle::new(0), &mut out);
        assert_eq!(out, vec![BodyHandle::new(1)]);

        out.clear();
        engine.contacts(BodyHandle::new(2), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_filtered_bodies_do_not_touch() {
        let mut engine = engine();
        let mut ghost = BodyOptions::fixed();
        ghost.disable_collision = true;
        with_sphere(&mut engine, 0, BodyOptions::fixed(), Mat4::IDENTITY);
        with_sphere(&mut engine, 1, ghost, Mat4::IDENTITY);
        engine.step(0.01);

        let mut out = Vec::new();
        engine.contacts(BodyHandle::new(0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_removed_body_leaves_contact_lists() {
        let mut engine = engine();
        with_sphere(&mut engine, 0, BodyOptions::fixed(), Mat4::IDENTITY);
        with_sphere(&mut engine, 1, BodyOptions::fixed(), Mat4::IDENTITY);
        engine.step(0.01);

        engine.remove_body(BodyHandle::new(1));

        let mut out = Vec::new();
        engine.contacts(BodyHandle::new(0), &mut out);
        assert!(out.is_empty());
        assert_eq!(engine.body_count(), 1);
    }

    #[test]
    fn test_reset_zeroes_velocity() {
        let mut engine = engine();
        engine.add_body(BodyHandle::new(0), &BodyOptions::dynamic(1.0), Mat4::IDENTITY);
        engine.set_linear_velocity(BodyHandle::new(0), Vec3::new(3.0, 0.0, 0.0));

        engine.reset_body(BodyHandle::new(0));

        assert_eq!(engine.body_state(BodyHandle::new(0)).unwrap().linear_speed, 0.0);
    }

    #[test]
    fn test_constraint_needs_both_bodies() {
        let mut engine = engine();
        engine.add_body(BodyHandle::new(0), &BodyOptions::fixed(), Mat4::IDENTITY);
        let options = ConstraintOptions::default();

        engine.add_constraint(ConstraintHandle::new(0), BodyHandle::new(0), BodyHandle::new(9), &options);
        assert_eq!(engine.constraint_count(), 0);

        engine.add_body(BodyHandle::new(9), &BodyOptions::fixed(), Mat4::IDENTITY);
        engine.add_constraint(ConstraintHandle::new(0), BodyHandle::new(0), BodyHandle::new(9), &options);
        assert_eq!(engine.constraint_count(), 1);

        engine.remove_constraint(ConstraintHandle::new(0));
        assert_eq!(engine.constraint_count(), 0);
    }

    #[test]
    fn test_draw_debug_emits_cube_and_contact_lines() {
        let mut engine = engine();
        with_sphere(&mut engine, 0, BodyOptions::fixed(), Mat4::IDENTITY);
        with_sphere(&mut engine, 1, BodyOptions::fixed(), at(0.5, 0.0, 0.0));
        engine.step(0.01);

        let out = DebugBuffer::new(256);
        engine.draw_debug(DebugDrawMode::DRAW_AABB | DebugDrawMode::DRAW_CONTACT_POINTS, &out);

        // Two cubes of 12 edges plus one contact line, two vertices each
        assert_eq!(out.pending(), (2 * 12 + 1) * 2);
    }

    #[test]
    fn test_draw_debug_stops_when_full() {
        let mut engine = engine();
        with_sphere(&mut engine, 0, BodyOptions::fixed(), Mat4::IDENTITY);

        let out = DebugBuffer::new(6);
        engine.draw_debug(DebugDrawMode::DRAW_WIREFRAME, &out);
        assert!(out.pending() <= 6);
    }
}
