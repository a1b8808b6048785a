//! # Entity Options
//!
//! Explicit creation options for bodies, shapes and constraints.
//!
//! Every field has a documented default. Absence of a field in a TOML scene
//! description means "use the default below", never "feature off".

use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Vec3};

/// Who owns the pose of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BodyKind {
    /// Pose is computed by the simulation.
    #[default]
    Dynamic = 0,
    /// Pose is driven by the scene and reported into the simulation.
    Kinematic = 1,
    /// Never moves; pose comes from the scene.
    Static = 2,
}

impl BodyKind {
    /// Returns true when the scene, not the simulation, is authoritative.
    #[inline]
    #[must_use]
    pub const fn is_externally_driven(self) -> bool {
        matches!(self, Self::Kinematic | Self::Static)
    }
}

/// Sleep behaviour of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ActivationState {
    /// Awake, may fall asleep.
    #[default]
    Active = 1,
    /// Asleep until disturbed.
    IslandSleeping = 2,
    /// Wants to sleep.
    WantsDeactivation = 3,
    /// Never sleeps.
    DisableDeactivation = 4,
    /// Never simulated.
    DisableSimulation = 5,
}

/// Creation/update options for a rigid body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyOptions {
    /// Body kind. Default: dynamic.
    pub kind: BodyKind,
    /// Mass in kilograms. Default: 1.0. Ignored for kinematic/static bodies.
    pub mass: f32,
    /// Linear damping per second. Default: 0.01.
    pub linear_damping: f32,
    /// Angular damping per second. Default: 0.01.
    pub angular_damping: f32,
    /// Surface friction. Default: 0.5.
    pub friction: f32,
    /// Bounciness. Default: 0.0.
    pub restitution: f32,
    /// Per-body gravity override. Default: `None` (world gravity).
    pub gravity: Option<Vec3>,
    /// Collision group bits. Default: 1.
    pub collision_filter_group: u32,
    /// Collision mask bits. Default: 1.
    pub collision_filter_mask: u32,
    /// Initial sleep behaviour. Default: active.
    pub activation_state: ActivationState,
    /// Queue collision started/ended events for this body. Default: false.
    pub emit_collision_events: bool,
    /// Read velocity magnitudes back every tick. Default: false.
    pub track_velocities: bool,
    /// Report no contacts for this body. Default: false.
    pub disable_collision: bool,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            mass: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
            friction: 0.5,
            restitution: 0.0,
            gravity: None,
            collision_filter_group: 1,
            collision_filter_mask: 1,
            activation_state: ActivationState::Active,
            emit_collision_events: false,
            track_velocities: false,
            disable_collision: false,
        }
    }
}

impl BodyOptions {
    /// Dynamic body with the given mass.
    #[must_use]
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Kinematic body.
    #[must_use]
    pub fn kinematic() -> Self {
        Self {
            kind: BodyKind::Kinematic,
            mass: 0.0,
            ..Default::default()
        }
    }

    /// Static body.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            mass: 0.0,
            ..Default::default()
        }
    }

    /// Enables velocity read-back.
    #[must_use]
    pub fn with_velocity_tracking(mut self) -> Self {
        self.track_velocities = true;
        self
    }

    /// Enables collision events.
    #[must_use]
    pub fn with_collision_events(mut self) -> Self {
        self.emit_collision_events = true;
        self
    }

    /// Returns true when two bodies' filters accept each other.
    #[must_use]
    pub fn collides_with(&self, other: &Self) -> bool {
        !self.disable_collision
            && !other.disable_collision
            && (self.collision_filter_group & other.collision_filter_mask) != 0
            && (other.collision_filter_group & self.collision_filter_mask) != 0
    }
}

/// Geometry of a shape, relative to its body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Box with half extents.
    Box {
        /// Half size on each axis.
        half_extents: Vec3,
    },
    /// Sphere.
    Sphere {
        /// Radius.
        radius: f32,
    },
    /// Y-aligned cylinder.
    Cylinder {
        /// Radius.
        radius: f32,
        /// Half of the height.
        half_height: f32,
    },
    /// Y-aligned capsule.
    Capsule {
        /// Radius of the caps.
        radius: f32,
        /// Half of the straight section.
        half_height: f32,
    },
    /// Y-aligned cone.
    Cone {
        /// Base radius.
        radius: f32,
        /// Height.
        height: f32,
    },
    /// Convex hull of the given points.
    Hull {
        /// Hull points.
        points: Vec<Vec3>,
    },
    /// Triangle mesh.
    Mesh {
        /// Vertex positions.
        vertices: Vec<Vec3>,
        /// Triangle indices.
        indices: Vec<u32>,
    },
}

impl Default for ShapeKind {
    fn default() -> Self {
        Self::Box {
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        }
    }
}

impl ShapeKind {
    /// Radius of a sphere around the shape origin that contains the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Box { half_extents } => half_extents.length(),
            Self::Sphere { radius } => *radius,
            Self::Cylinder { radius, half_height } => {
                (radius * radius + half_height * half_height).sqrt()
            }
            Self::Capsule { radius, half_height } => radius + half_height,
            Self::Cone { radius, height } => (radius * radius + height * height).sqrt(),
            Self::Hull { points } => points.iter().map(|p| p.length()).fold(0.0, f32::max),
            Self::Mesh { vertices, .. } => {
                vertices.iter().map(|p| p.length()).fold(0.0, f32::max)
            }
        }
    }
}

/// Creation options for a shape attached to a body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeOptions {
    /// Geometry. Default: unit box.
    pub shape: ShapeKind,
    /// Offset from the body origin. Default: zero.
    pub offset: Vec3,
    /// Orientation relative to the body. Default: identity.
    pub orientation: Quaternion,
    /// Collision margin. Default: 0.01.
    pub margin: f32,
}

impl ShapeOptions {
    /// Shape with the given geometry and default placement.
    #[must_use]
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            offset: Vec3::ZERO,
            orientation: Quaternion::IDENTITY,
            margin: 0.01,
        }
    }

    /// Sphere shape.
    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self::new(ShapeKind::Sphere { radius })
    }

    /// Box shape.
    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::new(ShapeKind::Box { half_extents })
    }

    /// Places the shape away from the body origin.
    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Radius around the body origin that contains this shape.
    #[must_use]
    pub fn reach(&self) -> f32 {
        self.offset.length() + self.shape.bounding_radius() + self.margin
    }
}

/// Kind of a constraint between two bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Locks all relative motion.
    Lock,
    /// Fixed at the current relative pose.
    Fixed,
    /// Generic spring.
    Spring,
    /// Slides along one axis.
    Slider,
    /// Rotates around one axis.
    Hinge {
        /// Pivot in the source body frame.
        pivot: Vec3,
        /// Axis in the source body frame.
        axis: Vec3,
        /// Pivot in the target body frame.
        target_pivot: Vec3,
        /// Axis in the target body frame.
        target_axis: Vec3,
    },
    /// Cone-twist joint.
    ConeTwist {
        /// Pivot in the source body frame.
        pivot: Vec3,
        /// Pivot in the target body frame.
        target_pivot: Vec3,
    },
    /// Ball socket.
    PointToPoint {
        /// Pivot in the source body frame.
        pivot: Vec3,
        /// Pivot in the target body frame.
        target_pivot: Vec3,
    },
}

/// Creation options for a constraint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintOptions {
    /// Constraint kind. Default: lock.
    pub kind: ConstraintKind,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            kind: ConstraintKind::Lock,
        }
    }
}
