//! Debug draw mode flags understood by the simulation engine.

use serde::{Deserialize, Serialize};

/// Bit set selecting which debug geometry the simulation emits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebugDrawMode(pub u32);

impl DebugDrawMode {
    /// Nothing is drawn.
    pub const NO_DEBUG: Self = Self(0);
    /// Shape wireframes.
    pub const DRAW_WIREFRAME: Self = Self(1);
    /// Bounding boxes.
    pub const DRAW_AABB: Self = Self(1 << 1);
    /// Contact points.
    pub const DRAW_CONTACT_POINTS: Self = Self(1 << 3);
    /// Keep bodies awake.
    pub const NO_DEACTIVATION: Self = Self(1 << 4);
    /// Constraint frames.
    pub const DRAW_CONSTRAINTS: Self = Self(1 << 11);
    /// Constraint limits.
    pub const DRAW_CONSTRAINT_LIMITS: Self = Self(1 << 12);
    /// Cheap wireframes.
    pub const FAST_WIREFRAME: Self = Self(1 << 13);
    /// Surface normals.
    pub const DRAW_NORMALS: Self = Self(1 << 14);

    /// Returns true if every bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if nothing is drawn.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for DebugDrawMode {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
