//! # Scene Object Boundary
//!
//! The sync loop only needs local pose access and world transform
//! resolution from the scene graph. Anything implementing [`SceneObject`]
//! can back a body; [`SceneNode`] is a minimal implementation with an
//! optional parent link.

use std::sync::Arc;

use parking_lot::RwLock;
use tandem_shared::{Mat4, Quaternion, Vec3};

/// Scene object shared between the scene graph and the physics world.
pub type SceneRef = Arc<RwLock<dyn SceneObject>>;

/// Spatial interface of a scene graph object.
pub trait SceneObject: Send + Sync {
    /// Position relative to the parent.
    fn position(&self) -> Vec3;

    /// Sets the position relative to the parent.
    fn set_position(&mut self, position: Vec3);

    /// Orientation relative to the parent.
    fn rotation(&self) -> Quaternion;

    /// Sets the orientation relative to the parent.
    fn set_rotation(&mut self, rotation: Quaternion);

    /// Scale relative to the parent.
    fn scale(&self) -> Vec3;

    /// Current world transform of the parent, identity for roots.
    fn parent_world_transform(&self) -> Mat4;

    /// Recomputes the world transform from the parent chain and local pose.
    fn update_world_transform(&mut self);

    /// World transform as of the last `update_world_transform`.
    fn world_transform(&self) -> Mat4;

    /// Local transform composed from position, rotation and scale.
    fn local_transform(&self) -> Mat4 {
        Mat4::compose(self.position(), self.rotation(), self.scale())
    }
}

/// Plain scene node: local pose, optional parent, cached world transform.
pub struct SceneNode {
    position: Vec3,
    rotation: Quaternion,
    scale: Vec3,
    parent: Option<SceneRef>,
    world: Mat4,
}

impl SceneNode {
    /// Root node at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
            world: Mat4::IDENTITY,
        }
    }

    /// Sets the local position.
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.world = self.parent_world_transform() * self.local_transform();
        self
    }

    /// Sets the local orientation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self.world = self.parent_world_transform() * self.local_transform();
        self
    }

    /// Sets the local scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self.world = self.parent_world_transform() * self.local_transform();
        self
    }

    /// Attaches the node under `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: SceneRef) -> Self {
        self.parent = Some(parent);
        self.world = self.parent_world_transform() * self.local_transform();
        self
    }

    /// Wraps the node for sharing with a physics world.
    #[must_use]
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObject for SceneNode {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rotation(&self) -> Quaternion {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn parent_world_transform(&self) -> Mat4 {
        match &self.parent {
            Some(parent) => {
                let mut parent = parent.write();
                parent.update_world_transform();
                parent.world_transform()
            }
            None => Mat4::IDENTITY,
        }
    }

    fn update_world_transform(&mut self) {
        self.world = self.parent_world_transform() * self.local_transform();
    }

    fn world_transform(&self) -> Mat4 {
        self.world
    }
}
