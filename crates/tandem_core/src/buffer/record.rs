//! One slot of the transfer buffer.

use bytemuck::{Pod, Zeroable};
use tandem_shared::{Mat4, BODY_DATA_SIZE, MAX_COLLISIONS_PER_BODY, NO_COLLISION};

use crate::ids::Slot;

/// Per-slot record: transform, velocity magnitudes, collision partners.
///
/// Size: `BODY_DATA_SIZE` words (104 bytes), no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TransferRecord {
    /// World transform, column-major.
    pub transform: Mat4,
    /// Linear velocity magnitude.
    pub linear_velocity: f32,
    /// Angular velocity magnitude.
    pub angular_velocity: f32,
    /// Partner slots, sentinel-terminated.
    pub collisions: [i32; MAX_COLLISIONS_PER_BODY],
}

const _: () = assert!(std::mem::size_of::<TransferRecord>() == BODY_DATA_SIZE * 4);

impl TransferRecord {
    /// Identity transform, zero velocity, no collisions.
    pub const EMPTY: Self = Self {
        transform: Mat4::IDENTITY,
        linear_velocity: 0.0,
        angular_velocity: 0.0,
        collisions: [NO_COLLISION; MAX_COLLISIONS_PER_BODY],
    };

    /// Partner slots up to the first sentinel.
    ///
    /// Bounded by the field length, so the scan always halts.
    pub fn partners(&self) -> impl Iterator<Item = Slot> + '_ {
        self.collisions
            .iter()
            .map_while(|&entry| Slot::from_wire(entry))
    }

    /// Number of meaningful collision entries.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.partners().count()
    }

    /// Writes partner slots and pads the rest with the sentinel.
    ///
    /// Returns how many partners fit.
    pub fn set_partners(&mut self, partners: &[Slot]) -> usize {
        let written = partners.len().min(MAX_COLLISIONS_PER_BODY);
        for (i, entry) in self.collisions.iter_mut().enumerate() {
            *entry = if i < written {
                partners[i].to_wire()
            } else {
                NO_COLLISION
            };
        }
        written
    }
}

impl Default for TransferRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}
