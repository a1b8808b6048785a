//! Fixed-capacity transfer buffer with typed per-field accessors.

use tandem_shared::{Mat4, BODY_DATA_SIZE};

use super::TransferRecord;
use crate::error::{BufferError, BufferResult};
use crate::ids::Slot;

/// The record array exchanged between the two contexts.
///
/// Allocated once for the session's slot capacity and moved, never resized.
/// Any access to a slot at or beyond capacity is a fatal configuration error
/// and panics.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferBuffer {
    records: Box<[TransferRecord]>,
}

impl TransferBuffer {
    /// Allocates a buffer of `capacity` empty records.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or not representable as a collision entry.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            i32::try_from(capacity).is_ok(),
            "Capacity {capacity} exceeds the collision entry range"
        );
        Self {
            records: vec![TransferRecord::EMPTY; capacity].into_boxed_slice(),
        }
    }

    /// Rebuilds a buffer from its word view.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::MalformedLength`] if `words` is empty or not a
    /// multiple of the record stride.
    pub fn from_words(words: &[u32]) -> BufferResult<Self> {
        let malformed = BufferError::MalformedLength {
            words: words.len(),
            stride: BODY_DATA_SIZE,
        };
        if words.is_empty() || words.len() % BODY_DATA_SIZE != 0 {
            return Err(malformed);
        }
        let records: &[TransferRecord] =
            bytemuck::try_cast_slice(words).map_err(|_| malformed)?;
        Ok(Self {
            records: records.to_vec().into_boxed_slice(),
        })
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Raw word view: `slot * BODY_DATA_SIZE + field_offset` addresses a field.
    #[inline]
    #[must_use]
    pub fn as_words(&self) -> &[u32] {
        bytemuck::cast_slice(&self.records)
    }

    /// Single word at `field_offset` within `slot`.
    #[must_use]
    pub fn word(&self, slot: Slot, field_offset: usize) -> u32 {
        assert!(field_offset < BODY_DATA_SIZE, "field offset {field_offset} out of record");
        self.as_words()[self.checked(slot) * BODY_DATA_SIZE + field_offset]
    }

    /// Record for `slot`.
    #[inline]
    #[must_use]
    pub fn record(&self, slot: Slot) -> &TransferRecord {
        &self.records[self.checked(slot)]
    }

    /// Mutable record for `slot`.
    #[inline]
    pub fn record_mut(&mut self, slot: Slot) -> &mut TransferRecord {
        let index = self.checked(slot);
        &mut self.records[index]
    }

    /// Transform of `slot`.
    #[inline]
    #[must_use]
    pub fn transform(&self, slot: Slot) -> Mat4 {
        self.record(slot).transform
    }

    /// Writes the transform of `slot`.
    #[inline]
    pub fn set_transform(&mut self, slot: Slot, transform: Mat4) {
        self.record_mut(slot).transform = transform;
    }

    /// Linear velocity magnitude of `slot`.
    #[inline]
    #[must_use]
    pub fn linear_velocity(&self, slot: Slot) -> f32 {
        self.record(slot).linear_velocity
    }

    /// Angular velocity magnitude of `slot`.
    #[inline]
    #[must_use]
    pub fn angular_velocity(&self, slot: Slot) -> f32 {
        self.record(slot).angular_velocity
    }

    /// Writes both velocity magnitudes of `slot`.
    #[inline]
    pub fn set_velocities(&mut self, slot: Slot, linear: f32, angular: f32) {
        let record = self.record_mut(slot);
        record.linear_velocity = linear;
        record.angular_velocity = angular;
    }

    /// Collision partners of `slot`, up to the first sentinel.
    pub fn collisions(&self, slot: Slot) -> impl Iterator<Item = Slot> + '_ {
        self.record(slot).partners()
    }

    /// Writes the collision partners of `slot`. Returns how many fit.
    pub fn set_collisions(&mut self, slot: Slot, partners: &[Slot]) -> usize {
        self.record_mut(slot).set_partners(partners)
    }

    /// Resets `slot` to the empty record.
    pub fn clear_slot(&mut self, slot: Slot) {
        *self.record_mut(slot) = TransferRecord::EMPTY;
    }

    #[inline]
    fn checked(&self, slot: Slot) -> usize {
        let index = slot.index();
        assert!(
            index < self.records.len(),
            "{slot} exceeds transfer buffer capacity {}",
            self.records.len()
        );
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tandem_shared::{
        Quaternion, Vec3, ANGULAR_VELOCITY_OFFSET, COLLISIONS_OFFSET, LINEAR_VELOCITY_OFFSET,
        MATRIX_OFFSET, MAX_COLLISIONS_PER_BODY, NO_COLLISION,
    };

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = TransferBuffer::new(4);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.as_words().len(), 4 * BODY_DATA_SIZE);
        assert_eq!(buffer.collisions(Slot::new(3)).count(), 0);
    }

    #[test]
    fn test_word_view_addresses_fields() {
        let mut buffer = TransferBuffer::new(4);
        let slot = Slot::new(2);
        let m = Mat4::compose(Vec3::new(1.0, 2.0, 3.0), Quaternion::IDENTITY, Vec3::ONE);

        buffer.set_transform(slot, m);
        buffer.set_velocities(slot, 1.5, -0.25);
        buffer.set_collisions(slot, &[Slot::new(1)]);

        assert_eq!(buffer.word(slot, MATRIX_OFFSET + 12), 1.0f32.to_bits());
        assert_eq!(buffer.word(slot, MATRIX_OFFSET + 14), 3.0f32.to_bits());
        assert_eq!(buffer.word(slot, LINEAR_VELOCITY_OFFSET), 1.5f32.to_bits());
        assert_eq!(buffer.word(slot, ANGULAR_VELOCITY_OFFSET), (-0.25f32).to_bits());
        assert_eq!(buffer.word(slot, COLLISIONS_OFFSET), 1);
        assert_eq!(
            buffer.word(slot, COLLISIONS_OFFSET + 1),
            u32::from_ne_bytes(NO_COLLISION.to_ne_bytes())
        );

        let words = buffer.as_words();
        let base = 2 * BODY_DATA_SIZE;
        assert_eq!(words[base + 13], 2.0f32.to_bits());
    }

    #[test]
    fn test_from_words_roundtrip() {
        let mut buffer = TransferBuffer::new(3);
        buffer.set_velocities(Slot::new(1), 4.0, 5.0);

        let copy = TransferBuffer::from_words(buffer.as_words()).unwrap();
        assert_eq!(copy, buffer);
    }

    #[test]
    fn test_from_words_rejects_malformed_length() {
        let words = vec![0u32; BODY_DATA_SIZE + 3];
        assert_eq!(
            TransferBuffer::from_words(&words),
            Err(BufferError::MalformedLength {
                words: BODY_DATA_SIZE + 3,
                stride: BODY_DATA_SIZE
            })
        );
        assert!(TransferBuffer::from_words(&[]).is_err());
    }

    #[test]
    fn test_clear_slot() {
        let mut buffer = TransferBuffer::new(2);
        buffer.set_collisions(Slot::new(0), &[Slot::new(1)]);
        buffer.clear_slot(Slot::new(0));
        assert_eq!(*buffer.record(Slot::new(0)), TransferRecord::EMPTY);
    }

    #[test]
    #[should_panic(expected = "exceeds transfer buffer capacity")]
    fn test_write_beyond_capacity_panics() {
        let mut buffer = TransferBuffer::new(2);
        buffer.set_transform(Slot::new(2), Mat4::IDENTITY);
    }

    proptest! {
        #[test]
        fn prop_collision_scan_is_bounded(entries in prop::array::uniform8(-3i32..40)) {
            let mut buffer = TransferBuffer::new(1);
            buffer.record_mut(Slot::new(0)).collisions = entries;

            let scanned: Vec<Slot> = buffer.collisions(Slot::new(0)).collect();
            prop_assert!(scanned.len() <= MAX_COLLISIONS_PER_BODY);

            let expected = entries.iter().take_while(|&&e| e >= 0).count();
            prop_assert_eq!(scanned.len(), expected);
            for (slot, &entry) in scanned.iter().zip(entries.iter()) {
                prop_assert_eq!(slot.to_wire(), entry);
            }
        }
    }
}
