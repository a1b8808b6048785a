//! Baton-pass ownership of the transfer buffer.

use std::time::Duration;

use crate::buffer::TransferBuffer;
use crate::error::{HandoffError, HandoffResult};

/// Holds the transfer buffer while this context owns it.
///
/// Replaces the atomic index swap of a shared double buffer with a plain
/// move: `hand_off` gives the buffer away, `swap_in` takes the next one.
#[derive(Debug)]
pub struct BufferBaton {
    /// The buffer, when owned.
    buffer: Option<TransferBuffer>,
    /// Capacity every received buffer must have.
    capacity: usize,
    /// Completed receive cycles.
    round_trips: u64,
    /// Step duration reported with the last received buffer.
    last_step_duration: Duration,
}

impl BufferBaton {
    /// Creates a baton holding `buffer`.
    #[must_use]
    pub fn new(buffer: TransferBuffer) -> Self {
        Self {
            capacity: buffer.capacity(),
            buffer: Some(buffer),
            round_trips: 0,
            last_step_duration: Duration::ZERO,
        }
    }

    /// Creates a baton that does not own a buffer yet.
    ///
    /// Used on the simulation side, which receives the first buffer with INIT.
    #[must_use]
    pub fn empty(capacity: usize) -> Self {
        Self {
            buffer: None,
            capacity,
            round_trips: 0,
            last_step_duration: Duration::ZERO,
        }
    }

    /// Returns true while this context may touch the buffer.
    #[inline]
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.buffer.is_some()
    }

    /// Slot capacity every buffer passing through must have.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers received so far.
    #[inline]
    #[must_use]
    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    /// Step duration that came with the most recent buffer.
    #[inline]
    #[must_use]
    pub fn last_step_duration(&self) -> Duration {
        self.last_step_duration
    }

    /// Shared access to the owned buffer.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::NotOwned`] while the buffer is away.
    pub fn get(&self) -> HandoffResult<&TransferBuffer> {
        self.buffer.as_ref().ok_or(HandoffError::NotOwned)
    }

    /// Exclusive access to the owned buffer.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::NotOwned`] while the buffer is away.
    pub fn get_mut(&mut self) -> HandoffResult<&mut TransferBuffer> {
        self.buffer.as_mut().ok_or(HandoffError::NotOwned)
    }

    /// Gives the buffer away. Ownership is lost until the next `swap_in`.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::NotOwned`] if there is nothing to hand off.
    pub fn hand_off(&mut self) -> HandoffResult<TransferBuffer> {
        self.buffer.take().ok_or(HandoffError::NotOwned)
    }

    /// Installs a buffer received from the other context.
    ///
    /// On error the received buffer is returned to the caller untouched
    /// together with the reason, and the baton state does not change.
    ///
    /// # Errors
    ///
    /// - [`HandoffError::AlreadyOwned`] if a buffer is already held
    /// - [`HandoffError::CapacityMismatch`] if the buffer has the wrong size
    pub fn swap_in(
        &mut self,
        buffer: TransferBuffer,
        step_duration: Duration,
    ) -> Result<(), (HandoffError, TransferBuffer)> {
        if self.buffer.is_some() {
            return Err((HandoffError::AlreadyOwned, buffer));
        }
        if buffer.capacity() != self.capacity {
            let err = HandoffError::CapacityMismatch {
                expected: self.capacity,
                actual: buffer.capacity(),
            };
            return Err((err, buffer));
        }

        self.buffer = Some(buffer);
        self.round_trips += 1;
        self.last_step_duration = step_duration;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Slot;
    use tandem_shared::Mat4;

    #[test]
    fn test_hand_off_releases_ownership() {
        let mut baton = BufferBaton::new(TransferBuffer::new(4));
        assert!(baton.is_owned());

        let buffer = baton.hand_off().unwrap();
        assert_eq!(buffer.capacity(), 4);
        assert!(!baton.is_owned());
        assert_eq!(baton.get().unwrap_err(), HandoffError::NotOwned);
        assert_eq!(baton.get_mut().unwrap_err(), HandoffError::NotOwned);
        assert_eq!(baton.hand_off().unwrap_err(), HandoffError::NotOwned);
    }

    #[test]
    fn test_ownership_alternates() {
        let mut baton = BufferBaton::new(TransferBuffer::new(2));

        for trip in 1..=3u64 {
            let mut buffer = baton.hand_off().unwrap();
            assert!(!baton.is_owned());

            // Other side writes while it holds the buffer
            buffer.set_transform(Slot::new(1), Mat4::from_translation(tandem_shared::Vec3::X));

            baton
                .swap_in(buffer, Duration::from_millis(trip))
                .map_err(|(e, _)| e)
                .unwrap();
            assert!(baton.is_owned());
            assert_eq!(baton.round_trips(), trip);
            assert_eq!(baton.last_step_duration(), Duration::from_millis(trip));
        }

        let translation = baton.get().unwrap().transform(Slot::new(1)).translation();
        assert_eq!(translation, tandem_shared::Vec3::X);
    }

    #[test]
    fn test_swap_in_while_owned_is_rejected() {
        let mut baton = BufferBaton::new(TransferBuffer::new(2));
        let (err, returned) = baton
            .swap_in(TransferBuffer::new(2), Duration::ZERO)
            .unwrap_err();

        assert_eq!(err, HandoffError::AlreadyOwned);
        assert_eq!(returned.capacity(), 2);
        assert_eq!(baton.round_trips(), 0);
    }

    #[test]
    fn test_swap_in_wrong_capacity_is_rejected() {
        let mut baton = BufferBaton::empty(8);
        let (err, _) = baton
            .swap_in(TransferBuffer::new(4), Duration::ZERO)
            .unwrap_err();

        assert_eq!(
            err,
            HandoffError::CapacityMismatch {
                expected: 8,
                actual: 4
            }
        );
        assert!(!baton.is_owned());
    }
}
