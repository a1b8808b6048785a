//! Free-list slot allocator.

use crate::ids::Slot;

/// Hands out dense transfer-buffer slots, lowest index first, reusing
/// released slots.
///
/// # Thread Safety
///
/// Not thread-safe. Owned by the simulation context only.
///
/// # Example
///
/// ```rust,ignore
/// let mut slots = SlotAllocator::new(10_000);
///
/// let slot = slots.allocate()?;   // O(1)
/// slots.release(slot);            // O(1)
/// ```
#[derive(Debug)]
pub struct SlotAllocator {
    /// Occupancy per slot.
    in_use: Box<[bool]>,
    /// Free slot indices, popped from the back.
    free_list: Vec<u32>,
}

impl SlotAllocator {
    /// Creates an allocator with every slot free.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds the slot index range.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        let top = u32::try_from(capacity)
            .unwrap_or_else(|_| panic!("Capacity {capacity} exceeds the slot index range"));

        Self {
            in_use: vec![false; capacity].into_boxed_slice(),
            // Reversed so that pop() yields slot 0 first
            free_list: (0..top).rev().collect(),
        }
    }

    /// Total number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    /// Number of slots currently handed out.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.capacity() - self.free_list.len()
    }

    /// Number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Takes a free slot, or `None` when exhausted.
    pub fn allocate(&mut self) -> Option<Slot> {
        let index = self.free_list.pop()?;
        self.in_use[index as usize] = true;
        Some(Slot::new(index))
    }

    /// Returns a slot to the free list. Returns false for a slot that was
    /// not allocated.
    pub fn release(&mut self, slot: Slot) -> bool {
        match self.in_use.get_mut(slot.index()) {
            Some(used) if *used => {
                *used = false;
                self.free_list.push(slot.raw());
                true
            }
            _ => false,
        }
    }

    /// Returns true if `slot` is currently allocated.
    #[inline]
    #[must_use]
    pub fn is_allocated(&self, slot: Slot) -> bool {
        self.in_use.get(slot.index()).copied().unwrap_or(false)
    }

    /// Frees every slot without releasing memory.
    pub fn clear(&mut self) {
        self.in_use.fill(false);
        self.free_list.clear();
        self.free_list.extend((0..self.in_use.len() as u32).rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_release() {
        let mut slots = SlotAllocator::new(4);

        let a = slots.allocate().unwrap();
        let b = slots.allocate().unwrap();
        assert_eq!(a, Slot::new(0));
        assert_eq!(b, Slot::new(1));
        assert_eq!(slots.allocated_count(), 2);

        assert!(slots.release(a));
        assert!(!slots.is_allocated(a));
        assert_eq!(slots.free_count(), 3);
    }

    #[test]
    fn test_released_slot_is_reused() {
        let mut slots = SlotAllocator::new(4);
        let a = slots.allocate().unwrap();
        let _b = slots.allocate().unwrap();

        slots.release(a);
        assert_eq!(slots.allocate(), Some(a));
    }

    #[test]
    fn test_exhaustion() {
        let mut slots = SlotAllocator::new(2);
        assert!(slots.allocate().is_some());
        assert!(slots.allocate().is_some());
        assert!(slots.allocate().is_none());
    }

    #[test]
    fn test_double_release_is_rejected() {
        let mut slots = SlotAllocator::new(2);
        let a = slots.allocate().unwrap();

        assert!(slots.release(a));
        assert!(!slots.release(a));
        assert!(!slots.release(Slot::new(99)));
        assert_eq!(slots.free_count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut slots = SlotAllocator::new(3);
        slots.allocate();
        slots.allocate();
        slots.clear();

        assert_eq!(slots.free_count(), 3);
        assert_eq!(slots.allocate(), Some(Slot::new(0)));
    }
}
