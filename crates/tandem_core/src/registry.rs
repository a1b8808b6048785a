//! # Slot Registry
//!
//! Bidirectional mapping between body handles and transfer buffer slots.
//!
//! ```text
//!   by_handle (BTreeMap)            by_slot (dense Vec)
//!   ┌────────┬──────┐              ┌──────┬──────────┐
//!   │ body 5 │ slot 5│◄────────────►│ slot 3│ body 7  │
//!   │ body 7 │ slot 3│              │ slot 5│ body 5  │
//!   └────────┴──────┘              └──────┴──────────┘
//! ```
//!
//! Every mutation touches both sides, so the mapping is a bijection over the
//! live bodies at every point observable from the owning context.

use std::collections::BTreeMap;

use crate::error::{RegistryError, RegistryResult};
use crate::ids::{BodyHandle, Slot};

/// Handle ↔ slot bijection restricted to live bodies.
#[derive(Debug)]
pub struct SlotRegistry {
    /// Handle → slot, iterated in ascending handle order.
    by_handle: BTreeMap<BodyHandle, Slot>,
    /// Slot → handle, one entry per buffer slot.
    by_slot: Vec<Option<BodyHandle>>,
}

impl SlotRegistry {
    /// Creates an empty registry for `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            by_handle: BTreeMap::new(),
            by_slot: vec![None; capacity],
        }
    }

    /// Slot capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.by_slot.len()
    }

    /// Number of bound handles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Returns true if nothing is bound.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Records the slot the simulation assigned to `handle`.
    ///
    /// A rejected bind leaves the registry untouched.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateBinding`] if the handle is already bound
    /// - [`RegistryError::SlotOccupied`] if another handle owns the slot
    /// - [`RegistryError::SlotOutOfRange`] if the slot exceeds capacity
    pub fn bind(&mut self, handle: BodyHandle, slot: Slot) -> RegistryResult<()> {
        let capacity = self.capacity();
        let Some(entry) = self.by_slot.get(slot.index()) else {
            return Err(RegistryError::SlotOutOfRange { slot, capacity });
        };

        if let Some(&existing) = self.by_handle.get(&handle) {
            return Err(RegistryError::DuplicateBinding {
                handle,
                existing,
                requested: slot,
            });
        }

        if let Some(owner) = *entry {
            return Err(RegistryError::SlotOccupied { slot, owner });
        }

        self.by_slot[slot.index()] = Some(handle);
        self.by_handle.insert(handle, slot);
        Ok(())
    }

    /// Removes a binding. No-op for a handle that was never bound.
    pub fn unbind(&mut self, handle: BodyHandle) -> Option<Slot> {
        let slot = self.by_handle.remove(&handle)?;
        self.by_slot[slot.index()] = None;
        Some(slot)
    }

    /// Slot owned by `handle`.
    #[inline]
    #[must_use]
    pub fn resolve_slot(&self, handle: BodyHandle) -> Option<Slot> {
        self.by_handle.get(&handle).copied()
    }

    /// Handle owning `slot`. Out-of-range slots resolve to `None`.
    #[inline]
    #[must_use]
    pub fn resolve_handle(&self, slot: Slot) -> Option<BodyHandle> {
        self.by_slot.get(slot.index()).copied().flatten()
    }

    /// Returns true if `handle` owns a slot.
    #[inline]
    #[must_use]
    pub fn is_bound(&self, handle: BodyHandle) -> bool {
        self.by_handle.contains_key(&handle)
    }

    /// Live bindings in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, Slot)> + '_ {
        self.by_handle.iter().map(|(&h, &s)| (h, s))
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.by_handle.clear();
        for entry in &mut self.by_slot {
            *entry = None;
        }
    }
}
