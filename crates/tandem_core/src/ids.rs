//! # Identity Types
//!
//! Two kinds of identifiers cross the context boundary:
//! - Handles: issued by the control context, monotonically increasing, never reused
//! - Slots: issued by the simulation context, dense, reused after removal
//!
//! Handle `0` is a perfectly valid handle. Liveness is always tracked with
//! `Option`, never with a reserved numeric value.

use std::fmt;
use std::marker::PhantomData;

use tandem_shared::NO_COLLISION;

/// Dense index into the transfer buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Slot(u32);

impl Slot {
    /// Creates a slot from its index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the index as `usize` for buffer addressing.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decodes a collision entry. Negative values are the "no collision" sentinel.
    #[inline]
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }

    /// Encodes the slot as a collision entry.
    #[inline]
    #[must_use]
    pub fn to_wire(self) -> i32 {
        i32::try_from(self.0).unwrap_or(NO_COLLISION)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Common behaviour of the externally issued handle types.
pub trait Handle: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Wraps a raw counter value.
    fn from_raw(raw: u64) -> Self;
    /// Returns the raw counter value.
    fn raw(self) -> u64;
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw handle value.
            #[inline]
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw handle value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl Handle for $name {
            #[inline]
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            #[inline]
            fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " {}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Stable identifier of a rigid body.
    BodyHandle,
    "body"
);

define_handle!(
    /// Stable identifier of a shape set attached to a body.
    ShapeHandle,
    "shape"
);

define_handle!(
    /// Stable identifier of a constraint between two bodies.
    ConstraintHandle,
    "constraint"
);

/// Monotonic handle counter for one entity category.
///
/// Handles are never reused, so a stale handle can never alias a new object.
#[derive(Debug)]
pub struct HandleAllocator<H: Handle> {
    next: u64,
    _marker: PhantomData<H>,
}

impl<H: Handle> HandleAllocator<H> {
    /// Creates a counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: 0,
            _marker: PhantomData,
        }
    }

    /// Issues the next handle.
    ///
    /// # Panics
    ///
    /// Panics if the 64-bit counter is exhausted.
    pub fn allocate(&mut self) -> H {
        let handle = H::from_raw(self.next);
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("handle counter exhausted"));
        handle
    }

    /// Number of handles issued so far.
    #[inline]
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.next
    }

    /// Returns true if this allocator has ever issued `handle`.
    #[inline]
    #[must_use]
    pub fn was_issued(&self, handle: H) -> bool {
        handle.raw() < self.next
    }
}

impl<H: Handle> Default for HandleAllocator<H> {
    fn default() -> Self {
        Self::new()
    }
}
