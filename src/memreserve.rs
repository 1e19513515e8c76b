// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Entries of the memory reservation block.
//!
//! These are the `/memreserve/` entries of a device tree. They are copied
//! verbatim whenever a blob is repacked. Firmware regions hidden from the
//! operating system are described with `/reserved-memory` nodes instead, see
//! [`crate::fixup::reserved_memory_fixup`].

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, big_endian};

/// A 64-bit memory reservation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    FromBytes,
    IntoBytes,
    Immutable,
    KnownLayout,
)]
#[repr(C)]
pub struct MemoryReservation {
    address: big_endian::U64,
    size: big_endian::U64,
}

impl MemoryReservation {
    /// The all-zero entry that ends the reservation block.
    pub(crate) const TERMINATOR: Self = Self::new(0, 0);

    /// Creates a new [`MemoryReservation`].
    #[must_use]
    pub const fn new(address: u64, size: u64) -> Self {
        Self {
            address: big_endian::U64::new(address),
            size: big_endian::U64::new(size),
        }
    }

    /// Returns the physical address of the reserved memory region.
    #[must_use]
    pub const fn address(&self) -> u64 {
        self.address.get()
    }

    /// Returns the size of the reserved memory region.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size.get()
    }
}
