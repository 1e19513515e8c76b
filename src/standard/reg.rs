// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use core::fmt::{self, Display, Formatter};
use core::ops::{BitOr, Shl};

use zerocopy::big_endian;

use super::AddressSpaceProperties;
use crate::cells::Cells;
use crate::error::FdtParseError;

/// The value of a `reg` property.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Reg<'a> {
    /// The address of the device within the address space of the parent bus.
    pub address: Cells<'a>,
    /// The size of the device within the address space of the parent bus.
    pub size: Cells<'a>,
}

impl<'a> Reg<'a> {
    pub(crate) fn from_cells([address, size]: [Cells<'a>; 2]) -> Self {
        Self { address, size }
    }

    /// Splits the first entry off `cells`, or returns `None` if there are
    /// fewer cells than one entry needs.
    pub(crate) fn first(
        cells: &'a [big_endian::U32],
        address_space: AddressSpaceProperties,
    ) -> Option<Self> {
        let address_cells = address_space.address_cells as usize;
        let size_cells = address_space.size_cells as usize;
        let (address, rest) = cells.split_at_checked(address_cells)?;
        let (size, _) = rest.split_at_checked(size_cells)?;
        Some(Self {
            address: Cells(address),
            size: Cells(size),
        })
    }

    /// Attempts to return the address as the given type, if it will fit.
    ///
    /// # Errors
    ///
    /// Returns an error if the address doesn't fit in `T`.
    pub fn address<T: Default + From<u32> + Shl<usize, Output = T> + BitOr<Output = T>>(
        self,
    ) -> Result<T, FdtParseError> {
        self.address.to_int()
    }

    /// Attempts to return the size as the given type, if it will fit.
    ///
    /// # Errors
    ///
    /// Returns an error if the size doesn't fit in `T`.
    pub fn size<T: Default + From<u32> + Shl<usize, Output = T> + BitOr<Output = T>>(
        self,
    ) -> Result<T, FdtParseError> {
        self.size.to_int()
    }
}

impl Display for Reg<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {}", self.address, self.size)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    const CELLS: [big_endian::U32; 3] = [
        big_endian::U32::new(0x1234_5678),
        big_endian::U32::new(0xabcd_0000),
        big_endian::U32::new(0x1122_3344),
    ];

    #[test]
    fn format_reg() {
        let reg = Reg::from_cells([Cells(&CELLS[..2]), Cells(&CELLS[2..])]);
        assert_eq!(format!("{reg}"), "0x12345678abcd0000 0x11223344");
    }

    #[test]
    fn address_size() {
        let reg = Reg::from_cells([Cells(&CELLS[..2]), Cells(&CELLS[2..])]);
        assert!(reg.address::<u32>().is_err());
        assert_eq!(reg.address::<u64>(), Ok(0x1234_5678_abcd_0000));
        assert_eq!(reg.size::<u32>(), Ok(0x1122_3344));
        assert_eq!(reg.size::<u64>(), Ok(0x1122_3344));
    }

    #[test]
    fn first_entry() {
        let space = AddressSpaceProperties {
            address_cells: 1,
            size_cells: 1,
        };
        let reg = Reg::first(&CELLS, space).unwrap();
        assert_eq!(reg.address.to_u64(), 0x1234_5678);
        assert_eq!(reg.size.to_u64(), 0xabcd_0000);

        let space = AddressSpaceProperties {
            address_cells: 2,
            size_cells: 2,
        };
        assert_eq!(Reg::first(&CELLS, space), None);
    }
}
