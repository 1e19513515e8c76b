// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Encoding and decoding of address and size cells.
//!
//! The number of 32-bit cells that make up an address or a size is given by
//! the `#address-cells` and `#size-cells` properties of the parent node, so it
//! is only known at runtime. Cells are stored big-endian, most significant
//! cell first. Every address or size read from or written to a tree by this
//! crate goes through this module.

use core::fmt::{self, Display, Formatter};
use core::ops::{BitOr, Shl};

use zerocopy::{FromBytes, big_endian};

use crate::error::{FdtErrorKind, FdtParseError};

/// The size of a single cell in bytes.
pub const CELL_SIZE: usize = size_of::<u32>();

/// The largest `#address-cells` or `#size-cells` value accepted when
/// writing addresses and sizes.
pub const MAX_CELLS: u32 = 4;

/// A borrowed run of cells holding a single address or size.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Cells<'a>(pub &'a [big_endian::U32]);

impl Cells<'_> {
    /// Returns the number of cells.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no cells at all.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value as a `u64`.
    ///
    /// With more than two cells only the two least significant ones are kept;
    /// with no cells the value is zero.
    #[must_use]
    pub fn to_u64(self) -> u64 {
        self.0
            .iter()
            .fold(0, |value, cell| (value << 32) | u64::from(cell.get()))
    }

    /// Attempts to return the value as the given type, if it will fit.
    ///
    /// # Errors
    ///
    /// Returns [`FdtErrorKind::InvalidPropertyLength`] if there are more cells
    /// than `T` can hold.
    pub fn to_int<T: Default + From<u32> + Shl<usize, Output = T> + BitOr<Output = T>>(
        self,
    ) -> Result<T, FdtParseError> {
        if size_of::<T>() < self.0.len() * CELL_SIZE {
            return Err(FdtParseError::new(FdtErrorKind::InvalidPropertyLength, 0));
        }
        if let [cell] = self.0 {
            return Ok(cell.get().into());
        }
        let mut value = T::default();
        for cell in self.0 {
            value = (value << 32) | cell.get().into();
        }
        Ok(value)
    }
}

impl Display for Cells<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("0x")?;
        for cell in self.0 {
            write!(f, "{:08x}", cell.get())?;
        }
        Ok(())
    }
}

/// Decodes `cells` big-endian cells from the start of `bytes`.
///
/// Only whole cells that are present in `bytes` are used, so a short input
/// decodes to a smaller value rather than failing.
///
/// # Examples
///
/// ```
/// use dtfixup::cells;
///
/// let bytes = [0x00, 0x00, 0x00, 0x01, 0x80, 0x00, 0x00, 0x00];
/// assert_eq!(cells::decode(&bytes, 1), 0x1);
/// assert_eq!(cells::decode(&bytes, 2), 0x1_8000_0000);
/// assert_eq!(cells::decode(&bytes, 0), 0);
/// ```
#[must_use]
pub fn decode(bytes: &[u8], cells: usize) -> u64 {
    let count = cells.min(bytes.len() / CELL_SIZE);
    match <[big_endian::U32]>::ref_from_prefix_with_elems(bytes, count) {
        Ok((words, _)) => Cells(words).to_u64(),
        Err(_) => 0,
    }
}

/// Encodes `value` as `cells` big-endian cells, most significant first.
///
/// One cell keeps the low 32 bits of `value`. Cells beyond the second are
/// zero.
///
/// # Examples
///
/// ```
/// use dtfixup::cells;
///
/// let encoded: Vec<u32> = cells::encode(0x1_8000_0000, 2).map(|c| c.get()).collect();
/// assert_eq!(encoded, [0x1, 0x8000_0000]);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    reason = "each cell holds the low 32 bits of the shifted value"
)]
pub fn encode(value: u64, cells: usize) -> impl Iterator<Item = big_endian::U32> {
    (0..cells).rev().map(move |index| {
        let cell = value.checked_shr((index * 32) as u32).unwrap_or(0);
        big_endian::U32::new(cell as u32)
    })
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use zerocopy::IntoBytes;

    use super::*;

    fn round_trip(value: u64, cells: usize) -> u64 {
        let encoded: Vec<big_endian::U32> = encode(value, cells).collect();
        assert_eq!(encoded.len(), cells);
        decode(encoded.as_bytes(), cells)
    }

    #[test]
    fn round_trip_one_cell() {
        for value in [0, 1, 0x8000_0000, 0xffff_ffff] {
            assert_eq!(round_trip(value, 1), value);
        }
    }

    #[test]
    fn round_trip_two_cells() {
        for value in [0, 0xffff_ffff, 0x1_0000_0000, 0x1234_5678_9abc_def0, u64::MAX] {
            assert_eq!(round_trip(value, 2), value);
        }
    }

    #[test]
    fn one_cell_truncates() {
        assert_eq!(round_trip(0x1_2345_6789, 1), 0x2345_6789);
    }

    #[test]
    fn zero_cells() {
        assert_eq!(encode(0x1234, 0).count(), 0);
        assert_eq!(decode(&[0x12, 0x34, 0x56, 0x78], 0), 0);
    }

    #[test]
    fn three_cells_zero_extend() {
        let encoded: Vec<u32> = encode(0x1_0000_0002, 3).map(|c| c.get()).collect();
        assert_eq!(encoded, [0, 1, 2]);
        let bytes = [0, 0, 0, 7, 0, 0, 0, 1, 0, 0, 0, 2];
        assert_eq!(decode(&bytes, 3), 0x1_0000_0002);
    }

    #[test]
    fn short_input() {
        assert_eq!(decode(&[0, 0, 0, 5, 0xff], 2), 5);
        assert_eq!(decode(&[0xff, 0xff], 1), 0);
    }

    #[test]
    fn cells_to_int() {
        let words: [big_endian::U32; 2] = [0x1234_5678.into(), 0xabcd_0000.into()];
        let cells = Cells(&words);
        assert_eq!(cells.to_int::<u64>(), Ok(0x1234_5678_abcd_0000));
        assert_eq!(
            cells.to_int::<u32>().map_err(|e| e.kind),
            Err(FdtErrorKind::InvalidPropertyLength)
        );
        assert_eq!(cells.to_string(), "0x12345678abcd0000");
    }
}
