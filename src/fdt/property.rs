// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-only API for inspecting a device tree property.

use core::fmt::{self, Display, Formatter};
use core::ops::Range;

use zerocopy::{FromBytes, big_endian};

use super::{FDT_TAGSIZE, Fdt, FdtToken};
use crate::cells::{CELL_SIZE, Cells};
use crate::error::{FdtErrorKind, FdtParseError};

/// A property of a device tree node.
#[derive(Debug, PartialEq)]
pub struct FdtProperty<'a> {
    name: &'a str,
    value: &'a [u8],
    value_offset: usize,
}

impl<'a> FdtProperty<'a> {
    /// Returns the name of this property.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the raw value of this property.
    #[must_use]
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Returns the range of the blob holding this property's value.
    pub(crate) fn value_range(&self) -> Range<usize> {
        self.value_offset..self.value_offset + self.value.len()
    }

    fn length_error(&self) -> FdtParseError {
        FdtParseError::new(FdtErrorKind::InvalidPropertyLength, self.value_offset)
    }

    /// Returns the value as a single big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`FdtErrorKind::InvalidPropertyLength`] if the value isn't
    /// exactly 4 bytes long.
    pub fn as_u32(&self) -> Result<u32, FdtParseError> {
        big_endian::U32::read_from_bytes(self.value)
            .map(big_endian::U32::get)
            .map_err(|_| self.length_error())
    }

    /// Returns the value as a single big-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`FdtErrorKind::InvalidPropertyLength`] if the value isn't
    /// exactly 8 bytes long.
    pub fn as_u64(&self) -> Result<u64, FdtParseError> {
        big_endian::U64::read_from_bytes(self.value)
            .map(big_endian::U64::get)
            .map_err(|_| self.length_error())
    }

    /// Returns the value as a NUL-terminated string.
    ///
    /// # Errors
    ///
    /// Returns [`FdtErrorKind::InvalidString`] if the value isn't a
    /// NUL-terminated UTF-8 string.
    pub fn as_str(&self) -> Result<&'a str, FdtParseError> {
        let invalid = || FdtParseError::new(FdtErrorKind::InvalidString, self.value_offset);
        let bytes = self.value.strip_suffix(&[0]).ok_or_else(invalid)?;
        if bytes.contains(&0) {
            return Err(invalid());
        }
        core::str::from_utf8(bytes).map_err(|_| invalid())
    }

    /// Returns an iterator over the NUL-separated strings of a string list
    /// value, such as `compatible`.
    ///
    /// Strings that aren't valid UTF-8 are skipped.
    pub fn as_str_list(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        let value = self.value.strip_suffix(&[0]).unwrap_or(self.value);
        (!self.value.is_empty())
            .then_some(value)
            .into_iter()
            .flat_map(|value| value.split(|&byte| byte == 0))
            .filter_map(|s| core::str::from_utf8(s).ok())
    }

    /// Returns the value as a slice of big-endian cells.
    ///
    /// # Errors
    ///
    /// Returns [`FdtErrorKind::InvalidPropertyLength`] if the length of the
    /// value isn't a multiple of 4 bytes.
    pub fn as_cells(&self) -> Result<&'a [big_endian::U32], FdtParseError> {
        <[big_endian::U32]>::ref_from_bytes(self.value).map_err(|_| self.length_error())
    }

    /// Splits the value into chunks of `N` fields, each field made of the
    /// given number of cells.
    ///
    /// # Errors
    ///
    /// Returns [`FdtErrorKind::InvalidPropertyLength`] if the value isn't a
    /// whole number of chunks.
    pub fn as_prop_encoded_array<const N: usize>(
        &self,
        fields_cells: [usize; N],
    ) -> Result<impl Iterator<Item = [Cells<'a>; N]> + use<'a, N>, FdtParseError> {
        let chunk_cells: usize = fields_cells.iter().sum();
        let cells = self.as_cells()?;
        if chunk_cells == 0 || cells.len() % chunk_cells != 0 {
            return Err(self.length_error());
        }
        Ok(cells.chunks_exact(chunk_cells).map(move |mut chunk| {
            fields_cells.map(|count| {
                let (field, rest) = chunk.split_at(count);
                chunk = rest;
                Cells(field)
            })
        }))
    }

    pub(crate) fn fmt_indented(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.name, indent = indent)?;

        if self.value.is_empty() {
            return writeln!(f, ";");
        }

        let is_printable = self
            .value
            .iter()
            .all(|&ch| ch.is_ascii_graphic() || ch == b' ' || ch == 0);
        let has_empty = self.value.windows(2).any(|window| window == [0, 0]);
        if is_printable && self.value.ends_with(&[0]) && !has_empty && self.value[0] != 0 {
            let mut strings = self.as_str_list();
            if let Some(first) = strings.next() {
                write!(f, " = \"{first}\"")?;
                for s in strings {
                    write!(f, ", \"{s}\"")?;
                }
                return writeln!(f, ";");
            }
        }

        if let Ok(cells) = self.as_cells() {
            write!(f, " = <")?;
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "0x{:02x}", cell.get())?;
            }
            writeln!(f, ">;")
        } else {
            write!(f, " = [")?;
            for (i, byte) in self.value.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{byte:02x}")?;
            }
            writeln!(f, "];")
        }
    }
}

impl Display for FdtProperty<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// An iterator over the properties of a device tree node.
pub(crate) enum FdtPropIter<'a> {
    Start { fdt: Fdt<'a>, offset: usize },
    Running { fdt: Fdt<'a>, offset: usize },
    Done,
}

impl<'a> Iterator for FdtPropIter<'a> {
    type Item = Result<FdtProperty<'a>, FdtParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (fdt, offset) = match *self {
            Self::Start { fdt, offset } => match fdt.node_contents_offset(offset) {
                Ok(offset) => (fdt, offset),
                Err(e) => {
                    *self = Self::Done;
                    return Some(Err(e));
                }
            },
            Self::Running { fdt, offset } => (fdt, offset),
            Self::Done => return None,
        };
        match Self::next_prop(fdt, offset) {
            Ok(Some((property, next_offset))) => {
                *self = Self::Running {
                    fdt,
                    offset: next_offset,
                };
                Some(Ok(property))
            }
            Ok(None) => {
                *self = Self::Done;
                None
            }
            Err(e) => {
                *self = Self::Done;
                Some(Err(e))
            }
        }
    }
}

impl<'a> FdtPropIter<'a> {
    fn next_prop(
        fdt: Fdt<'a>,
        mut offset: usize,
    ) -> Result<Option<(FdtProperty<'a>, usize)>, FdtParseError> {
        loop {
            match fdt.read_token(offset)? {
                FdtToken::Prop => {
                    let property = FdtProperty::read(fdt, offset)?;
                    return Ok(Some((property, fdt.next_property_offset(offset)?)));
                }
                FdtToken::Nop => offset += FDT_TAGSIZE,
                _ => return Ok(None),
            }
        }
    }
}

impl<'a> FdtProperty<'a> {
    /// Reads the property whose `FDT_PROP` tag is at `offset`.
    pub(crate) fn read(fdt: Fdt<'a>, offset: usize) -> Result<Self, FdtParseError> {
        let len = fdt.read_u32(offset + FDT_TAGSIZE)? as usize;
        let nameoff = fdt.read_u32(offset + 2 * FDT_TAGSIZE)? as usize;
        let value_offset = offset + 3 * FDT_TAGSIZE;
        let value = fdt
            .data
            .get(value_offset..value_offset + len)
            .ok_or_else(|| FdtParseError::new(FdtErrorKind::InvalidOffset, value_offset))?;
        Ok(Self {
            name: fdt.string(nameoff)?,
            value,
            value_offset,
        })
    }

    /// Returns the whole cells at the start of the value, ignoring any
    /// trailing bytes.
    pub(crate) fn as_cells_prefix(&self) -> &'a [big_endian::U32] {
        <[big_endian::U32]>::ref_from_prefix_with_elems(self.value, self.value.len() / CELL_SIZE)
            .map_or(&[], |(cells, _)| cells)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use super::*;

    fn property<'a>(name: &'a str, value: &'a [u8]) -> FdtProperty<'a> {
        FdtProperty {
            name,
            value,
            value_offset: 0,
        }
    }

    #[test]
    fn str_list() {
        let prop = property("compatible", b"sifive,plic-1.0.0\0riscv,plic0\0");
        let list: Vec<_> = prop.as_str_list().collect();
        assert_eq!(list, ["sifive,plic-1.0.0", "riscv,plic0"]);
        assert!(prop.as_str().is_err());
        assert_eq!(property("empty", b"").as_str_list().count(), 0);
    }

    #[test]
    fn scalar_values() {
        let prop = property("clock-frequency", &[0x00, 0x38, 0x40, 0x00]);
        assert_eq!(prop.as_u32(), Ok(3_686_400));
        assert_eq!(
            prop.as_u64().map_err(|e| e.kind),
            Err(FdtErrorKind::InvalidPropertyLength)
        );
        assert_eq!(property("status", b"okay\0").as_str(), Ok("okay"));
    }

    #[test]
    fn prop_encoded_array() {
        let value = [0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6];
        let prop = property("reg", &value);
        let entries: Vec<_> = prop
            .as_prop_encoded_array([2, 1])
            .unwrap()
            .map(|[address, size]| (address.to_u64(), size.to_u64()))
            .collect();
        assert_eq!(entries, [(0x1_0000_0002, 3), (0x4_0000_0005, 6)]);
        assert!(prop.as_prop_encoded_array([2, 2]).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(property("no-map", b"").to_string(), "no-map;\n");
        assert_eq!(
            property("status", b"disabled\0").to_string(),
            "status = \"disabled\";\n"
        );
        assert_eq!(
            property("reg", &[0, 0, 0x10, 0, 0, 0, 0, 0x10]).to_string(),
            "reg = <0x1000 0x10>;\n"
        );
        assert_eq!(property("odd", &[1, 2, 3]).to_string(), "odd = [01 02 03];\n");
    }
}
