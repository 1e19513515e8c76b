// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Standard nodes and properties.

mod reg;
mod status;

pub use self::reg::Reg;
pub use self::status::Status;
use crate::error::{FdtError, FdtParseError};
use crate::fdt::FdtNode;

/// Value of `#address-cells` when the property is absent.
pub const DEFAULT_ADDRESS_CELLS: u32 = 2;
/// Value of `#size-cells` when the property is absent.
pub const DEFAULT_SIZE_CELLS: u32 = 1;

impl<'a> FdtNode<'a> {
    /// Returns the value of the standard `compatible` property.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read.
    pub fn compatible(
        &self,
    ) -> Result<Option<impl Iterator<Item = &'a str> + use<'a>>, FdtParseError> {
        Ok(self
            .property("compatible")?
            .map(|property| property.as_str_list()))
    }

    /// Returns whether this node has a `compatible` property containing the
    /// given string.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read.
    pub fn is_compatible(&self, compatible_filter: &str) -> Result<bool, FdtParseError> {
        Ok(if let Some(mut compatible) = self.compatible()? {
            compatible.any(|c| c == compatible_filter)
        } else {
            false
        })
    }

    /// Returns the value of the standard `phandle` property.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read, or the
    /// value isn't a valid u32.
    pub fn phandle(&self) -> Result<Option<u32>, FdtParseError> {
        self.property("phandle")?
            .map(|property| property.as_u32())
            .transpose()
    }

    /// Returns the value of the standard `status` property.
    ///
    /// If there is no `status` property then `okay` is assumed.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read, or the
    /// value isn't a valid status.
    pub fn status(&self) -> Result<Status, FdtError> {
        Ok(if let Some(status) = self.property("status")? {
            status.as_str()?.parse()?
        } else {
            Status::Okay
        })
    }

    /// Returns the value of the standard `#address-cells` property.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read, or the
    /// value isn't a valid u32.
    pub fn address_cells(&self) -> Result<u32, FdtParseError> {
        Ok(if let Some(property) = self.property("#address-cells")? {
            property.as_u32()?
        } else {
            DEFAULT_ADDRESS_CELLS
        })
    }

    /// Returns the value of the standard `#size-cells` property.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read, or the
    /// value isn't a valid u32.
    pub fn size_cells(&self) -> Result<u32, FdtParseError> {
        Ok(if let Some(property) = self.property("#size-cells")? {
            property.as_u32()?
        } else {
            DEFAULT_SIZE_CELLS
        })
    }

    /// Returns the address space this node defines for its children.
    ///
    /// # Errors
    ///
    /// Returns an error if `#address-cells` or `#size-cells` cannot be read.
    pub fn address_space(&self) -> Result<AddressSpaceProperties, FdtParseError> {
        Ok(AddressSpaceProperties {
            address_cells: self.address_cells()?,
            size_cells: self.size_cells()?,
        })
    }

    /// Returns the value of the standard `reg` property.
    ///
    /// # Errors
    ///
    /// Returns an error if the size of the value isn't a multiple of the
    /// expected number of address and size cells.
    pub fn reg(&self) -> Result<Option<impl Iterator<Item = Reg<'a>> + use<'a>>, FdtParseError> {
        let address_cells = self.parent_address_space.address_cells as usize;
        let size_cells = self.parent_address_space.size_cells as usize;
        if let Some(property) = self.property("reg")? {
            Ok(Some(
                property
                    .as_prop_encoded_array([address_cells, size_cells])?
                    .map(Reg::from_cells),
            ))
        } else {
            Ok(None)
        }
    }

    /// Returns the first entry of the standard `reg` property.
    ///
    /// Unlike [`FdtNode::reg`], trailing data after the first entry is
    /// ignored. Returns `None` if the property is absent or too short to hold
    /// a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the property can't be read.
    pub fn first_reg(&self) -> Result<Option<Reg<'a>>, FdtParseError> {
        let Some(property) = self.property("reg")? else {
            return Ok(None);
        };
        let cells = property.as_cells_prefix();
        Ok(Reg::first(cells, self.parent_address_space))
    }
}

/// The `#address-cells` and `#size-cells` properties of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpaceProperties {
    /// The `#address-cells` property.
    pub address_cells: u32,
    /// The `#size-cells` property.
    pub size_cells: u32,
}

impl Default for AddressSpaceProperties {
    fn default() -> Self {
        Self {
            address_cells: DEFAULT_ADDRESS_CELLS,
            size_cells: DEFAULT_SIZE_CELLS,
        }
    }
}
