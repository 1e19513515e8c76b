// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::string::String;
use alloc::vec::Vec;

use crate::fdt::FdtProperty;

/// A mutable, in-memory representation of a device tree property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTreeProperty {
    name: String,
    value: Vec<u8>,
}

impl DeviceTreeProperty {
    /// Creates a new `DeviceTreeProperty` with the given name and value.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtfixup::model::DeviceTreeProperty;
    ///
    /// let prop = DeviceTreeProperty::new("my-prop", vec![1, 2, 3, 4]);
    /// assert_eq!(prop.name(), "my-prop");
    /// assert_eq!(prop.value(), &[1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a property without a value, such as `no-map` or `ranges`.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Creates a property holding a single big-endian `u32`.
    #[must_use]
    pub fn u32(name: impl Into<String>, value: u32) -> Self {
        Self::new(name, value.to_be_bytes())
    }

    /// Creates a property holding a list of big-endian cells.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtfixup::model::DeviceTreeProperty;
    ///
    /// let reg = DeviceTreeProperty::cells("reg", &[0x1000_0000, 0x100]);
    /// assert_eq!(reg.value(), &[0x10, 0, 0, 0, 0, 0, 0x01, 0]);
    /// ```
    #[must_use]
    pub fn cells(name: impl Into<String>, cells: &[u32]) -> Self {
        Self::new(
            name,
            cells
                .iter()
                .flat_map(|cell| cell.to_be_bytes())
                .collect::<Vec<u8>>(),
        )
    }

    /// Creates a property holding a NUL-terminated string.
    #[must_use]
    pub fn string(name: impl Into<String>, value: &str) -> Self {
        Self::string_list(name, &[value])
    }

    /// Creates a property holding a list of NUL-terminated strings, such as
    /// `compatible`.
    #[must_use]
    pub fn string_list(name: impl Into<String>, values: &[&str]) -> Self {
        let mut value = Vec::new();
        for s in values {
            value.extend_from_slice(s.as_bytes());
            value.push(0);
        }
        Self::new(name, value)
    }

    /// Returns the name of this property.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of this property.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Sets the value of this property.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtfixup::model::DeviceTreeProperty;
    ///
    /// let mut prop = DeviceTreeProperty::new("my-prop", vec![1, 2, 3, 4]);
    /// prop.set_value(vec![5, 6, 7, 8]);
    /// assert_eq!(prop.value(), &[5, 6, 7, 8]);
    /// ```
    pub fn set_value(&mut self, value: impl Into<Vec<u8>>) {
        self.value = value.into();
    }
}

impl<'a> From<FdtProperty<'a>> for DeviceTreeProperty {
    fn from(prop: FdtProperty<'a>) -> Self {
        Self::new(prop.name(), prop.value())
    }
}
