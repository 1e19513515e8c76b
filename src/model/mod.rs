// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-write, in-memory representation of a device tree.
//!
//! This module provides the [`DeviceTree`], [`DeviceTreeNode`], and
//! [`DeviceTreeProperty`] structs, which can be used to build a device tree
//! from scratch, or to unflatten a blob for inspection. A [`DeviceTree`] is
//! serialized with [`DeviceTree::to_dtb`], and the result can be handed to
//! [`FdtBlob`](crate::blob::FdtBlob) for fixing up.

mod node;
mod property;
mod writer;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};
use core::hash::BuildHasherDefault;

use indexmap::IndexMap;
use twox_hash::XxHash64;

pub use self::node::{DeviceTreeNode, DeviceTreeNodeBuilder};
pub use self::property::DeviceTreeProperty;
use crate::error::FdtError;
use crate::fdt::Fdt;
use crate::memreserve::MemoryReservation;

/// An insertion-ordered map keyed by node or property name.
type NameMap<V> = IndexMap<String, V, BuildHasherDefault<XxHash64>>;

/// A mutable, in-memory representation of a device tree.
///
/// # Examples
///
/// ```
/// # use dtfixup::model::{DeviceTree, DeviceTreeNode};
/// let mut tree = DeviceTree::new();
/// tree.root.add_child(DeviceTreeNode::new("chosen"));
/// let chosen = tree.find_node_mut("/chosen").unwrap();
/// assert_eq!(chosen.name(), "chosen");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct DeviceTree {
    /// The root node for this device tree.
    pub root: DeviceTreeNode,
    /// The memory reservations for this device tree.
    pub memory_reservations: Vec<MemoryReservation>,
    /// The physical ID of the boot CPU.
    pub boot_cpuid_phys: u32,
}

impl DeviceTree {
    /// Creates a new `DeviceTree` with an empty root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: DeviceTreeNode::new(""),
            memory_reservations: Vec::new(),
            boot_cpuid_phys: 0,
        }
    }

    /// Creates a new `DeviceTree` from a `Fdt`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtfixup::{fdt::Fdt, model::DeviceTree};
    /// let dtb = DeviceTree::new().to_dtb();
    /// let fdt = Fdt::new(&dtb).unwrap();
    /// let tree = DeviceTree::from_fdt(&fdt).unwrap();
    /// assert_eq!(tree, DeviceTree::new());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the tree or the memory reservation block cannot be
    /// parsed.
    pub fn from_fdt(fdt: &Fdt<'_>) -> Result<Self, FdtError> {
        let root = DeviceTreeNode::try_from(fdt.root()?)?;
        let memory_reservations: Result<Vec<_>, _> = fdt.memory_reservations().collect();
        Ok(DeviceTree {
            root,
            memory_reservations: memory_reservations?,
            boot_cpuid_phys: fdt.boot_cpuid_phys(),
        })
    }

    /// Serializes this tree into a packed FDT blob with no free space.
    #[must_use]
    pub fn to_dtb(&self) -> Vec<u8> {
        writer::to_bytes(self)
    }

    /// Finds a node by its absolute path.
    #[must_use]
    pub fn find_node(&self, path: &str) -> Option<&DeviceTreeNode> {
        if !path.starts_with('/') {
            return None;
        }
        let mut current_node = &self.root;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            current_node = current_node.child(component)?;
        }
        Some(current_node)
    }

    /// Finds a node by its absolute path and returns a mutable reference to
    /// it.
    ///
    /// # Performance
    ///
    /// Child lookup is a constant-time operation, so this is linear in the
    /// number of path segments.
    pub fn find_node_mut(&mut self, path: &str) -> Option<&mut DeviceTreeNode> {
        if !path.starts_with('/') {
            return None;
        }
        let mut current_node = &mut self.root;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            current_node = current_node.child_mut(component)?;
        }
        Some(current_node)
    }
}

impl Default for DeviceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DeviceTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Fdt::new(&self.to_dtb())
            .expect("DeviceTree::to_dtb() should always generate a valid FDT")
            .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn find_nodes() {
        let mut tree = DeviceTree::new();
        tree.root.add_child(
            DeviceTreeNode::builder("cpus")
                .child(DeviceTreeNode::new("cpu@0"))
                .build(),
        );
        assert_eq!(tree.find_node("/").unwrap().name(), "");
        assert_eq!(tree.find_node("/cpus/cpu@0").unwrap().name(), "cpu@0");
        assert!(tree.find_node("/cpus/cpu@1").is_none());
        assert!(tree.find_node("cpus").is_none());
        tree.find_node_mut("/cpus/cpu@0")
            .unwrap()
            .add_property(DeviceTreeProperty::string("status", "okay"));
        assert!(
            tree.find_node("/cpus/cpu@0")
                .unwrap()
                .property("status")
                .is_some()
        );
    }

    #[test]
    fn display() {
        let mut tree = DeviceTree::new();
        tree.memory_reservations
            .push(MemoryReservation::new(0x8000_0000, 0x1000));
        tree.root
            .add_property(DeviceTreeProperty::u32("#address-cells", 2));
        tree.root.add_child(
            DeviceTreeNode::builder("chosen")
                .property(DeviceTreeProperty::string("stdout-path", "serial0"))
                .build(),
        );
        assert_eq!(
            tree.to_string(),
            "/dts-v1/;\n\n/memreserve/ 0x80000000 0x1000;\n\n/ {\n    #address-cells = <0x02>;\n\n    chosen {\n        stdout-path = \"serial0\";\n    };\n};\n"
        );
    }
}
