// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::string::{String, ToString};

use super::{DeviceTreeProperty, NameMap};
use crate::error::FdtParseError;
use crate::fdt::FdtNode;

/// A mutable, in-memory representation of a device tree node.
///
/// Properties and children keep the order in which they were added, which is
/// also the order in which they are serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTreeNode {
    name: String,
    properties: NameMap<DeviceTreeProperty>,
    children: NameMap<DeviceTreeNode>,
}

impl DeviceTreeNode {
    /// Creates a new `DeviceTreeNode` with the given name and no properties
    /// or children.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtfixup::model::DeviceTreeNode;
    ///
    /// let node = DeviceTreeNode::new("uart@10000000");
    /// assert_eq!(node.name(), "uart@10000000");
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: NameMap::default(),
            children: NameMap::default(),
        }
    }

    /// Starts building a node with the given name.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtfixup::model::{DeviceTreeNode, DeviceTreeProperty};
    ///
    /// let cpus = DeviceTreeNode::builder("cpus")
    ///     .property(DeviceTreeProperty::u32("#address-cells", 1))
    ///     .child(DeviceTreeNode::new("cpu@0"))
    ///     .build();
    /// assert!(cpus.child("cpu@0").is_some());
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DeviceTreeNodeBuilder {
        DeviceTreeNodeBuilder {
            node: Self::new(name),
        }
    }

    /// Returns the name of this node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns an iterator over the properties of this node.
    pub fn properties(&self) -> impl Iterator<Item = &DeviceTreeProperty> {
        self.properties.values()
    }

    /// Returns the property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&DeviceTreeProperty> {
        self.properties.get(name)
    }

    /// Returns a mutable reference to the property with the given name.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut DeviceTreeProperty> {
        self.properties.get_mut(name)
    }

    /// Adds a property, replacing any existing property with the same name
    /// but keeping its position.
    pub fn add_property(&mut self, property: DeviceTreeProperty) {
        self.properties
            .insert(property.name().to_string(), property);
    }

    /// Removes the property with the given name and returns it.
    pub fn remove_property(&mut self, name: &str) -> Option<DeviceTreeProperty> {
        self.properties.shift_remove(name)
    }

    /// Returns an iterator over the children of this node.
    pub fn children(&self) -> impl Iterator<Item = &DeviceTreeNode> {
        self.children.values()
    }

    /// Returns the child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DeviceTreeNode> {
        self.children.get(name)
    }

    /// Returns a mutable reference to the child with the given name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut DeviceTreeNode> {
        self.children.get_mut(name)
    }

    /// Adds a child node, replacing any existing child with the same name but
    /// keeping its position.
    pub fn add_child(&mut self, child: DeviceTreeNode) {
        self.children.insert(child.name.clone(), child);
    }

    /// Removes the child with the given name and returns it.
    pub fn remove_child(&mut self, name: &str) -> Option<DeviceTreeNode> {
        self.children.shift_remove(name)
    }
}

impl<'a> TryFrom<FdtNode<'a>> for DeviceTreeNode {
    type Error = FdtParseError;

    fn try_from(node: FdtNode<'a>) -> Result<Self, Self::Error> {
        let mut result = DeviceTreeNode::new(node.name()?);
        for property in node.properties() {
            result.add_property(DeviceTreeProperty::from(property?));
        }
        for child in node.children() {
            result.add_child(DeviceTreeNode::try_from(child?)?);
        }
        Ok(result)
    }
}

/// A builder for [`DeviceTreeNode`], created by [`DeviceTreeNode::builder`].
#[derive(Debug, Clone)]
pub struct DeviceTreeNodeBuilder {
    node: DeviceTreeNode,
}

impl DeviceTreeNodeBuilder {
    /// Adds a property to the node.
    #[must_use]
    pub fn property(mut self, property: DeviceTreeProperty) -> Self {
        self.node.add_property(property);
        self
    }

    /// Adds a child to the node.
    #[must_use]
    pub fn child(mut self, child: DeviceTreeNode) -> Self {
        self.node.add_child(child);
        self
    }

    /// Returns the built node.
    #[must_use]
    pub fn build(self) -> DeviceTreeNode {
        self.node
    }
}
