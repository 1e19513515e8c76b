// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-only API for inspecting a device tree node.

use core::fmt::{self, Display, Formatter};

use super::property::FdtPropIter;
use super::{FDT_TAGSIZE, Fdt, FdtProperty, FdtToken};
use crate::error::FdtParseError;
use crate::standard::AddressSpaceProperties;

/// The position of a node in a blob.
///
/// This is a plain cursor: it stays valid only until the blob it came from is
/// modified. Look the node up again after every mutation instead of keeping
/// offsets around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeOffset(pub(crate) usize);

impl NodeOffset {
    /// Returns the byte offset of the node's `FDT_BEGIN_NODE` token.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

/// A node in a flattened device tree.
#[derive(Debug, Clone, Copy)]
pub struct FdtNode<'a> {
    pub(crate) fdt: Fdt<'a>,
    pub(crate) offset: usize,
    /// The `#address-cells` and `#size-cells` properties of this node's parent
    /// node.
    pub(crate) parent_address_space: AddressSpaceProperties,
}

impl<'a> FdtNode<'a> {
    pub(crate) fn new(fdt: Fdt<'a>, offset: usize) -> Self {
        Self {
            fdt,
            offset,
            parent_address_space: AddressSpaceProperties::default(),
        }
    }

    /// Returns the position of this node in the blob.
    #[must_use]
    pub fn offset(&self) -> NodeOffset {
        NodeOffset(self.offset)
    }

    /// Returns the `#address-cells` and `#size-cells` of this node's parent,
    /// which describe how to decode this node's `reg` property.
    #[must_use]
    pub fn parent_address_space(&self) -> AddressSpaceProperties {
        self.parent_address_space
    }

    /// Returns the name of this node, including its unit address if any.
    ///
    /// The root node has an empty name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name isn't a valid NUL-terminated UTF-8 string.
    pub fn name(&self) -> Result<&'a str, FdtParseError> {
        self.fdt.string_at_offset(self.offset + FDT_TAGSIZE)
    }

    /// Returns the name of this node without its unit address.
    ///
    /// # Errors
    ///
    /// Returns an error if the name can't be read.
    pub fn name_without_address(&self) -> Result<&'a str, FdtParseError> {
        let name = self.name()?;
        Ok(name.split_once('@').map_or(name, |(base, _)| base))
    }

    /// Returns an iterator over the properties of this node.
    pub fn properties(
        &self,
    ) -> impl Iterator<Item = Result<FdtProperty<'a>, FdtParseError>> + use<'a> {
        FdtPropIter::Start {
            fdt: self.fdt,
            offset: self.offset,
        }
    }

    /// Returns the property with the given name, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a property's name or value cannot be read.
    pub fn property(&self, name: &str) -> Result<Option<FdtProperty<'a>>, FdtParseError> {
        for property in self.properties() {
            let property = property?;
            if property.name() == name {
                return Ok(Some(property));
            }
        }
        Ok(None)
    }

    /// Returns an iterator over the children of this node.
    pub fn children(&self) -> impl Iterator<Item = Result<FdtNode<'a>, FdtParseError>> + use<'a> {
        FdtChildIter::Start { node: *self }
    }

    /// Returns the child with the given name.
    ///
    /// If `name` has no unit address, a child whose name only differs by its
    /// unit address matches as well.
    ///
    /// # Errors
    ///
    /// Returns an error if a child node's name cannot be read.
    pub fn child(&self, name: &str) -> Result<Option<FdtNode<'a>>, FdtParseError> {
        let match_base = !name.contains('@');
        for child in self.children() {
            let child = child?;
            if child.name()? == name || (match_base && child.name_without_address()? == name) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    pub(crate) fn fmt_recursive(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        let name = self.name().map_err(|_| fmt::Error)?;
        if name.is_empty() {
            writeln!(f, "{:indent$}/ {{", "", indent = indent)?;
        } else {
            writeln!(f, "{:indent$}{} {{", "", name, indent = indent)?;
        }

        let mut has_properties = false;
        for prop in self.properties() {
            has_properties = true;
            prop.map_err(|_| fmt::Error)?.fmt_indented(f, indent + 4)?;
        }

        let mut first_child = true;
        for child in self.children() {
            if !first_child || has_properties {
                writeln!(f)?;
            }

            first_child = false;
            child.map_err(|_| fmt::Error)?.fmt_recursive(f, indent + 4)?;
        }

        writeln!(f, "{:indent$}}};", "", indent = indent)
    }
}

impl Display for FdtNode<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.fmt_recursive(f, 0)
    }
}

/// An iterator over the children of a device tree node.
enum FdtChildIter<'a> {
    Start {
        node: FdtNode<'a>,
    },
    Running {
        fdt: Fdt<'a>,
        offset: usize,
        address_space: AddressSpaceProperties,
    },
    Done,
}

impl<'a> Iterator for FdtChildIter<'a> {
    type Item = Result<FdtNode<'a>, FdtParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self {
                Self::Start { node } => {
                    let node = *node;
                    let start = node.address_space().and_then(|address_space| {
                        Ok((node.fdt.node_contents_offset(node.offset)?, address_space))
                    });
                    match start {
                        Ok((offset, address_space)) => {
                            *self = Self::Running {
                                fdt: node.fdt,
                                offset,
                                address_space,
                            };
                        }
                        Err(e) => {
                            *self = Self::Done;
                            return Some(Err(e));
                        }
                    }
                }
                Self::Running {
                    fdt,
                    offset,
                    address_space,
                } => {
                    let result = Self::try_next(*fdt, offset, *address_space);
                    return match result {
                        Ok(Some(node)) => Some(Ok(node)),
                        Ok(None) => {
                            *self = Self::Done;
                            None
                        }
                        Err(e) => {
                            *self = Self::Done;
                            Some(Err(e))
                        }
                    };
                }
                Self::Done => return None,
            }
        }
    }
}

impl<'a> FdtChildIter<'a> {
    fn try_next(
        fdt: Fdt<'a>,
        offset: &mut usize,
        parent_address_space: AddressSpaceProperties,
    ) -> Result<Option<FdtNode<'a>>, FdtParseError> {
        loop {
            match fdt.read_token(*offset)? {
                FdtToken::BeginNode => {
                    let node_offset = *offset;
                    *offset = fdt.next_sibling_offset(node_offset)?;
                    return Ok(Some(FdtNode {
                        fdt,
                        offset: node_offset,
                        parent_address_space,
                    }));
                }
                FdtToken::Prop => *offset = fdt.next_property_offset(*offset)?,
                FdtToken::Nop => *offset += FDT_TAGSIZE,
                FdtToken::EndNode | FdtToken::End => return Ok(None),
            }
        }
    }
}
