// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An in-place editor for flattened device tree blobs.
//!
//! [`FdtBlob`] owns the serialized tree and edits it without unflattening it:
//! properties are inserted or resized and subnodes are added by shifting the
//! rest of the structure and strings blocks into the free space at the end of
//! the blob. The free space never grows by itself; it has to be made with
//! [`FdtBlob::open_into`] or [`FdtBlob::grow`] first, up to the ceiling given
//! when the blob was created.
//!
//! Nodes are addressed with [`NodeOffset`]s. Any call taking `&mut self` may
//! move nodes around, so offsets must be looked up again after each mutation.

use alloc::vec::Vec;

use log::debug;
use zerocopy::{FromBytes, IntoBytes};

use crate::error::{FdtError, FdtParseError};
use crate::fdt::{
    FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_PROP, FDT_TAGSIZE, Fdt, FdtHeader, FdtNode,
    FdtToken, Layout, NodeOffset,
};
use crate::memreserve::MemoryReservation;

const HEADER_SIZE: usize = size_of::<FdtHeader>();

/// A flattened device tree held in an owned buffer that can be edited in
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdtBlob {
    data: Vec<u8>,
    max_size: usize,
}

enum PropertySlot {
    /// The property exists; `offset` points at its `FDT_PROP` tag.
    Existing { offset: usize, len: usize },
    /// The property doesn't exist and would be inserted at `offset`.
    Missing { offset: usize },
}

impl FdtBlob {
    /// Wraps an existing blob.
    ///
    /// The blob may later grow up to `max_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::Parse`] if the header of `data` is invalid, and
    /// [`FdtError::NoSpace`] if `data` is already bigger than `max_size`.
    pub fn new(data: Vec<u8>, max_size: usize) -> Result<Self, FdtError> {
        Fdt::new(&data)?;
        if data.len() > max_size {
            return Err(FdtError::NoSpace {
                requested: data.len(),
                limit: max_size,
            });
        }
        Ok(Self { data, max_size })
    }

    /// Creates a blob of `size` bytes holding nothing but an empty root node.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::NoSpace`] if `size` is too small for an empty tree
    /// or bigger than `max_size`.
    pub fn create_empty(size: usize, max_size: usize) -> Result<Self, FdtError> {
        let rsvmap_size = size_of::<MemoryReservation>();
        // FDT_BEGIN_NODE, empty name padded to a tag, FDT_END_NODE, FDT_END.
        let struct_size = 4 * FDT_TAGSIZE;
        let layout = Layout {
            off_mem_rsvmap: HEADER_SIZE,
            off_dt_struct: HEADER_SIZE + rsvmap_size,
            size_dt_struct: struct_size,
            off_dt_strings: HEADER_SIZE + rsvmap_size + struct_size,
            size_dt_strings: 0,
            totalsize: size,
        };
        let needed = layout.off_dt_strings;
        if size < needed || size > max_size {
            return Err(FdtError::NoSpace {
                requested: size,
                limit: if size < needed { needed } else { max_size },
            });
        }
        let header = FdtHeader::for_layout(&layout, 0).ok_or(FdtError::NoSpace {
            requested: size,
            limit: u32::MAX as usize,
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| FdtError::NoSpace {
            requested: size,
            limit: 0,
        })?;
        data.extend_from_slice(header.as_bytes());
        data.extend_from_slice(MemoryReservation::TERMINATOR.as_bytes());
        for token in [FDT_BEGIN_NODE, 0, FDT_END_NODE, FDT_END] {
            data.extend_from_slice(&token.to_be_bytes());
        }
        data.resize(size, 0);
        Ok(Self { data, max_size })
    }

    /// Returns a read-only view of the tree.
    #[must_use]
    pub fn fdt(&self) -> Fdt<'_> {
        Fdt { data: &self.data }
    }

    /// Returns the serialized blob.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the editor and returns the serialized blob.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the current size of the blob, which is also the `totalsize`
    /// recorded in its header.
    #[must_use]
    pub fn totalsize(&self) -> usize {
        self.data.len()
    }

    /// Returns the size the blob may never grow past.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the number of unused bytes after the strings block.
    #[must_use]
    pub fn free_space(&self) -> usize {
        self.data.len() - self.strings_end()
    }

    fn layout(&self) -> Layout {
        self.fdt().layout()
    }

    fn strings_end(&self) -> usize {
        let layout = self.layout();
        layout.off_dt_strings + layout.size_dt_strings
    }

    /// Repacks the blob into `new_size` bytes.
    ///
    /// The blocks are laid out back to back in the canonical order (header,
    /// memory reservations, structure, strings) and the rest of the blob is
    /// free space. The blob is left untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::NoSpace`] if `new_size` is smaller than the packed
    /// contents or bigger than the blob's maximum size.
    pub fn open_into(&mut self, new_size: usize) -> Result<(), FdtError> {
        let fdt = self.fdt();
        let old = fdt.layout();
        let rsvmap_size = fdt.memory_reservations_size()?;
        let boot_cpuid_phys = fdt.boot_cpuid_phys();

        let off_dt_struct = HEADER_SIZE + rsvmap_size;
        let off_dt_strings = off_dt_struct + old.size_dt_struct;
        let packed = Layout {
            off_mem_rsvmap: HEADER_SIZE,
            off_dt_struct,
            size_dt_struct: old.size_dt_struct,
            off_dt_strings,
            size_dt_strings: old.size_dt_strings,
            totalsize: new_size,
        };
        let needed = off_dt_strings + old.size_dt_strings;
        if new_size < needed {
            return Err(FdtError::NoSpace {
                requested: new_size,
                limit: needed,
            });
        }
        if new_size > self.max_size {
            return Err(FdtError::NoSpace {
                requested: new_size,
                limit: self.max_size,
            });
        }
        let header = FdtHeader::for_layout(&packed, boot_cpuid_phys).ok_or(FdtError::NoSpace {
            requested: new_size,
            limit: u32::MAX as usize,
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(new_size)
            .map_err(|_| FdtError::NoSpace {
                requested: new_size,
                limit: self.data.len(),
            })?;
        data.extend_from_slice(header.as_bytes());
        data.extend_from_slice(&self.data[old.off_mem_rsvmap..][..rsvmap_size]);
        data.extend_from_slice(&self.data[old.off_dt_struct..][..old.size_dt_struct]);
        data.extend_from_slice(&self.data[old.off_dt_strings..][..old.size_dt_strings]);
        data.resize(new_size, 0);

        debug!("FDT blob resized from {} to {new_size} bytes", self.data.len());
        self.data = data;
        Ok(())
    }

    /// Grows the blob by `extra` bytes of free space.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::NoSpace`] if the blob would exceed its maximum
    /// size.
    pub fn grow(&mut self, extra: usize) -> Result<(), FdtError> {
        self.open_into(self.totalsize().saturating_add(extra))
    }

    /// Returns the offset of the node at the given absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree can't be parsed.
    pub fn node_offset(&self, path: &str) -> Result<Option<NodeOffset>, FdtParseError> {
        Ok(self.fdt().find_node(path)?.map(|node| node.offset()))
    }

    /// Returns the offset of the first node below the root, in depth-first
    /// order, compatible with `compatible`. The root node itself is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree can't be parsed.
    pub fn node_offset_by_compatible(
        &self,
        compatible: &str,
    ) -> Result<Option<NodeOffset>, FdtParseError> {
        Ok(self
            .fdt()
            .find_compatible_descendant(compatible)?
            .map(|node| node.offset()))
    }

    /// Checks that `node` points at a node and returns the offset of its
    /// first property or child.
    fn check_node(&self, node: NodeOffset) -> Result<usize, FdtError> {
        let fdt = self.fdt();
        let layout = fdt.layout();
        let offset = node.0;
        let in_struct = (layout.off_dt_struct..layout.off_dt_struct + layout.size_dt_struct)
            .contains(&offset)
            && offset % FDT_TAGSIZE == 0;
        if !in_struct || fdt.read_token(offset)? != FdtToken::BeginNode {
            return Err(FdtError::BadOffset(offset));
        }
        Ok(fdt.node_contents_offset(offset)?)
    }

    fn property_slot(&self, contents: usize, name: &str) -> Result<PropertySlot, FdtParseError> {
        let fdt = self.fdt();
        let mut offset = contents;
        loop {
            match fdt.read_token(offset)? {
                FdtToken::Prop => {
                    let len = fdt.read_u32(offset + FDT_TAGSIZE)? as usize;
                    let nameoff = fdt.read_u32(offset + 2 * FDT_TAGSIZE)? as usize;
                    if fdt.string(nameoff)? == name {
                        return Ok(PropertySlot::Existing { offset, len });
                    }
                    offset = fdt.next_property_offset(offset)?;
                }
                FdtToken::Nop => offset += FDT_TAGSIZE,
                _ => return Ok(PropertySlot::Missing { offset }),
            }
        }
    }

    /// Returns the value of a property of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::BadOffset`] if `node` doesn't point at a node, or
    /// an error if the tree can't be parsed.
    pub fn property(&self, node: NodeOffset, name: &str) -> Result<Option<&[u8]>, FdtError> {
        self.check_node(node)?;
        Ok(FdtNode::new(self.fdt(), node.0)
            .property(name)?
            .map(|property| property.value()))
    }

    /// Returns the value of a property of `node` for in-place modification.
    ///
    /// The length of the value can't change this way, so the layout of the
    /// blob is preserved and offsets stay valid.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::BadOffset`] if `node` doesn't point at a node, or
    /// an error if the tree can't be parsed.
    pub fn property_mut(
        &mut self,
        node: NodeOffset,
        name: &str,
    ) -> Result<Option<&mut [u8]>, FdtError> {
        self.check_node(node)?;
        let range = FdtNode::new(self.fdt(), node.0)
            .property(name)?
            .map(|property| property.value_range());
        Ok(range.map(move |range| &mut self.data[range]))
    }

    /// Sets a property of `node`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::NoSpace`] if there isn't enough free space,
    /// [`FdtError::BadName`] if `name` isn't a valid property name, or
    /// [`FdtError::BadOffset`] if `node` doesn't point at a node. The blob is
    /// unchanged on error.
    pub fn set_property(
        &mut self,
        node: NodeOffset,
        name: &str,
        value: &[u8],
    ) -> Result<(), FdtError> {
        self.set_property_parts(node, name, &[value])
    }

    /// Sets a property of `node` to an empty value, as used for flags such as
    /// `no-map`.
    ///
    /// # Errors
    ///
    /// See [`FdtBlob::set_property`].
    pub fn set_property_empty(&mut self, node: NodeOffset, name: &str) -> Result<(), FdtError> {
        self.set_property_parts(node, name, &[])
    }

    /// Sets a property of `node` to a single big-endian `u32`.
    ///
    /// # Errors
    ///
    /// See [`FdtBlob::set_property`].
    pub fn set_property_u32(
        &mut self,
        node: NodeOffset,
        name: &str,
        value: u32,
    ) -> Result<(), FdtError> {
        self.set_property_parts(node, name, &[&value.to_be_bytes()])
    }

    /// Sets a property of `node` to a NUL-terminated string.
    ///
    /// # Errors
    ///
    /// See [`FdtBlob::set_property`].
    pub fn set_property_str(
        &mut self,
        node: NodeOffset,
        name: &str,
        value: &str,
    ) -> Result<(), FdtError> {
        self.set_property_parts(node, name, &[value.as_bytes(), &[0]])
    }

    fn set_property_parts(
        &mut self,
        node: NodeOffset,
        name: &str,
        parts: &[&[u8]],
    ) -> Result<(), FdtError> {
        validate_property_name(name)?;
        let contents = self.check_node(node)?;
        let len: usize = parts.iter().map(|part| part.len()).sum();
        let len_field = to_u32(len)?;

        let value_offset = match self.property_slot(contents, name)? {
            PropertySlot::Existing { offset, len: old_len } => {
                let value_offset = offset + 3 * FDT_TAGSIZE;
                self.splice_struct(
                    value_offset,
                    Fdt::align_tag_offset(old_len),
                    Fdt::align_tag_offset(len),
                )?;
                self.write_u32(offset + FDT_TAGSIZE, len_field);
                value_offset
            }
            PropertySlot::Missing { offset } => {
                let existing = self.find_string(name);
                let prop_size = 3 * FDT_TAGSIZE + Fdt::align_tag_offset(len);
                let string_size = if existing.is_some() { 0 } else { name.len() + 1 };
                if prop_size + string_size > self.free_space() {
                    return Err(FdtError::NoSpace {
                        requested: self.strings_end() + prop_size + string_size,
                        limit: self.data.len(),
                    });
                }
                let nameoff = match existing {
                    Some(nameoff) => nameoff,
                    None => self.append_string(name),
                };
                let nameoff = to_u32(nameoff)?;
                self.splice_struct(offset, 0, prop_size)?;
                self.write_u32(offset, FDT_PROP);
                self.write_u32(offset + FDT_TAGSIZE, len_field);
                self.write_u32(offset + 2 * FDT_TAGSIZE, nameoff);
                offset + 3 * FDT_TAGSIZE
            }
        };

        let mut cursor = value_offset;
        for part in parts {
            self.data[cursor..cursor + part.len()].copy_from_slice(part);
            cursor += part.len();
        }
        let padded_end = value_offset + Fdt::align_tag_offset(len);
        self.data[cursor..padded_end].fill(0);
        Ok(())
    }

    /// Adds a child called `name` as the last child of `parent`.
    ///
    /// Returns the offset of the new node.
    ///
    /// # Errors
    ///
    /// Returns [`FdtError::Exists`] if `parent` already has a child with that
    /// exact name, [`FdtError::BadName`] if `name` isn't a valid node name,
    /// [`FdtError::NoSpace`] if there isn't enough free space, or
    /// [`FdtError::BadOffset`] if `parent` doesn't point at a node. The blob
    /// is unchanged on error.
    pub fn add_subnode(&mut self, parent: NodeOffset, name: &str) -> Result<NodeOffset, FdtError> {
        validate_node_name(name)?;
        self.check_node(parent)?;

        let fdt = self.fdt();
        for child in FdtNode::new(fdt, parent.0).children() {
            if child?.name()? == name {
                return Err(FdtError::Exists);
            }
        }
        // The new node goes right before the parent's FDT_END_NODE.
        let offset = fdt.next_sibling_offset(parent.0)? - FDT_TAGSIZE;

        let name_size = Fdt::align_tag_offset(name.len() + 1);
        let node_size = FDT_TAGSIZE + name_size + FDT_TAGSIZE;
        self.splice_struct(offset, 0, node_size)?;

        let name_offset = offset + FDT_TAGSIZE;
        self.write_u32(offset, FDT_BEGIN_NODE);
        self.data[name_offset..name_offset + name.len()].copy_from_slice(name.as_bytes());
        self.data[name_offset + name.len()..name_offset + name_size].fill(0);
        self.write_u32(name_offset + name_size, FDT_END_NODE);
        Ok(NodeOffset(offset))
    }

    /// Replaces `old_len` bytes of the structure block at `offset` with
    /// `new_len` bytes, shifting everything after them. The new bytes are left
    /// for the caller to fill.
    fn splice_struct(&mut self, offset: usize, old_len: usize, new_len: usize) -> Result<(), FdtError> {
        let mut layout = self.layout();
        let end = layout.off_dt_strings + layout.size_dt_strings;
        if new_len > old_len {
            let delta = new_len - old_len;
            if end + delta > self.data.len() {
                return Err(FdtError::NoSpace {
                    requested: end + delta,
                    limit: self.data.len(),
                });
            }
            self.data.copy_within(offset + old_len..end, offset + new_len);
            layout.size_dt_struct += delta;
            layout.off_dt_strings += delta;
        } else {
            let delta = old_len - new_len;
            self.data.copy_within(offset + old_len..end, offset + new_len);
            self.data[end - delta..end].fill(0);
            layout.size_dt_struct -= delta;
            layout.off_dt_strings -= delta;
        }
        self.store_layout(&layout);
        Ok(())
    }

    fn find_string(&self, name: &str) -> Option<usize> {
        let layout = self.layout();
        let strings = &self.data[layout.off_dt_strings..][..layout.size_dt_strings];
        let name = name.as_bytes();
        strings
            .windows(name.len() + 1)
            .position(|window| window[..name.len()] == *name && window[name.len()] == 0)
    }

    /// Appends `name` to the strings block, which must have room for it.
    fn append_string(&mut self, name: &str) -> usize {
        let mut layout = self.layout();
        let nameoff = layout.size_dt_strings;
        let start = layout.off_dt_strings + nameoff;
        self.data[start..start + name.len()].copy_from_slice(name.as_bytes());
        self.data[start + name.len()] = 0;
        layout.size_dt_strings += name.len() + 1;
        self.store_layout(&layout);
        nameoff
    }

    fn store_layout(&mut self, layout: &Layout) {
        let (header, _) = FdtHeader::mut_from_prefix(&mut self.data)
            .expect("the blob always holds a full header");
        let field = |value: usize| {
            u32::try_from(value).expect("offsets within the blob always fit in 32 bits")
        };
        header.off_dt_struct.set(field(layout.off_dt_struct));
        header.size_dt_struct.set(field(layout.size_dt_struct));
        header.off_dt_strings.set(field(layout.off_dt_strings));
        header.size_dt_strings.set(field(layout.size_dt_strings));
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + FDT_TAGSIZE].copy_from_slice(&value.to_be_bytes());
    }
}

fn to_u32(value: usize) -> Result<u32, FdtError> {
    u32::try_from(value).map_err(|_| FdtError::NoSpace {
        requested: value,
        limit: u32::MAX as usize,
    })
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ',' | '.' | '_' | '+' | '-')
}

fn validate_node_name(name: &str) -> Result<(), FdtError> {
    let (base, unit_address) = name.split_once('@').unwrap_or((name, ""));
    if base.is_empty() || !base.chars().all(is_name_char) || !unit_address.chars().all(is_name_char)
    {
        return Err(FdtError::BadName);
    }
    Ok(())
}

fn validate_property_name(name: &str) -> Result<(), FdtError> {
    if name.is_empty() || !name.chars().all(|ch| is_name_char(ch) || matches!(ch, '#' | '?')) {
        return Err(FdtError::BadName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::standard::Status;

    fn empty(size: usize, max_size: usize) -> FdtBlob {
        FdtBlob::create_empty(size, max_size).unwrap()
    }

    fn root(blob: &FdtBlob) -> NodeOffset {
        blob.node_offset("/").unwrap().unwrap()
    }

    #[test]
    fn empty_tree() {
        let blob = empty(128, 128);
        assert_eq!(blob.totalsize(), 128);
        assert_eq!(blob.free_space(), 128 - 72);
        let fdt = Fdt::new(blob.as_bytes()).unwrap();
        assert_eq!(fdt.root().unwrap().name().unwrap(), "");
        assert!(FdtBlob::create_empty(64, 128).is_err());
        assert!(FdtBlob::create_empty(256, 128).is_err());
    }

    #[test]
    fn grow_respects_max_size() {
        let mut blob = empty(72, 100);
        blob.grow(28).unwrap();
        assert_eq!(blob.totalsize(), 100);
        assert_eq!(blob.fdt().totalsize(), 100);

        let before = blob.clone();
        assert_eq!(
            blob.grow(1),
            Err(FdtError::NoSpace {
                requested: 101,
                limit: 100
            })
        );
        assert_eq!(blob, before);
    }

    #[test]
    fn shrink_below_contents_fails() {
        let mut blob = empty(128, 128);
        assert_eq!(
            blob.open_into(71),
            Err(FdtError::NoSpace {
                requested: 71,
                limit: 72
            })
        );
        blob.open_into(72).unwrap();
        assert_eq!(blob.free_space(), 0);
    }

    #[test]
    fn set_and_replace_properties() {
        let mut blob = empty(256, 256);
        let root = root(&blob);
        blob.set_property_u32(root, "#address-cells", 2).unwrap();
        blob.set_property_str(root, "model", "test board").unwrap();
        blob.set_property_empty(root, "dma-coherent").unwrap();

        assert_eq!(
            blob.property(root, "#address-cells").unwrap(),
            Some(&[0, 0, 0, 2][..])
        );

        // Grow, then shrink an existing value.
        blob.set_property_str(root, "model", "a much longer board name").unwrap();
        blob.set_property_str(root, "model", "x").unwrap();

        let fdt = Fdt::new(blob.as_bytes()).unwrap();
        let root = fdt.root().unwrap();
        let names: Vec<_> = root.properties().map(|p| p.unwrap().name()).collect();
        assert_eq!(names, ["#address-cells", "model", "dma-coherent"]);
        assert_eq!(root.property("model").unwrap().unwrap().as_str(), Ok("x"));
        assert_eq!(root.address_cells().unwrap(), 2);
        assert!(root.property("dma-coherent").unwrap().unwrap().value().is_empty());
    }

    #[test]
    fn property_names_are_shared() {
        let mut blob = empty(256, 256);
        let root = root(&blob);
        let a = blob.add_subnode(root, "a").unwrap();
        blob.set_property_str(a, "status", Status::Disabled.as_str()).unwrap();
        let strings_size = blob.layout().size_dt_strings;
        let b = blob.add_subnode(root, "b").unwrap();
        blob.set_property_str(b, "status", Status::Okay.as_str()).unwrap();
        assert_eq!(blob.layout().size_dt_strings, strings_size);
    }

    #[test]
    fn add_subnodes() {
        let mut blob = empty(256, 256);
        let root = root(&blob);
        blob.set_property_u32(root, "#size-cells", 1).unwrap();
        let first = blob.add_subnode(root, "reserved-memory").unwrap();
        blob.set_property_empty(first, "ranges").unwrap();
        let child = blob.add_subnode(first, "region@80000000").unwrap();
        blob.set_property_empty(child, "no-map").unwrap();
        let root = blob.node_offset("/").unwrap().unwrap();
        blob.add_subnode(root, "chosen").unwrap();

        let fdt = blob.fdt();
        let names: Vec<_> = fdt
            .root()
            .unwrap()
            .children()
            .map(|child| child.unwrap().name().unwrap())
            .collect();
        assert_eq!(names, ["reserved-memory", "chosen"]);
        let region = fdt
            .find_node("/reserved-memory/region@80000000")
            .unwrap()
            .unwrap();
        assert!(region.property("no-map").unwrap().is_some());
        assert!(fdt.find_node("/reserved-memory/region").unwrap().is_some());
    }

    #[test]
    fn duplicate_and_invalid_names() {
        let mut blob = empty(256, 256);
        let root = root(&blob);
        blob.add_subnode(root, "cpus").unwrap();
        let root = blob.node_offset("/").unwrap().unwrap();
        let before = blob.clone();
        assert_eq!(blob.add_subnode(root, "cpus"), Err(FdtError::Exists));
        assert_eq!(blob.add_subnode(root, ""), Err(FdtError::BadName));
        assert_eq!(blob.add_subnode(root, "a/b"), Err(FdtError::BadName));
        assert_eq!(blob.set_property_empty(root, ""), Err(FdtError::BadName));
        assert_eq!(blob, before);
    }

    #[test]
    fn no_space_leaves_blob_unchanged() {
        let mut blob = empty(80, 80);
        let root = root(&blob);
        let before = blob.clone();
        assert!(matches!(
            blob.set_property_str(root, "model", "does not fit"),
            Err(FdtError::NoSpace { .. })
        ));
        assert!(matches!(
            blob.add_subnode(root, "much-too-long-name"),
            Err(FdtError::NoSpace { .. })
        ));
        assert_eq!(blob, before);
    }

    #[test]
    fn bad_offset() {
        let mut blob = empty(128, 128);
        assert_eq!(
            blob.set_property_empty(NodeOffset(3), "x"),
            Err(FdtError::BadOffset(3))
        );
        assert_eq!(blob.property(NodeOffset(0), "x"), Err(FdtError::BadOffset(0)));
    }

    #[test]
    fn property_mut_in_place() {
        let mut blob = empty(128, 128);
        let root = root(&blob);
        blob.set_property(root, "cells", &[0, 0, 0, 1, 0, 0, 0, 2]).unwrap();
        let value = blob.property_mut(root, "cells").unwrap().unwrap();
        value[7] = 9;
        assert_eq!(
            blob.property(root, "cells").unwrap(),
            Some(&[0, 0, 0, 1, 0, 0, 0, 9][..])
        );
        assert!(blob.property_mut(root, "missing").unwrap().is_none());
    }
}
