// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-only API for parsing and traversing a [Flattened Device Tree (FDT)].
//!
//! This module provides the [`Fdt`] struct, which is the entry point for
//! parsing and traversing an FDT blob. It performs no memory allocation and
//! provides a zero-copy view of the FDT data.
//!
//! [Flattened Device Tree (FDT)]: https://devicetree-specification.readthedocs.io/en/latest/chapter5-flattened-format.html

mod node;
mod property;

use core::fmt::{self, Display, Formatter};
use core::mem::offset_of;

use zerocopy::byteorder::big_endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub use self::node::{FdtNode, NodeOffset};
pub use self::property::FdtProperty;
use crate::error::{FdtErrorKind, FdtParseError};
use crate::memreserve::MemoryReservation;

/// Version of the FDT specification supported by this library.
pub(crate) const FDT_VERSION: u32 = 17;
/// Oldest version a version 17 blob is backwards compatible with.
pub(crate) const FDT_LAST_COMP_VERSION: u32 = 16;
pub(crate) const FDT_MAGIC: u32 = 0xd00d_feed;
pub(crate) const FDT_TAGSIZE: usize = size_of::<u32>();

pub(crate) const FDT_BEGIN_NODE: u32 = 0x1;
pub(crate) const FDT_END_NODE: u32 = 0x2;
pub(crate) const FDT_PROP: u32 = 0x3;
pub(crate) const FDT_NOP: u32 = 0x4;
pub(crate) const FDT_END: u32 = 0x9;

#[repr(C, packed)]
#[derive(Debug, Copy, Clone, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct FdtHeader {
    /// Magic number of the device tree.
    pub(crate) magic: big_endian::U32,
    /// Total size of the device tree.
    pub(crate) totalsize: big_endian::U32,
    /// Offset of the device tree structure.
    pub(crate) off_dt_struct: big_endian::U32,
    /// Offset of the device tree strings.
    pub(crate) off_dt_strings: big_endian::U32,
    /// Offset of the memory reservation map.
    pub(crate) off_mem_rsvmap: big_endian::U32,
    /// Version of the device tree.
    pub(crate) version: big_endian::U32,
    /// Last compatible version of the device tree.
    pub(crate) last_comp_version: big_endian::U32,
    /// Physical ID of the boot CPU.
    pub(crate) boot_cpuid_phys: big_endian::U32,
    /// Size of the device tree strings.
    pub(crate) size_dt_strings: big_endian::U32,
    /// Size of the device tree structure.
    pub(crate) size_dt_struct: big_endian::U32,
}

impl FdtHeader {
    /// Builds a version 17 header for the given block layout.
    ///
    /// Returns `None` if any offset or size doesn't fit in 32 bits.
    pub(crate) fn for_layout(layout: &Layout, boot_cpuid_phys: u32) -> Option<Self> {
        let field = |value: usize| u32::try_from(value).ok().map(big_endian::U32::new);
        Some(Self {
            magic: FDT_MAGIC.into(),
            totalsize: field(layout.totalsize)?,
            off_dt_struct: field(layout.off_dt_struct)?,
            off_dt_strings: field(layout.off_dt_strings)?,
            off_mem_rsvmap: field(layout.off_mem_rsvmap)?,
            version: FDT_VERSION.into(),
            last_comp_version: FDT_LAST_COMP_VERSION.into(),
            boot_cpuid_phys: boot_cpuid_phys.into(),
            size_dt_strings: field(layout.size_dt_strings)?,
            size_dt_struct: field(layout.size_dt_struct)?,
        })
    }

    pub(crate) fn magic(&self) -> u32 {
        self.magic.get()
    }

    pub(crate) fn totalsize(&self) -> u32 {
        self.totalsize.get()
    }

    pub(crate) fn off_dt_struct(&self) -> u32 {
        self.off_dt_struct.get()
    }

    pub(crate) fn off_dt_strings(&self) -> u32 {
        self.off_dt_strings.get()
    }

    pub(crate) fn off_mem_rsvmap(&self) -> u32 {
        self.off_mem_rsvmap.get()
    }

    pub(crate) fn version(&self) -> u32 {
        self.version.get()
    }

    pub(crate) fn last_comp_version(&self) -> u32 {
        self.last_comp_version.get()
    }

    pub(crate) fn boot_cpuid_phys(&self) -> u32 {
        self.boot_cpuid_phys.get()
    }

    pub(crate) fn size_dt_strings(&self) -> u32 {
        self.size_dt_strings.get()
    }

    pub(crate) fn size_dt_struct(&self) -> u32 {
        self.size_dt_struct.get()
    }
}

/// Positions of the blocks of a blob, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) off_mem_rsvmap: usize,
    pub(crate) off_dt_struct: usize,
    pub(crate) size_dt_struct: usize,
    pub(crate) off_dt_strings: usize,
    pub(crate) size_dt_strings: usize,
    pub(crate) totalsize: usize,
}

/// A token in the structure block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FdtToken {
    BeginNode,
    EndNode,
    Prop,
    Nop,
    End,
}

impl TryFrom<u32> for FdtToken {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            FDT_BEGIN_NODE => Ok(Self::BeginNode),
            FDT_END_NODE => Ok(Self::EndNode),
            FDT_PROP => Ok(Self::Prop),
            FDT_NOP => Ok(Self::Nop),
            FDT_END => Ok(Self::End),
            _ => Err(value),
        }
    }
}

/// A flattened device tree.
#[derive(Debug, Clone, Copy)]
pub struct Fdt<'a> {
    pub(crate) data: &'a [u8],
}

impl<'a> Fdt<'a> {
    /// Creates a new `Fdt` from the given byte slice.
    ///
    /// # Errors
    ///
    /// Returns an [`FdtErrorKind::InvalidLength`] if `data` is too short to
    /// contain a valid FDT header or if the `totalsize` field in the header
    /// does not match the length of `data`.
    ///
    /// Returns an [`FdtErrorKind::InvalidMagic`] if the `magic` field in the
    /// header is not `0xd00dfeed`.
    ///
    /// Returns an [`FdtErrorKind::UnsupportedVersion`] if the `version` field
    /// in the header is not supported by this library.
    ///
    /// Returns an [`FdtErrorKind::InvalidHeader`] if the header fails to pass
    /// the header integrity checks.
    pub fn new(data: &'a [u8]) -> Result<Self, FdtParseError> {
        if data.len() < size_of::<FdtHeader>() {
            return Err(FdtParseError::new(FdtErrorKind::InvalidLength, 0));
        }

        let fdt = Fdt { data };
        let header = fdt.header();

        if header.magic() != FDT_MAGIC {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidMagic,
                offset_of!(FdtHeader, magic),
            ));
        }
        if !(header.last_comp_version()..=header.version()).contains(&FDT_VERSION) {
            return Err(FdtParseError::new(
                FdtErrorKind::UnsupportedVersion(header.version()),
                offset_of!(FdtHeader, version),
            ));
        }

        if header.totalsize() as usize != data.len() {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidLength,
                offset_of!(FdtHeader, totalsize),
            ));
        }

        fdt.validate_header()?;

        Ok(fdt)
    }

    fn validate_header(&self) -> Result<(), FdtParseError> {
        let layout = self.layout();
        let len = self.data.len();

        if layout.off_mem_rsvmap < size_of::<FdtHeader>() {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidHeader("memrsvmap overlaps the header"),
                offset_of!(FdtHeader, off_mem_rsvmap),
            ));
        }
        if layout.off_mem_rsvmap > layout.off_dt_struct {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidHeader("dt_struct not after memrsvmap"),
                offset_of!(FdtHeader, off_mem_rsvmap),
            ));
        }
        if layout.off_dt_struct.saturating_add(layout.size_dt_struct) > len {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidHeader("struct block overflows"),
                offset_of!(FdtHeader, size_dt_struct),
            ));
        }
        if layout.off_dt_strings.saturating_add(layout.size_dt_strings) > len {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidHeader("strings block overflows"),
                offset_of!(FdtHeader, size_dt_strings),
            ));
        }
        if layout.off_dt_struct + layout.size_dt_struct > layout.off_dt_strings {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidHeader("strings block not after struct block"),
                offset_of!(FdtHeader, off_dt_strings),
            ));
        }

        Ok(())
    }

    /// Returns the header of the device tree.
    pub(crate) fn header(&self) -> &'a FdtHeader {
        let (header, _remaining_bytes) = FdtHeader::ref_from_prefix(self.data)
            .expect("new() checks if the slice is at least as big as the header");
        header
    }

    pub(crate) fn layout(&self) -> Layout {
        let header = self.header();
        Layout {
            off_mem_rsvmap: header.off_mem_rsvmap() as usize,
            off_dt_struct: header.off_dt_struct() as usize,
            size_dt_struct: header.size_dt_struct() as usize,
            off_dt_strings: header.off_dt_strings() as usize,
            size_dt_strings: header.size_dt_strings() as usize,
            totalsize: header.totalsize() as usize,
        }
    }

    /// Returns the underlying data slice of the FDT.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the total size of the blob, as recorded in its header.
    #[must_use]
    pub fn totalsize(&self) -> usize {
        self.header().totalsize() as usize
    }

    /// Returns the version of the FDT.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.header().version()
    }

    /// Returns the last compatible version of the FDT.
    #[must_use]
    pub fn last_comp_version(&self) -> u32 {
        self.header().last_comp_version()
    }

    /// Returns the physical ID of the boot CPU.
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.header().boot_cpuid_phys()
    }

    /// Returns an iterator over the entries of the memory reservation block.
    pub fn memory_reservations(
        &self,
    ) -> impl Iterator<Item = Result<MemoryReservation, FdtParseError>> + use<'a> {
        let data = self.data;
        let mut offset = self.layout().off_mem_rsvmap;
        let mut done = false;
        core::iter::from_fn(move || {
            if done {
                return None;
            }
            let entry = data
                .get(offset..)
                .and_then(|rest| MemoryReservation::read_from_prefix(rest).ok());
            let Some((entry, _)) = entry else {
                done = true;
                return Some(Err(FdtParseError::new(
                    FdtErrorKind::MemReserveNotTerminated,
                    offset,
                )));
            };
            if entry == MemoryReservation::TERMINATOR {
                done = true;
                return None;
            }
            offset += size_of::<MemoryReservation>();
            Some(Ok(entry))
        })
    }

    /// Returns the size in bytes of the memory reservation block, including
    /// its terminating entry.
    pub(crate) fn memory_reservations_size(&self) -> Result<usize, FdtParseError> {
        let mut count = 0;
        for entry in self.memory_reservations() {
            entry?;
            count += 1;
        }
        Ok((count + 1) * size_of::<MemoryReservation>())
    }

    /// Returns the root node of the device tree.
    ///
    /// # Errors
    ///
    /// Returns an [`FdtErrorKind::BadToken`] if the structure block doesn't
    /// start with a node.
    pub fn root(&self) -> Result<FdtNode<'a>, FdtParseError> {
        let mut offset = self.layout().off_dt_struct;
        loop {
            match self.read_token(offset)? {
                FdtToken::BeginNode => return Ok(FdtNode::new(*self, offset)),
                FdtToken::Nop => offset += FDT_TAGSIZE,
                _ => {
                    return Err(FdtParseError::new(
                        FdtErrorKind::BadToken(self.read_u32(offset)?),
                        offset,
                    ));
                }
            }
        }
    }

    /// Finds a node by its absolute path, such as `/cpus/cpu@0`.
    ///
    /// A path component without a unit address also matches a node with one,
    /// so `/soc/uart` finds `/soc/uart@10000000`.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure block can't be parsed.
    pub fn find_node(&self, path: &str) -> Result<Option<FdtNode<'a>>, FdtParseError> {
        if !path.starts_with('/') {
            return Ok(None);
        }
        let mut current = self.root()?;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            match current.child(component)? {
                Some(node) => current = node,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Finds the first node, in depth-first order, whose `compatible` property
    /// contains the given string. The root node is included in the search.
    ///
    /// Only the first match is returned; other nodes with the same compatible
    /// string are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure block can't be parsed.
    pub fn find_compatible(&self, compatible: &str) -> Result<Option<FdtNode<'a>>, FdtParseError> {
        self.search_compatible(compatible, true)
    }

    /// Like [`Fdt::find_compatible`], but never returns the root node.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure block can't be parsed.
    pub fn find_compatible_descendant(
        &self,
        compatible: &str,
    ) -> Result<Option<FdtNode<'a>>, FdtParseError> {
        self.search_compatible(compatible, false)
    }

    fn search_compatible(
        &self,
        compatible: &str,
        include_root: bool,
    ) -> Result<Option<FdtNode<'a>>, FdtParseError> {
        let Some((offset, depth)) = self.walk_nodes(|offset, depth| {
            let candidate = include_root || depth > 0;
            Ok((candidate && FdtNode::new(*self, offset).is_compatible(compatible)?)
                .then_some((offset, depth)))
        })?
        else {
            return Ok(None);
        };

        let mut node = FdtNode::new(*self, offset);
        if let Some(parent_depth) = depth.checked_sub(1) {
            // The parent is the last node opened one level up before the match.
            let mut parent = None;
            self.walk_nodes(|candidate, candidate_depth| {
                if candidate == offset {
                    return Ok(Some(()));
                }
                if candidate_depth == parent_depth {
                    parent = Some(candidate);
                }
                Ok(None)
            })?;
            if let Some(parent) = parent {
                node.parent_address_space = FdtNode::new(*self, parent).address_space()?;
            }
        }
        Ok(Some(node))
    }

    /// Visits every node in document order with its offset and depth, the root
    /// being at depth 0, until `visit` returns a value.
    fn walk_nodes<T>(
        &self,
        mut visit: impl FnMut(usize, usize) -> Result<Option<T>, FdtParseError>,
    ) -> Result<Option<T>, FdtParseError> {
        let mut offset = self.root()?.offset;
        let mut depth = 0usize;
        loop {
            match self.read_token(offset)? {
                FdtToken::BeginNode => {
                    if let Some(found) = visit(offset, depth)? {
                        return Ok(Some(found));
                    }
                    depth += 1;
                    offset = self.node_contents_offset(offset)?;
                }
                FdtToken::EndNode => {
                    offset += FDT_TAGSIZE;
                    depth -= 1;
                    if depth == 0 {
                        return Ok(None);
                    }
                }
                FdtToken::Prop => offset = self.next_property_offset(offset)?,
                FdtToken::Nop => offset += FDT_TAGSIZE,
                FdtToken::End => {
                    return Err(FdtParseError::new(FdtErrorKind::BadToken(FDT_END), offset));
                }
            }
        }
    }

    pub(crate) fn read_u32(&self, offset: usize) -> Result<u32, FdtParseError> {
        self.data
            .get(offset..)
            .and_then(|rest| big_endian::U32::read_from_prefix(rest).ok())
            .map(|(value, _)| value.get())
            .ok_or_else(|| FdtParseError::new(FdtErrorKind::InvalidOffset, offset))
    }

    pub(crate) fn read_token(&self, offset: usize) -> Result<FdtToken, FdtParseError> {
        FdtToken::try_from(self.read_u32(offset)?)
            .map_err(|token| FdtParseError::new(FdtErrorKind::BadToken(token), offset))
    }

    /// Returns the offset just past the NUL terminator of the string starting
    /// at `offset`.
    pub(crate) fn find_string_end(&self, offset: usize) -> Result<usize, FdtParseError> {
        self.data
            .get(offset..)
            .and_then(|rest| rest.iter().position(|&byte| byte == 0))
            .map(|len| offset + len + 1)
            .ok_or_else(|| FdtParseError::new(FdtErrorKind::InvalidString, offset))
    }

    /// Returns the NUL-terminated string starting at `offset`.
    pub(crate) fn string_at_offset(&self, offset: usize) -> Result<&'a str, FdtParseError> {
        let end = self.find_string_end(offset)?;
        core::str::from_utf8(&self.data[offset..end - 1])
            .map_err(|_| FdtParseError::new(FdtErrorKind::InvalidString, offset))
    }

    /// Returns the string at `nameoff` in the strings block.
    pub(crate) fn string(&self, nameoff: usize) -> Result<&'a str, FdtParseError> {
        let layout = self.layout();
        if nameoff >= layout.size_dt_strings {
            return Err(FdtParseError::new(
                FdtErrorKind::InvalidString,
                layout.off_dt_strings + nameoff,
            ));
        }
        self.string_at_offset(layout.off_dt_strings + nameoff)
    }

    pub(crate) fn align_tag_offset(offset: usize) -> usize {
        offset.next_multiple_of(FDT_TAGSIZE)
    }

    /// Returns the offset of the first token after the name of the node that
    /// starts at `offset`.
    pub(crate) fn node_contents_offset(&self, offset: usize) -> Result<usize, FdtParseError> {
        let name_end = self.find_string_end(offset + FDT_TAGSIZE)?;
        Ok(Self::align_tag_offset(name_end))
    }

    /// Returns the offset of the token following the property whose
    /// `FDT_PROP` tag is at `offset`.
    pub(crate) fn next_property_offset(&self, offset: usize) -> Result<usize, FdtParseError> {
        let len = self.read_u32(offset + FDT_TAGSIZE)? as usize;
        Ok(Self::align_tag_offset(offset + 3 * FDT_TAGSIZE + len))
    }

    /// Returns the offset of the token following the `FDT_END_NODE` that
    /// closes the node starting at `offset`.
    pub(crate) fn next_sibling_offset(&self, offset: usize) -> Result<usize, FdtParseError> {
        let mut depth = 0usize;
        let mut offset = offset;
        loop {
            match self.read_token(offset)? {
                FdtToken::BeginNode => {
                    depth += 1;
                    offset = self.node_contents_offset(offset)?;
                }
                FdtToken::EndNode => {
                    offset += FDT_TAGSIZE;
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        FdtParseError::new(FdtErrorKind::BadToken(FDT_END_NODE), offset)
                    })?;
                    if depth == 0 {
                        return Ok(offset);
                    }
                }
                FdtToken::Prop => offset = self.next_property_offset(offset)?,
                FdtToken::Nop => offset += FDT_TAGSIZE,
                FdtToken::End => {
                    return Err(FdtParseError::new(FdtErrorKind::BadToken(FDT_END), offset));
                }
            }
        }
    }
}

impl Display for Fdt<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "/dts-v1/;")?;
        writeln!(f)?;
        let mut has_reservations = false;
        for reservation in self.memory_reservations() {
            let reservation = reservation.map_err(|_| fmt::Error)?;
            writeln!(
                f,
                "/memreserve/ {:#x} {:#x};",
                reservation.address(),
                reservation.size()
            )?;
            has_reservations = true;
        }
        if has_reservations {
            writeln!(f)?;
        }
        self.root().map_err(|_| fmt::Error)?.fmt(f)
    }
}
