// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for the `dtfixup` crate.

use core::fmt::{self, Display, Formatter};

use thiserror::Error;

/// An error that can occur when parsing, accessing or editing a device tree.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum FdtError {
    /// There was an error parsing the device tree.
    #[error("{0}")]
    Parse(#[from] FdtParseError),
    /// The blob cannot be resized to the requested size.
    #[error("FDT blob cannot hold {requested} bytes (limit is {limit} bytes)")]
    NoSpace {
        /// The size that was requested.
        requested: usize,
        /// The largest size the blob may take, or the smallest size that can
        /// hold its contents when shrinking.
        limit: usize,
    },
    /// A node with the given name already exists.
    #[error("a node with this name already exists")]
    Exists,
    /// A node or property name is empty or contains invalid characters.
    #[error("invalid node or property name")]
    BadName,
    /// A `#address-cells` or `#size-cells` value is out of range.
    #[error("invalid cell count {0}")]
    BadCells(u32),
    /// The offset does not point at the start of a node.
    #[error("offset {0} does not point at a node")]
    BadOffset(usize),
    /// The value of a `status` property is not one of the standard values.
    #[error("invalid `status` value")]
    InvalidStatus,
}

/// An error that can occur when parsing a device tree.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct FdtParseError {
    offset: usize,
    /// The type of the error that has occurred.
    pub kind: FdtErrorKind,
}

impl FdtParseError {
    pub(crate) fn new(kind: FdtErrorKind, offset: usize) -> Self {
        Self { offset, kind }
    }

    /// Returns the offset in the blob at which the error was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// The kind of an error that can occur when parsing a device tree.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum FdtErrorKind {
    /// The magic number of the device tree is invalid.
    InvalidMagic,
    /// The Device Tree version is not supported by this library.
    UnsupportedVersion(u32),
    /// The length of the device tree is invalid.
    InvalidLength,
    /// The header failed validation.
    InvalidHeader(&'static str),
    /// An invalid token was encountered.
    BadToken(u32),
    /// A read from data at invalid offset was attempted.
    InvalidOffset,
    /// An invalid string was encountered.
    InvalidString,
    /// A property value doesn't have the length its type requires.
    InvalidPropertyLength,
    /// Memory reservation block has not been terminated with a null entry.
    MemReserveNotTerminated,
}

impl Display for FdtParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl Display for FdtErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FdtErrorKind::InvalidMagic => write!(f, "invalid FDT magic number"),
            FdtErrorKind::UnsupportedVersion(version) => {
                write!(f, "the FDT version {version} is not supported")
            }
            FdtErrorKind::InvalidLength => write!(f, "invalid FDT length"),
            FdtErrorKind::InvalidHeader(msg) => {
                write!(f, "FDT header has failed validation: {msg}")
            }
            FdtErrorKind::BadToken(token) => write!(f, "bad FDT token: 0x{token:x}"),
            FdtErrorKind::InvalidOffset => write!(f, "invalid offset in FDT"),
            FdtErrorKind::InvalidString => write!(f, "invalid string in FDT"),
            FdtErrorKind::InvalidPropertyLength => write!(f, "property value has invalid length"),
            FdtErrorKind::MemReserveNotTerminated => write!(
                f,
                "memory reservation block not terminated with a null entry"
            ),
        }
    }
}

impl core::error::Error for FdtParseError {}

/// An error returned by one of the boot-time fixups.
///
/// None of these are fatal to the boot: the caller is expected to log them and
/// hand over the tree as it is.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum FixupError {
    /// The blob could not be grown to make room for the fixup. The tree has
    /// not been modified.
    #[error("no room to grow the FDT to {requested} bytes (limit is {limit} bytes)")]
    OutOfSpace {
        /// The size the fixup asked for.
        requested: usize,
        /// The largest size the blob may take.
        limit: usize,
    },
    /// Writing to the tree failed. Changes made before the failure are kept.
    #[error("failed to update the FDT: {0}")]
    TreeWrite(#[from] FdtError),
}

impl From<FdtParseError> for FixupError {
    fn from(err: FdtParseError) -> Self {
        Self::TreeWrite(err.into())
    }
}

/// An error returned when looking up a platform device in the tree.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum DeviceError {
    /// No node is compatible with the requested string.
    #[error("no compatible device node found")]
    NotFound,
    /// The node was found but a mandatory field is missing or invalid.
    #[error("malformed device node: {0}")]
    Malformed(&'static str),
    /// The tree could not be read.
    #[error("{0}")]
    Parse(#[from] FdtParseError),
}
