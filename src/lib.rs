// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Boot-time fixups for Flattened Device Tree (FDT) blobs.
//!
//! This library is meant to run in machine-mode firmware, before the device
//! tree is handed over to the next boot stage. It provides:
//!
//! - A read-only API for parsing and traversing FDTs without copying.
//! - An in-place editor for FDT blobs held in a growable buffer.
//! - Fixups that project runtime facts into the tree: disabled harts, masked
//!   PLIC contexts and PMP-protected memory regions.
//! - Parsers for the platform devices firmware needs during bring-up: the
//!   8250 UART, the PLIC and the CLINT.
//!
//! The library is `#![no_std]` and only needs `alloc`. The `write` feature
//! adds an in-memory tree model that can be serialized to a DTB.
//!
//! # Examples
//!
//! ```
//! use dtfixup::blob::FdtBlob;
//! use dtfixup::fixup::{self, Platform};
//!
//! struct TwoHarts;
//!
//! impl Platform for TwoHarts {
//!     fn hart_count(&self) -> u32 {
//!         2
//!     }
//!
//!     fn hart_invalid(&self, hart: u32) -> bool {
//!         hart == 1
//!     }
//!
//!     fn has_pmp(&self) -> bool {
//!         false
//!     }
//! }
//!
//! let mut blob = FdtBlob::create_empty(256, 4096).unwrap();
//! # let root = blob.node_offset("/").unwrap().unwrap();
//! # let cpus = blob.add_subnode(root, "cpus").unwrap();
//! # blob.add_subnode(cpus, "cpu@0").unwrap();
//! # let cpus = blob.node_offset("/cpus").unwrap().unwrap();
//! # blob.add_subnode(cpus, "cpu@1").unwrap();
//! fixup::cpu_fixup(&mut blob, &TwoHarts).unwrap();
//!
//! let fdt = blob.fdt();
//! let cpu1 = fdt.find_node("/cpus/cpu@1").unwrap().unwrap();
//! assert_eq!(cpu1.property("status").unwrap().unwrap().as_str(), Ok("disabled"));
//! ```

#![no_std]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod blob;
pub mod cells;
pub mod device;
pub mod error;
pub mod fdt;
pub mod fixup;
pub mod memreserve;
#[cfg(feature = "write")]
pub mod model;
pub mod standard;
