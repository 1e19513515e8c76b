// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, info};
use zerocopy::{IntoBytes, big_endian};

use super::{Platform, PmpRegions, RESERVED_MEMORY_FIXUP_SLACK, expand};
use crate::blob::FdtBlob;
use crate::cells;
use crate::error::{FdtError, FixupError};
use crate::standard::AddressSpaceProperties;

const RESERVED_MEMORY: &str = "reserved-memory";

/// Adds a `no-map` child of `/reserved-memory` for every enabled PMP region
/// that grants no access, so that the operating system keeps away from the
/// memory protected by the firmware.
///
/// `/reserved-memory` is created if needed, with the `#address-cells` and
/// `#size-cells` of the root node and an empty `ranges`. The children are
/// named `mmode_pmp<n>@<address>`, `n` counting the inserted regions from 0.
/// The tree is assumed not to describe these regions yet.
///
/// Nothing happens if the platform has no PMP. Returns the number of regions
/// added.
///
/// # Errors
///
/// Returns [`FixupError::OutOfSpace`] if the blob can't be grown, in which
/// case nothing is changed, or [`FixupError::TreeWrite`] if the root's cell
/// counts are out of range or a node or property can't be written. Changes
/// made before a write failure are kept.
pub fn reserved_memory_fixup<P, R>(
    blob: &mut FdtBlob,
    platform: &P,
    pmp: &R,
) -> Result<usize, FixupError>
where
    P: Platform + ?Sized,
    R: PmpRegions + ?Sized,
{
    if !platform.has_pmp() {
        return Ok(0);
    }

    expand(blob, RESERVED_MEMORY_FIXUP_SLACK)?;

    let root = blob.fdt().root()?;
    let AddressSpaceProperties {
        address_cells,
        size_cells,
    } = root.address_space()?;
    if address_cells == 0 || address_cells > cells::MAX_CELLS {
        return Err(FdtError::BadCells(address_cells).into());
    }
    if size_cells > cells::MAX_CELLS {
        return Err(FdtError::BadCells(size_cells).into());
    }
    let root = root.offset();

    let parent = if let Some(parent) = blob.node_offset("/reserved-memory")? {
        parent
    } else {
        let parent = blob.add_subnode(root, RESERVED_MEMORY)?;
        blob.set_property_empty(parent, "ranges")?;
        blob.set_property_u32(parent, "#size-cells", size_cells)?;
        blob.set_property_u32(parent, "#address-cells", address_cells)?;
        debug!("created /{RESERVED_MEMORY}");
        parent
    };

    // Nodes and properties are only ever inserted after `parent`, so its
    // offset stays valid while children are added.
    let mut inserted = 0;
    for index in 0..pmp.count() {
        let region = pmp.region(index);
        if !region.is_reserved() {
            continue;
        }

        let name = region_node_name(inserted, region.address, address_cells);
        let child = blob.add_subnode(parent, &name)?;
        blob.set_property_empty(child, "no-map")?;
        let reg: Vec<big_endian::U32> = cells::encode(region.address, address_cells as usize)
            .chain(cells::encode(region.size, size_cells as usize))
            .collect();
        blob.set_property(child, "reg", reg.as_bytes())?;
        debug!(
            "/{RESERVED_MEMORY}/{name}: reserved {:#x} bytes at {:#x}",
            region.size, region.address
        );
        inserted += 1;
    }

    info!("{inserted} PMP region(s) added to /{RESERVED_MEMORY}");
    Ok(inserted)
}

/// Returns the name of the node describing the `index`th reserved region.
///
/// The high half of the address only appears in the unit address when the
/// parent uses more than one address cell and it isn't zero.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the address is deliberately split into 32-bit halves"
)]
fn region_node_name(index: usize, address: u64, address_cells: u32) -> String {
    let high = (address >> 32) as u32;
    let low = address as u32;
    if address_cells > 1 && high != 0 {
        format!("mmode_pmp{index}@{high:x},{low:x}")
    } else {
        format!("mmode_pmp{index}@{low:x}")
    }
}
