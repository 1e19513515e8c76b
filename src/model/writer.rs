// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::borrow::ToOwned;
use alloc::vec;
use alloc::vec::Vec;

use zerocopy::IntoBytes;

use super::{DeviceTree, DeviceTreeNode, DeviceTreeProperty, NameMap};
use crate::fdt::{FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_PROP, Fdt, FdtHeader, Layout};
use crate::memreserve::MemoryReservation;

pub(crate) fn to_bytes(tree: &DeviceTree) -> Vec<u8> {
    // The header is written last, once the layout is known.
    let mut dtb = vec![0; size_of::<FdtHeader>()];

    let off_mem_rsvmap = dtb.len();
    for reservation in tree
        .memory_reservations
        .iter()
        .chain([&MemoryReservation::TERMINATOR])
    {
        dtb.extend_from_slice(reservation.as_bytes());
    }

    let off_dt_struct = dtb.len();
    let mut strings = StringTable::default();
    write_node(&mut dtb, &mut strings, &tree.root);
    dtb.extend_from_slice(&FDT_END.to_be_bytes());

    let off_dt_strings = dtb.len();
    strings.write(&mut dtb);

    let layout = Layout {
        off_mem_rsvmap,
        off_dt_struct,
        size_dt_struct: off_dt_strings - off_dt_struct,
        off_dt_strings,
        size_dt_strings: dtb.len() - off_dt_strings,
        totalsize: dtb.len(),
    };
    FdtHeader::for_layout(&layout, tree.boot_cpuid_phys)
        .expect("device tree exceeds the 4 GiB limit of the FDT format")
        .write_to_prefix(&mut dtb)
        .expect("space for the header was reserved up front");

    dtb
}

fn write_node(dtb: &mut Vec<u8>, strings: &mut StringTable, node: &DeviceTreeNode) {
    dtb.extend_from_slice(&FDT_BEGIN_NODE.to_be_bytes());
    dtb.extend_from_slice(node.name().as_bytes());
    dtb.push(0);
    align(dtb);

    for prop in node.properties() {
        write_prop(dtb, strings, prop);
    }

    for child in node.children() {
        write_node(dtb, strings, child);
    }

    dtb.extend_from_slice(&FDT_END_NODE.to_be_bytes());
}

fn write_prop(dtb: &mut Vec<u8>, strings: &mut StringTable, prop: &DeviceTreeProperty) {
    let nameoff = strings.offset(prop.name());
    let len = u32::try_from(prop.value().len()).expect("property value length exceeds u32");

    dtb.extend_from_slice(&FDT_PROP.to_be_bytes());
    dtb.extend_from_slice(&len.to_be_bytes());
    dtb.extend_from_slice(&nameoff.to_be_bytes());
    dtb.extend_from_slice(prop.value());
    align(dtb);
}

fn align(dtb: &mut Vec<u8>) {
    dtb.resize(Fdt::align_tag_offset(dtb.len()), 0);
}

/// The strings block being built, in order of first use like `dtc` does.
#[derive(Default)]
struct StringTable {
    offsets: NameMap<u32>,
    size: usize,
}

impl StringTable {
    fn offset(&mut self, name: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(name) {
            return offset;
        }
        let offset = u32::try_from(self.size).expect("string block length exceeds u32");
        self.offsets.insert(name.to_owned(), offset);
        self.size += name.len() + 1;
        offset
    }

    fn write(&self, dtb: &mut Vec<u8>) {
        for name in self.offsets.keys() {
            dtb.extend_from_slice(name.as_bytes());
            dtb.push(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree() {
        let dtb = DeviceTree::new().to_dtb();
        assert_eq!(dtb.len(), 72);
        let fdt = Fdt::new(&dtb).unwrap();
        assert_eq!(fdt.layout().size_dt_struct, 16);
        assert_eq!(fdt.layout().size_dt_strings, 0);
    }

    #[test]
    fn strings_are_deduplicated() {
        let mut tree = DeviceTree::new();
        for name in ["a", "b"] {
            tree.root.add_child(
                DeviceTreeNode::builder(name)
                    .property(DeviceTreeProperty::string("status", "okay"))
                    .build(),
            );
        }
        let dtb = tree.to_dtb();
        let fdt = Fdt::new(&dtb).unwrap();
        let layout = fdt.layout();
        assert_eq!(
            &dtb[layout.off_dt_strings..][..layout.size_dt_strings],
            b"status\0"
        );
    }
}
