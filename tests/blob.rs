// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![cfg(feature = "write")]

use dtfixup::blob::FdtBlob;
use dtfixup::error::FdtError;
use dtfixup::fdt::Fdt;
use dtfixup::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};

fn tree() -> DeviceTree {
    let mut tree = DeviceTree::new();
    tree.boot_cpuid_phys = 1;
    tree.root
        .add_property(DeviceTreeProperty::u32("#address-cells", 2));
    tree.root.add_property(DeviceTreeProperty::u32("#size-cells", 2));
    tree.root.add_child(
        DeviceTreeNode::builder("chosen")
            .property(DeviceTreeProperty::string("bootargs", "console=ttyS0"))
            .build(),
    );
    tree.root.add_child(
        DeviceTreeNode::builder("soc")
            .property(DeviceTreeProperty::empty("ranges"))
            .child(
                DeviceTreeNode::builder("uart@10000000")
                    .property(DeviceTreeProperty::string("compatible", "ns16550a"))
                    .build(),
            )
            .build(),
    );
    tree
}

#[test]
fn edits_match_the_model() {
    let mut expected = tree();
    let mut blob = FdtBlob::new(expected.to_dtb(), 4096).unwrap();
    blob.grow(1024).unwrap();

    let chosen = blob.node_offset("/chosen").unwrap().unwrap();
    blob.set_property_str(chosen, "bootargs", "console=ttyS0,115200 earlycon")
        .unwrap();
    blob.set_property_str(chosen, "stdout-path", "/soc/uart@10000000")
        .unwrap();
    let uart = blob.node_offset_by_compatible("ns16550a").unwrap().unwrap();
    blob.set_property_u32(uart, "clock-frequency", 3_686_400)
        .unwrap();
    let soc = blob.node_offset("/soc").unwrap().unwrap();
    let plic = blob.add_subnode(soc, "plic@c000000").unwrap();
    blob.set_property(plic, "reg", &[0, 0, 0, 0, 0x0c, 0, 0, 0])
        .unwrap();

    let chosen = expected.find_node_mut("/chosen").unwrap();
    chosen.add_property(DeviceTreeProperty::string(
        "bootargs",
        "console=ttyS0,115200 earlycon",
    ));
    chosen.add_property(DeviceTreeProperty::string("stdout-path", "/soc/uart@10000000"));
    expected
        .find_node_mut("/soc/uart@10000000")
        .unwrap()
        .add_property(DeviceTreeProperty::u32("clock-frequency", 3_686_400));
    expected.find_node_mut("/soc").unwrap().add_child(
        DeviceTreeNode::builder("plic@c000000")
            .property(DeviceTreeProperty::cells("reg", &[0, 0x0c00_0000]))
            .build(),
    );

    let actual = DeviceTree::from_fdt(&blob.fdt()).unwrap();
    assert_eq!(actual, expected);
    assert_eq!(actual.to_dtb(), expected.to_dtb());
    assert_eq!(blob.fdt().boot_cpuid_phys(), 1);
}

#[test]
fn open_into_repacks() {
    let dtb = tree().to_dtb();
    let mut blob = FdtBlob::new(dtb.clone(), 1024).unwrap();
    blob.open_into(1024).unwrap();
    assert_eq!(blob.totalsize(), 1024);
    assert_eq!(blob.free_space(), 1024 - dtb.len());
    assert_eq!(Fdt::new(blob.as_bytes()).unwrap().totalsize(), 1024);

    blob.open_into(dtb.len()).unwrap();
    assert_eq!(blob.into_bytes(), dtb);
}

#[test]
fn new_rejects_oversized_and_invalid_blobs() {
    let dtb = tree().to_dtb();
    assert_eq!(
        FdtBlob::new(dtb.clone(), dtb.len() - 1),
        Err(FdtError::NoSpace {
            requested: dtb.len(),
            limit: dtb.len() - 1,
        })
    );
    let mut corrupt = dtb;
    corrupt[0] = 0;
    assert!(matches!(
        FdtBlob::new(corrupt, 4096),
        Err(FdtError::Parse(_))
    ));
}

#[test]
fn stale_offsets_are_rejected() {
    let mut blob = FdtBlob::new(tree().to_dtb(), 4096).unwrap();
    blob.grow(256).unwrap();
    let chosen = blob.node_offset("/chosen").unwrap().unwrap();
    let root = blob.node_offset("/").unwrap().unwrap();
    blob.set_property_str(root, "model", "board").unwrap();

    // `chosen` now points at the root's new property.
    assert!(blob.set_property_empty(chosen, "x").is_err());
    let chosen = blob.node_offset("/chosen").unwrap().unwrap();
    blob.set_property_empty(chosen, "x").unwrap();
}
