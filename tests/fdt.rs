// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![cfg(feature = "write")]

use dtfixup::fdt::Fdt;
use dtfixup::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};
use dtfixup::standard::Status;

/// A small tree exercising nesting, unit addresses and standard properties.
fn test_tree() -> DeviceTree {
    let mut tree = DeviceTree::new();
    tree.root
        .add_property(DeviceTreeProperty::u32("#address-cells", 1));
    tree.root.add_property(DeviceTreeProperty::u32("#size-cells", 1));
    tree.root
        .add_property(DeviceTreeProperty::string("model", "test board"));
    tree.root.add_child(
        DeviceTreeNode::builder("test-props")
            .property(DeviceTreeProperty::u32("u32-prop", 0x1234_5678))
            .property(DeviceTreeProperty::new(
                "u64-prop",
                0x1122_3344_5566_7788u64.to_be_bytes(),
            ))
            .property(DeviceTreeProperty::string("str-prop", "hello world"))
            .property(DeviceTreeProperty::string_list(
                "str-list-prop",
                &["first", "second", "third"],
            ))
            .build(),
    );
    tree.root.add_child(
        DeviceTreeNode::builder("bus@40000000")
            .property(DeviceTreeProperty::u32("#address-cells", 2))
            .property(DeviceTreeProperty::u32("#size-cells", 2))
            .property(DeviceTreeProperty::string_list(
                "compatible",
                &["abc,def", "simple-bus"],
            ))
            .property(DeviceTreeProperty::cells("reg", &[0x4000_0000, 0x1000]))
            .property(DeviceTreeProperty::string("status", "fail"))
            .property(DeviceTreeProperty::u32("phandle", 0x1234))
            .child(
                DeviceTreeNode::builder("device@1,3000")
                    .property(DeviceTreeProperty::string("compatible", "abc,def"))
                    .property(DeviceTreeProperty::cells(
                        "reg",
                        &[0x1, 0x3000, 0, 0x20, 0, 0xfe00, 0, 0x100],
                    ))
                    .build(),
            )
            .build(),
    );
    tree
}

#[test]
fn read_child_nodes() {
    let dtb = test_tree().to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();
    let root = fdt.root().unwrap();
    let mut children = root.children();

    let child = children.next().unwrap().unwrap();
    assert_eq!(child.name().unwrap(), "test-props");
    assert_eq!(child.name_without_address().unwrap(), "test-props");

    let child = children.next().unwrap().unwrap();
    assert_eq!(child.name().unwrap(), "bus@40000000");
    assert_eq!(child.name_without_address().unwrap(), "bus");

    assert!(children.next().is_none());
}

#[test]
fn read_prop_values() {
    let dtb = test_tree().to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();
    let node = fdt.find_node("/test-props").unwrap().unwrap();
    let mut props = node.properties();

    let prop = props.next().unwrap().unwrap();
    assert_eq!(prop.name(), "u32-prop");
    assert_eq!(prop.as_u32().unwrap(), 0x1234_5678);

    let prop = props.next().unwrap().unwrap();
    assert_eq!(prop.name(), "u64-prop");
    assert_eq!(prop.as_u64().unwrap(), 0x1122_3344_5566_7788);

    let prop = props.next().unwrap().unwrap();
    assert_eq!(prop.name(), "str-prop");
    assert_eq!(prop.as_str().unwrap(), "hello world");

    let prop = props.next().unwrap().unwrap();
    assert_eq!(prop.name(), "str-list-prop");
    let str_list: Vec<_> = prop.as_str_list().collect();
    assert_eq!(str_list, ["first", "second", "third"]);

    assert!(props.next().is_none());
    assert!(node.property("non-existent-prop").unwrap().is_none());
}

#[test]
fn standard_properties() {
    let dtb = test_tree().to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();
    let test_props = fdt.find_node("/test-props").unwrap().unwrap();
    let bus = fdt.find_node("/bus").unwrap().unwrap();

    // Default values.
    assert_eq!(test_props.address_cells().unwrap(), 2);
    assert_eq!(test_props.size_cells().unwrap(), 1);
    assert_eq!(test_props.status().unwrap(), Status::Okay);
    assert_eq!(test_props.phandle().unwrap(), None);
    assert!(test_props.compatible().unwrap().is_none());
    assert!(test_props.reg().unwrap().is_none());

    // Explicit values.
    assert_eq!(bus.address_cells().unwrap(), 2);
    assert_eq!(bus.status().unwrap(), Status::Fail);
    assert_eq!(bus.phandle().unwrap(), Some(0x1234));
    assert_eq!(
        bus.compatible().unwrap().unwrap().collect::<Vec<_>>(),
        ["abc,def", "simple-bus"]
    );
    assert!(bus.is_compatible("simple-bus").unwrap());
    let reg = bus.first_reg().unwrap().unwrap();
    assert_eq!(reg.address::<u32>(), Ok(0x4000_0000));
    assert_eq!(reg.size::<u32>(), Ok(0x1000));

    let device = bus.child("device").unwrap().unwrap();
    let reg: Vec<_> = device.reg().unwrap().unwrap().collect();
    assert_eq!(reg.len(), 2);
    assert_eq!(reg[0].address::<u64>().unwrap(), 0x1_0000_3000);
    assert_eq!(reg[0].size::<u64>().unwrap(), 0x20);
    assert_eq!(reg[1].address::<u64>().unwrap(), 0xfe00);
    assert_eq!(reg[1].size::<u64>().unwrap(), 0x100);
    assert!(reg[0].address::<u32>().is_err());
}

#[test]
fn find_node_by_path() {
    let dtb = test_tree().to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();

    let root = fdt.find_node("/").unwrap().unwrap();
    assert_eq!(root.name().unwrap(), "");

    let device = fdt.find_node("/bus@40000000/device@1,3000").unwrap().unwrap();
    assert_eq!(device.name().unwrap(), "device@1,3000");
    assert_eq!(
        fdt.find_node("/bus/device").unwrap().unwrap().offset(),
        device.offset()
    );

    assert!(fdt.find_node("/bus@50000000").unwrap().is_none());
    assert!(fdt.find_node("/x").unwrap().is_none());
    assert!(fdt.find_node("").unwrap().is_none());
}

#[test]
fn find_compatible_depth_first() {
    let dtb = test_tree().to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();

    let node = fdt.find_compatible("abc,def").unwrap().unwrap();
    assert_eq!(node.name().unwrap(), "bus@40000000");
    assert!(fdt.find_compatible("simple-bus").unwrap().is_some());
    assert!(fdt.find_compatible("abc").unwrap().is_none());

    let mut tree = test_tree();
    tree.root
        .add_property(DeviceTreeProperty::string("compatible", "abc,def"));
    let dtb = tree.to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();
    let node = fdt.find_compatible("abc,def").unwrap().unwrap();
    assert_eq!(node.name().unwrap(), "");
    let node = fdt.find_compatible_descendant("abc,def").unwrap().unwrap();
    assert_eq!(node.name().unwrap(), "bus@40000000");
    assert_eq!(node.parent_address_space().address_cells, 1);
}

#[test]
fn name_outlives_fdt_and_node() {
    let dtb = test_tree().to_dtb();
    let name = {
        let fdt = Fdt::new(&dtb).unwrap();
        let node = fdt.find_node("/test-props").unwrap().unwrap();
        node.name().unwrap()
    };

    assert_eq!(name, "test-props");
}

#[test]
fn pretty_print() {
    let dtb = test_tree().to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();
    let expected = "\
/dts-v1/;

/ {
    #address-cells = <0x01>;
    #size-cells = <0x01>;
    model = \"test board\";

    test-props {
        u32-prop = <0x12345678>;
        u64-prop = <0x11223344 0x55667788>;
        str-prop = \"hello world\";
        str-list-prop = \"first\", \"second\", \"third\";
    };

    bus@40000000 {
        #address-cells = <0x02>;
        #size-cells = <0x02>;
        compatible = \"abc,def\", \"simple-bus\";
        reg = <0x40000000 0x1000>;
        status = \"fail\";
        phandle = <0x1234>;

        device@1,3000 {
            compatible = \"abc,def\";
            reg = <0x01 0x3000 0x00 0x20 0x00 0xfe00 0x00 0x100>;
        };
    };
};
";
    assert_eq!(fdt.to_string(), expected);
}

#[test]
fn round_trip() {
    let tree = test_tree();
    let dtb = tree.to_dtb();
    let fdt = Fdt::new(&dtb).unwrap();
    let ir = DeviceTree::from_fdt(&fdt).unwrap();
    assert_eq!(ir, tree);
    assert_eq!(ir.to_dtb(), dtb);
}
