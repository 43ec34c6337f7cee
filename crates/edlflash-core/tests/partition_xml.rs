//! Tests for partition-table decoding and command-document encoding.

use edlflash_core::partition::{Lun, PartitionRecord, PartitionTable};
use edlflash_core::xml::{
    decode_partition_table, encode_erase, encode_misc_reboot, encode_program, encode_read,
    parse_command_document, CommandKind, MiscTarget,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;

/// Load a fixture file from tests/fixtures/
fn load_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);

    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

fn fixture_table() -> PartitionTable {
    let records = decode_partition_table(&load_fixture("rawprogram0.xml"))
        .expect("fixture should decode");
    let mut table = PartitionTable::new();
    table.load(records);
    table
}

#[test]
fn test_decode_fixture_skips_non_program_elements() {
    let table = fixture_table();
    assert_eq!(table.len(), 6, "the <read> element is not a partition");

    let names: Vec<_> = table.iter().map(|r| r.partition_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["ssd", "persist", "misc", "super", "userdata", "last_parti"]
    );
    assert!(table.iter().all(|r| !r.selected && r.image_path.is_empty()));
}

#[test]
fn test_round_trip_preserves_defined_fields() {
    let mut original = fixture_table();
    original.toggle_all();

    let xml = encode_program(&original).to_xml().unwrap();
    let decoded = decode_partition_table(&xml).unwrap();

    assert_eq!(decoded.len(), original.len());
    for (before, after) in original.iter().zip(decoded.iter()) {
        assert_eq!(after.lun, before.lun);
        assert_eq!(after.partition_name, before.partition_name);
        assert_eq!(after.start_sector, before.start_sector);
        assert_eq!(after.sector_count, before.sector_count);
        assert_eq!(after.sparse, before.sparse);
        assert_eq!(after.size_kb_value(), before.size_kb_value());
        assert_eq!(after.size_kb, before.size_kb);
        // No XML representation: reset on import
        assert!(!after.selected);
        assert_eq!(after.image_path, "");
    }
}

#[test]
fn test_lun_text_survives_round_trip() {
    let xml = r#"<data>
  <program label="persist" physical_partition_number="05" size_in_KB="32768.0" start_sector="8" num_partition_sectors="8192" sparse="false"/>
  <program label="fsg" physical_partition_number=" 5 " size_in_KB="2048.0" start_sector="6" num_partition_sectors="512" sparse="false"/>
</data>"#;
    let mut table = PartitionTable::new();
    table.load(decode_partition_table(xml).unwrap());
    table.toggle_all();

    let encoded = encode_program(&table);
    assert_eq!(
        encoded.elements[0].get("physical_partition_number"),
        Some("05")
    );
    // Still numeric, so the byte offset is written
    assert_eq!(encoded.elements[0].get("start_byte_hex"), Some("0x8000"));

    let decoded = decode_partition_table(&encoded.to_xml().unwrap()).unwrap();
    assert_eq!(decoded[0].lun.as_str(), "05");
    assert_eq!(decoded[0].lun, table.get(0).unwrap().lun);
    assert_eq!(decoded[1].lun.as_str(), " 5 ");
    assert_eq!(decoded[1].lun.number(), Some(5));
}

#[test]
fn test_program_example_row() {
    let mut table = PartitionTable::new();
    table.load(vec![PartitionRecord::new(0u32, "misc", "128KB", "8200", "256", "false")
        .with_selected(true)
        .with_image_path("misc.img")]);

    let doc = encode_program(&table);
    assert_eq!(doc.kind, CommandKind::Program);
    assert_eq!(doc.elements.len(), 1);
    let elem = &doc.elements[0];
    assert_eq!(elem.get("start_byte_hex"), Some("0x2008000"));
    assert_eq!(elem.get("size_in_KB"), Some("128"));
    assert_eq!(elem.get("filename"), Some("misc.img"));
    assert_eq!(elem.get("start_sector"), Some("8200"));
}

#[test]
fn test_start_byte_hex_rules() {
    let mut table = PartitionTable::new();
    table.load(vec![
        PartitionRecord::new(0u32, "a", "4KB", "6", "1", "false").with_selected(true),
        PartitionRecord::new("nand", "b", "4KB", "6", "1", "false").with_selected(true),
        PartitionRecord::new(2u32, "c", "4KB", "1048576", "1", "false").with_selected(true),
    ]);

    let doc = encode_program(&table);
    let hex: Vec<_> = doc
        .elements
        .iter()
        .map(|e| e.get("start_byte_hex").unwrap())
        .collect();
    assert_eq!(hex, vec!["0x6000", "", "0x100000000"]);
    assert_eq!(doc.elements[1].get("physical_partition_number"), Some("nand"));
}

#[test]
fn test_symbolic_start_sector_has_no_byte_offset() {
    let table = fixture_table();
    let last = table.find_by_name("last_parti").unwrap();
    assert_eq!(last.lun, Lun::from(0u32));
    assert_eq!(last.start_byte_hex(), "");
}

#[test]
fn test_read_always_raw() {
    let mut table = fixture_table();
    table.toggle_all();

    let doc = encode_read(&table);
    assert_eq!(doc.elements.len(), 6);
    assert!(doc.elements.iter().all(|e| e.get("sparse") == Some("false")));

    let super_elem = doc
        .elements
        .iter()
        .find(|e| e.get("label") == Some("super"))
        .unwrap();
    assert_eq!(super_elem.get("filename"), Some("super.img"));
}

#[test]
fn test_erase_only_selected() {
    let mut table = fixture_table();
    table.set_selected(1, true);
    table.set_selected(3, true);

    let doc = encode_erase(&table);
    let labels: Vec<_> = doc.elements.iter().map(|e| e.get("label").unwrap()).collect();
    assert_eq!(labels, vec!["persist", "super"]);
}

#[test]
fn test_misc_reboot_first_match_wins() {
    let mut table = PartitionTable::new();
    table.load(vec![
        PartitionRecord::new(4u32, "misc", "1024KB", "40", "256", "false"),
        PartitionRecord::new(0u32, "misc", "1024KB", "8200", "256", "false")
            .with_image_path("misc.img"),
    ]);

    let doc = encode_misc_reboot(&table, MiscTarget::Recovery).unwrap();
    assert_eq!(doc.elements.len(), 1);
    let elem = &doc.elements[0];
    assert_eq!(elem.get("physical_partition_number"), Some("4"));
    assert_eq!(elem.get("filename"), Some("misc_torecovery.img"));
}

#[test]
fn test_encoded_document_parses_as_data_root() {
    let mut table = fixture_table();
    table.toggle_all();

    let xml = encode_erase(&table).to_xml().unwrap();
    let doc = parse_command_document(&xml).unwrap();
    assert_eq!(doc.root, "data");
    assert_eq!(doc.elements_named("erase").count(), 6);
}

#[test]
fn test_empty_write_document_is_valid_xml() {
    let table = fixture_table();
    let xml = encode_program(&table).to_xml().unwrap();
    let doc = parse_command_document(&xml).unwrap();
    assert_eq!(doc.root, "data");
    assert!(doc.children.is_empty());
    // ...but it is not an importable partition table
    assert!(decode_partition_table(&xml).is_err());
}
