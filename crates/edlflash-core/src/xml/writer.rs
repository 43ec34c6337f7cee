//! Command document writer.
//!
//! Renders a selection of the partition table into the `<data>` documents
//! the flashing backend consumes: one element per row, all of one kind.

use super::error::XmlError;
use super::templates::CommandKind;
use crate::partition::{PartitionRecord, PartitionTable, SECTOR_SIZE_IN_BYTES};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// Root element of every command document
pub const ROOT_ELEMENT: &str = "data";

/// One command element: attribute name/value pairs in output order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandElement {
    /// `(name, value)` pairs
    pub attributes: Vec<(String, String)>,
}

impl CommandElement {
    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.push((name.to_string(), value.into()));
    }

    /// Value of the first attribute called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A `<data>` document holding zero or more elements of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDocument {
    /// Element name of every child
    pub kind: CommandKind,
    /// Children of `<data>`
    pub elements: Vec<CommandElement>,
}

impl CommandDocument {
    /// Document with no command elements
    pub fn empty(kind: CommandKind) -> Self {
        Self {
            kind,
            elements: Vec::new(),
        }
    }

    /// True when there are no command elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render as XML text
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

        for element in &self.elements {
            let mut elem = BytesStart::new(self.kind.as_str());
            for (name, value) in &element.attributes {
                elem.push_attribute((name.as_str(), value.as_str()));
            }
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

        let result = writer.into_inner();
        Ok(String::from_utf8_lossy(&result).to_string())
    }
}

/// Boot target reached by writing a prepared image into "misc"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscTarget {
    /// Android recovery
    Recovery,
    /// Userspace fastboot
    Fastbootd,
}

impl MiscTarget {
    /// Image written into the misc partition for this target
    pub fn image_name(&self) -> &'static str {
        match self {
            MiscTarget::Recovery => "misc_torecovery.img",
            MiscTarget::Fastbootd => "misc_tofastbootd.img",
        }
    }
}

/// Name of the partition the reboot images are written to
pub const MISC_PARTITION: &str = "misc";

/// One `<erase>` per selected row
pub fn encode_erase(table: &PartitionTable) -> CommandDocument {
    let elements = table
        .selected()
        .map(|record| {
            let mut elem = CommandElement::default();
            elem.push("SECTOR_SIZE_IN_BYTES", SECTOR_SIZE_IN_BYTES.to_string());
            elem.push("label", record.partition_name.as_str());
            elem.push("physical_partition_number", record.lun.to_string());
            elem.push("start_sector", record.start_sector.as_str());
            elem.push("num_partition_sectors", record.sector_count.as_str());
            elem
        })
        .collect();

    CommandDocument {
        kind: CommandKind::Erase,
        elements,
    }
}

/// One `<read>` per selected row, dumped to `<label>.img`.
///
/// `sparse` is always "false": dumps are raw regardless of the row.
pub fn encode_read(table: &PartitionTable) -> CommandDocument {
    let elements = table
        .selected()
        .map(|record| {
            let mut elem = CommandElement::default();
            elem.push("filename", format!("{}.img", record.partition_name));
            elem.push("physical_partition_number", record.lun.to_string());
            elem.push("label", record.partition_name.as_str());
            elem.push("start_sector", record.start_sector.as_str());
            elem.push("num_partition_sectors", record.sector_count.as_str());
            elem.push("SECTOR_SIZE_IN_BYTES", SECTOR_SIZE_IN_BYTES.to_string());
            elem.push("sparse", "false");
            elem
        })
        .collect();

    CommandDocument {
        kind: CommandKind::Read,
        elements,
    }
}

/// One `<program>` per selected row, flashing each row's own image.
///
/// Used both for saving the table to a file and for writing partitions.
pub fn encode_program(table: &PartitionTable) -> CommandDocument {
    let elements = table
        .selected()
        .map(|record| program_element(record, &record.image_path))
        .collect();

    CommandDocument {
        kind: CommandKind::Program,
        elements,
    }
}

/// Single-element program document writing `target`'s image into the
/// first row named "misc". `None` when the table has no such row.
pub fn encode_misc_reboot(table: &PartitionTable, target: MiscTarget) -> Option<CommandDocument> {
    let misc = table.find_by_name(MISC_PARTITION)?;
    Some(CommandDocument {
        kind: CommandKind::Program,
        elements: vec![program_element(misc, target.image_name())],
    })
}

fn program_element(record: &PartitionRecord, filename: &str) -> CommandElement {
    let mut elem = CommandElement::default();
    elem.push("start_sector", record.start_sector.as_str());
    elem.push("size_in_KB", record.size_kb_value());
    elem.push("physical_partition_number", record.lun.to_string());
    elem.push("partofsingleimage", "false");
    elem.push("file_sector_offset", "0");
    elem.push("num_partition_sectors", record.sector_count.as_str());
    elem.push("readbackverify", "false");
    elem.push("filename", filename);
    elem.push("sparse", record.sparse.as_str());
    elem.push("start_byte_hex", record.start_byte_hex());
    elem.push("SECTOR_SIZE_IN_BYTES", SECTOR_SIZE_IN_BYTES.to_string());
    elem.push("label", record.partition_name.as_str());
    elem
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn misc_table() -> PartitionTable {
        let mut table = PartitionTable::new();
        table.load(vec![PartitionRecord::new(0u32, "misc", "128KB", "8200", "256", "false")
            .with_selected(true)
            .with_image_path("misc.img")]);
        table
    }

    #[test]
    fn test_program_element_attributes() {
        let doc = encode_program(&misc_table());
        assert_eq!(doc.elements.len(), 1);

        let attrs: Vec<(&str, &str)> = doc.elements[0]
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            attrs,
            vec![
                ("start_sector", "8200"),
                ("size_in_KB", "128"),
                ("physical_partition_number", "0"),
                ("partofsingleimage", "false"),
                ("file_sector_offset", "0"),
                ("num_partition_sectors", "256"),
                ("readbackverify", "false"),
                ("filename", "misc.img"),
                ("sparse", "false"),
                ("start_byte_hex", "0x2008000"),
                ("SECTOR_SIZE_IN_BYTES", "4096"),
                ("label", "misc"),
            ]
        );
    }

    #[test]
    fn test_read_pins_sparse_false() {
        let mut table = PartitionTable::new();
        table.load(vec![
            PartitionRecord::new(0u32, "super", "9437184KB", "100", "2359296", "true")
                .with_selected(true),
        ]);
        let doc = encode_read(&table);
        assert_eq!(doc.elements[0].get("sparse"), Some("false"));
        assert_eq!(doc.elements[0].get("filename"), Some("super.img"));
        assert_eq!(doc.elements[0].get("size_in_KB"), None);
    }

    #[test]
    fn test_erase_attributes() {
        let doc = encode_erase(&misc_table());
        let elem = &doc.elements[0];
        assert_eq!(elem.get("SECTOR_SIZE_IN_BYTES"), Some("4096"));
        assert_eq!(elem.get("label"), Some("misc"));
        assert_eq!(elem.get("start_sector"), Some("8200"));
        assert_eq!(elem.get("num_partition_sectors"), Some("256"));
        assert_eq!(elem.attributes.len(), 5);
    }

    #[test]
    fn test_to_xml_escapes_and_wraps() {
        let mut table = misc_table();
        table.set_image_path(0, "C:\\img\\a&b.img");
        let xml = encode_program(&table).to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<data>"));
        assert!(xml.contains("</data>"));
        assert!(xml.contains("filename=\"C:\\img\\a&amp;b.img\""));
        assert!(xml.contains("<program "));
    }

    #[test]
    fn test_empty_selection_yields_empty_document() {
        let mut table = misc_table();
        table.set_selected(0, false);
        let doc = encode_erase(&table);
        assert!(doc.is_empty());
        let xml = doc.to_xml().unwrap();
        assert!(!xml.contains("<erase"));
        assert!(xml.contains("<data>"));
    }

    #[test]
    fn test_misc_reboot_uses_target_image() {
        let doc = encode_misc_reboot(&misc_table(), MiscTarget::Fastbootd).unwrap();
        assert_eq!(doc.elements[0].get("filename"), Some("misc_tofastbootd.img"));
        assert_eq!(doc.kind, CommandKind::Program);

        let empty = PartitionTable::new();
        assert!(encode_misc_reboot(&empty, MiscTarget::Recovery).is_none());
    }
}
