//! Command document reader.
//!
//! Reads any `<data>` command document into a flat element list, and decodes
//! rawprogram-style partition tables (repeated `<program>` children) into
//! partition records.

use super::error::XmlError;
use super::writer::{CommandElement, ROOT_ELEMENT};
use crate::partition::PartitionRecord;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A parsed document: the root name and its direct child elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Root element name
    pub root: String,
    /// `(element name, attributes)` for each child of the root, in order
    pub children: Vec<(String, CommandElement)>,
}

impl ParsedDocument {
    /// Children named `name`, in document order
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CommandElement> {
        self.children
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, e)| e)
    }
}

/// Parse a command document, keeping only the root and its direct children.
///
/// Deeper nesting is skipped; text content is ignored.
pub fn parse_command_document(xml: &str) -> Result<ParsedDocument, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc: Option<ParsedDocument> = None;
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                record_element(&mut doc, depth, e);
                depth = depth.saturating_add(1);
            }
            Ok(Event::Empty(ref e)) => {
                record_element(&mut doc, depth, e);
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlError::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    doc.ok_or(XmlError::MissingRoot)
}

fn record_element(doc: &mut Option<ParsedDocument>, depth: usize, e: &BytesStart) {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    match (depth, doc.as_mut()) {
        (0, None) => {
            *doc = Some(ParsedDocument {
                root: name,
                children: Vec::new(),
            })
        }
        (1, Some(doc)) => doc.children.push((name, parse_attributes(e))),
        _ => {}
    }
}

fn parse_attributes(e: &BytesStart) -> CommandElement {
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            (key, value)
        })
        .collect();
    CommandElement { attributes }
}

/// Decode a partition-table document into unselected records with no image.
///
/// The root must be `<data>` and hold at least one `<program>` child.
/// Missing attributes decode as empty strings; the size gets a "KB" suffix.
pub fn decode_partition_table(xml: &str) -> Result<Vec<PartitionRecord>, XmlError> {
    let doc = parse_command_document(xml)?;
    if doc.root != ROOT_ELEMENT {
        return Err(XmlError::UnexpectedRoot(doc.root));
    }

    let records: Vec<PartitionRecord> = doc
        .elements_named("program")
        .map(|elem| {
            let attr = |name: &str| elem.get(name).unwrap_or_default().to_string();
            PartitionRecord::new(
                attr("physical_partition_number"),
                attr("label"),
                format!("{}KB", attr("size_in_KB")),
                attr("start_sector"),
                attr("num_partition_sectors"),
                attr("sparse"),
            )
        })
        .collect();

    if records.is_empty() {
        return Err(XmlError::NoProgramElements);
    }
    Ok(records)
}
