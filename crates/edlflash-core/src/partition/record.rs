//! A single row of the partition table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sector size used for every partition on UFS storage.
///
/// Never stored per record; written into each command element.
pub const SECTOR_SIZE_IN_BYTES: u64 = 4096;

/// Physical partition (LUN) identifier.
///
/// Decided once when a record is ingested. Only numeric LUNs get a
/// `start_byte_hex` value when encoded. The attribute text is kept as read
/// so that `"05"` is written back as `"05"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Lun {
    /// A LUN number such as `0` or `5`
    Numeric {
        /// Parsed number
        value: u32,
        /// Text it was parsed from
        text: String,
    },
    /// Anything that does not parse as a number, kept verbatim
    Symbolic(String),
}

impl Lun {
    /// Parse a LUN from its attribute text
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<u32>() {
            Ok(value) => Lun::Numeric {
                value,
                text: text.to_string(),
            },
            Err(_) => Lun::Symbolic(text.to_string()),
        }
    }

    /// Numeric value, if this LUN is numeric
    pub fn number(&self) -> Option<u32> {
        match self {
            Lun::Numeric { value, .. } => Some(*value),
            Lun::Symbolic(_) => None,
        }
    }

    /// Attribute text, exactly as ingested
    pub fn as_str(&self) -> &str {
        match self {
            Lun::Numeric { text, .. } => text,
            Lun::Symbolic(text) => text,
        }
    }
}

impl fmt::Display for Lun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Lun {
    fn from(text: String) -> Self {
        Lun::parse(&text)
    }
}

impl From<&str> for Lun {
    fn from(text: &str) -> Self {
        Lun::parse(text)
    }
}

impl From<u32> for Lun {
    fn from(value: u32) -> Self {
        Lun::Numeric {
            value,
            text: value.to_string(),
        }
    }
}

impl From<Lun> for String {
    fn from(lun: Lun) -> Self {
        match lun {
            Lun::Numeric { text, .. } => text,
            Lun::Symbolic(text) => text,
        }
    }
}

/// One row in the partition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionRecord {
    /// Whether this row takes part in the next batch operation
    pub selected: bool,
    /// Physical partition number
    pub lun: Lun,
    /// Partition label, e.g. "misc"
    pub partition_name: String,
    /// Size with its unit suffix, e.g. "128KB"
    #[serde(rename = "sizeKB")]
    pub size_kb: String,
    /// First sector index
    pub start_sector: String,
    /// Number of sectors
    pub sector_count: String,
    /// Local image to flash into this partition (may be empty)
    pub image_path: String,
    /// "true" when the image is sparse-encoded
    pub sparse: String,
}

impl PartitionRecord {
    /// Create an unselected record with no image assigned
    pub fn new(
        lun: impl Into<Lun>,
        partition_name: impl Into<String>,
        size_kb: impl Into<String>,
        start_sector: impl Into<String>,
        sector_count: impl Into<String>,
        sparse: impl Into<String>,
    ) -> Self {
        Self {
            selected: false,
            lun: lun.into(),
            partition_name: partition_name.into(),
            size_kb: size_kb.into(),
            start_sector: start_sector.into(),
            sector_count: sector_count.into(),
            image_path: String::new(),
            sparse: sparse.into(),
        }
    }

    /// Builder-style selection flag
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Builder-style image path
    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = path.into();
        self
    }

    /// Size with the two-character unit suffix removed.
    ///
    /// Strings shorter than two characters are returned unchanged.
    pub fn size_kb_value(&self) -> &str {
        strip_unit_suffix(&self.size_kb)
    }

    /// Byte offset of the first sector as `0x`-prefixed lowercase hex.
    ///
    /// Empty when the LUN is symbolic or the start sector is not a number.
    pub fn start_byte_hex(&self) -> String {
        if self.lun.number().is_none() {
            return String::new();
        }
        self.start_sector
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|sector| sector.checked_mul(SECTOR_SIZE_IN_BYTES))
            .map(|bytes| format!("0x{:x}", bytes))
            .unwrap_or_default()
    }
}

fn strip_unit_suffix(size: &str) -> &str {
    let mut tail = size.char_indices().rev();
    match (tail.next(), tail.next()) {
        (Some(_), Some((cut, _))) => &size[..cut],
        _ => size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lun_parse() {
        assert_eq!(Lun::parse("0"), Lun::from(0u32));
        assert_eq!(Lun::parse(" 5 ").number(), Some(5));
        assert_eq!(Lun::parse(" 5 ").to_string(), " 5 ");
        assert_eq!(Lun::parse("05").number(), Some(5));
        assert_eq!(Lun::parse("05").as_str(), "05");
        assert_ne!(Lun::parse("05"), Lun::from(5u32));
        assert_eq!(Lun::parse("ufs"), Lun::Symbolic("ufs".to_string()));
        assert_eq!(Lun::parse("ufs").to_string(), "ufs");
    }

    #[test]
    fn test_size_suffix_strip() {
        let rec = PartitionRecord::new(0u32, "misc", "128KB", "8200", "256", "false");
        assert_eq!(rec.size_kb_value(), "128");

        let rec = PartitionRecord::new(0u32, "misc", "K", "8200", "256", "false");
        assert_eq!(rec.size_kb_value(), "K");

        let rec = PartitionRecord::new(0u32, "misc", "KB", "8200", "256", "false");
        assert_eq!(rec.size_kb_value(), "");
    }

    #[test]
    fn test_start_byte_hex() {
        let rec = PartitionRecord::new(0u32, "misc", "128KB", "8200", "256", "false");
        assert_eq!(rec.start_byte_hex(), "0x2008000");

        let rec = PartitionRecord::new("spinor", "misc", "128KB", "8200", "256", "false");
        assert_eq!(rec.start_byte_hex(), "");

        let rec = PartitionRecord::new(4u32, "last", "0KB", "NUM_DISK_SECTORS-5.", "0", "false");
        assert_eq!(rec.start_byte_hex(), "");
    }

    #[test]
    fn test_record_serializes_lun_as_string() {
        let rec = PartitionRecord::new(3u32, "boot_a", "98304KB", "6", "24576", "false");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["lun"], "3");
        assert_eq!(json["sizeKB"], "98304KB");
        assert_eq!(json["partitionName"], "boot_a");
    }
}
