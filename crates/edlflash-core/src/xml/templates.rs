//! Static command templates
//!
//! Fixed XML fragments keyed by command name. The advanced panel populates
//! its editor from these; the user may then change the text freely before
//! it is submitted, so nothing here is enforced as a shape.

use super::error::XmlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Command selector for command documents and the advanced panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Dump sectors to a file
    Read,
    /// Write a file to sectors
    Program,
    /// Erase sectors
    Erase,
    /// Patch bytes in place (GPT fix-ups)
    Patch,
    /// Reset or power off
    Power,
    /// Start a SHA-256 digest
    Sha256Init,
    /// Transfer configuration
    TransferCfg,
    /// Verification ping
    Verify,
    /// No-op ping
    Nop,
    /// Storage geometry query
    GetStorageInfo,
}

impl CommandKind {
    /// Every command with a template
    pub const ALL: [CommandKind; 10] = [
        CommandKind::Read,
        CommandKind::Program,
        CommandKind::Erase,
        CommandKind::Patch,
        CommandKind::Power,
        CommandKind::Sha256Init,
        CommandKind::TransferCfg,
        CommandKind::Verify,
        CommandKind::Nop,
        CommandKind::GetStorageInfo,
    ];

    /// Element name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Read => "read",
            CommandKind::Program => "program",
            CommandKind::Erase => "erase",
            CommandKind::Patch => "patch",
            CommandKind::Power => "power",
            CommandKind::Sha256Init => "sha256init",
            CommandKind::TransferCfg => "transfercfg",
            CommandKind::Verify => "verify",
            CommandKind::Nop => "nop",
            CommandKind::GetStorageInfo => "getstorageinfo",
        }
    }

    /// Label shown in the command picker
    pub fn label(&self) -> &'static str {
        match self {
            CommandKind::Read => "Read",
            CommandKind::Program => "Program",
            CommandKind::Erase => "Erase",
            CommandKind::Patch => "Patch",
            CommandKind::Power => "Power",
            CommandKind::Sha256Init => "Sha256init",
            CommandKind::TransferCfg => "Transfercfg",
            CommandKind::Verify => "Verify",
            CommandKind::Nop => "Nop",
            CommandKind::GetStorageInfo => "Getstorageinfo",
        }
    }

    /// Default document for this command
    pub fn template(&self) -> &'static str {
        match self {
            CommandKind::Read => READ_TEMPLATE,
            CommandKind::Program => PROGRAM_TEMPLATE,
            CommandKind::Erase => ERASE_TEMPLATE,
            CommandKind::Patch => PATCH_TEMPLATE,
            CommandKind::Power => POWER_TEMPLATE,
            CommandKind::Sha256Init => SHA256INIT_TEMPLATE,
            CommandKind::TransferCfg => TRANSFERCFG_TEMPLATE,
            CommandKind::Verify => VERIFY_TEMPLATE,
            CommandKind::Nop => NOP_TEMPLATE,
            CommandKind::GetStorageInfo => GETSTORAGEINFO_TEMPLATE,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = XmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| XmlError::UnknownCommand(s.to_string()))
    }
}

/// Editable command for the advanced panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedCommand {
    /// Selected command
    pub kind: CommandKind,
    /// Free-form XML, initially the template for `kind`
    pub content: String,
}

impl AdvancedCommand {
    /// Populate the editor from the template of `kind`
    pub fn from_kind(kind: CommandKind) -> Self {
        Self {
            kind,
            content: kind.template().to_string(),
        }
    }

    /// Switch the selected command, discarding any edits
    pub fn select(&mut self, kind: CommandKind) {
        *self = Self::from_kind(kind);
    }
}

impl Default for AdvancedCommand {
    fn default() -> Self {
        Self::from_kind(CommandKind::Power)
    }
}

/// Default `<read>` document
pub const READ_TEMPLATE: &str = "<?xml version=\"1.0\" ?>\n<data>\n\t<read filename=\"misc.img\" physical_partition_number=\"0\" label=\"misc\" start_sector=\"8200\" num_partition_sectors=\"256\" SECTOR_SIZE_IN_BYTES=\"4096\" sparse=\"false\"/>\n</data>";

/// Default `<program>` document
pub const PROGRAM_TEMPLATE: &str = "<?xml version=\"1.0\" ?>\n<data>\n\t<program start_sector=\"8200\" size_in_KB=\"1024.0\" physical_partition_number=\"0\" partofsingleimage=\"false\" file_sector_offset=\"0\" num_partition_sectors=\"256\" readbackverify=\"false\" filename=\"misc.img\" sparse=\"false\" start_byte_hex=\"0x2008000\" SECTOR_SIZE_IN_BYTES=\"4096\" label=\"misc\"/>\n</data>";

/// Default `<erase>` document
pub const ERASE_TEMPLATE: &str = "<?xml version=\"1.0\" ?>\n<data>\n\t<erase SECTOR_SIZE_IN_BYTES=\"4096\" physical_partition_number=\"0\" start_sector=\"8200\" num_partition_sectors=\"256\"/>\n</data>";

/// Default `<power>` document
pub const POWER_TEMPLATE: &str =
    "<?xml version=\"1.0\" ?>\n<data>\n\t<power DelayInSeconds=\"0\" value=\"reset\" />\n</data>";

/// Default `<sha256init>` document
pub const SHA256INIT_TEMPLATE: &str =
    "<?xml version=\"1.0\" ?>\n<data>\n\t<sha256init Verbose=\"1\"/>\n</data>";

/// Default `<transfercfg>` document
pub const TRANSFERCFG_TEMPLATE: &str = "<?xml version=\"1.0\" ?>\n<data>\n\t<transfercfg reboot_type=\"off\" timeout_in_sec=\"90\" />\n</data>";

/// Default `<verify>` document
pub const VERIFY_TEMPLATE: &str =
    "<?xml version=\"1.0\" ?>\n<data>\n\t<verify value=\"ping\" EnableVip=\"1\"/>\n</data>";

/// Default `<nop>` document
pub const NOP_TEMPLATE: &str =
    "<?xml version=\"1.0\" ?>\n<data>\n\t<nop verbose=\"0\" value=\"ping\"/>\n</data>";

/// Default `<getstorageinfo>` document
pub const GETSTORAGEINFO_TEMPLATE: &str =
    "<?xml version=\"1.0\" ?><data><getstorageinfo physical_partition_number=\"0\" /></data>";

/// GPT repair directives for LUN 0.
///
/// Values are symbolic and evaluated by the device loader, never here.
pub const PATCH_TEMPLATE: &str = r#"<?xml version="1.0" ?>
<data>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="16" filename="DISK" physical_partition_number="0" size_in_bytes="4" start_sector="1" value="0" what="Zero Out Header CRC in Primary Header."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="32" filename="DISK" physical_partition_number="0" size_in_bytes="8" start_sector="1" value="NUM_DISK_SECTORS-1." what="Update Primary Header with BackupGPT Header Location."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="48" filename="DISK" physical_partition_number="0" size_in_bytes="8" start_sector="1" value="NUM_DISK_SECTORS-6." what="Update Primary Header with LastUseableLBA."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="88" filename="DISK" physical_partition_number="0" size_in_bytes="4" start_sector="1" value="CRC32(2,16384)" what="Update Primary Header with CRC of Partition Array."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="16" filename="DISK" physical_partition_number="0" size_in_bytes="4" start_sector="1" value="CRC32(1,92)" what="Update Primary Header with CRC of Primary Header."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="16" filename="DISK" physical_partition_number="0" size_in_bytes="4" start_sector="NUM_DISK_SECTORS-1." value="0" what="Zero Out Header CRC in Backup Header."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="24" filename="DISK" physical_partition_number="0" size_in_bytes="8" start_sector="NUM_DISK_SECTORS-1." value="NUM_DISK_SECTORS-1." what="Update Backup Header with CurrentLBA."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="48" filename="DISK" physical_partition_number="0" size_in_bytes="8" start_sector="NUM_DISK_SECTORS-1." value="NUM_DISK_SECTORS-6." what="Update Backup Header with LastUseableLBA."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="72" filename="DISK" physical_partition_number="0" size_in_bytes="8" start_sector="NUM_DISK_SECTORS-1." value="NUM_DISK_SECTORS-5." what="Update Backup Header with Partition Array Location."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="88" filename="DISK" physical_partition_number="0" size_in_bytes="4" start_sector="NUM_DISK_SECTORS-1." value="CRC32(NUM_DISK_SECTORS-5.,16384)" what="Update Backup Header with CRC of Partition Array."/>
	<patch SECTOR_SIZE_IN_BYTES="4096" byte_offset="16" filename="DISK" physical_partition_number="0" size_in_bytes="4" start_sector="NUM_DISK_SECTORS-1." value="CRC32(NUM_DISK_SECTORS-1.,92)" what="Update Backup Header with CRC of Backup Header."/>
</data>"#;
