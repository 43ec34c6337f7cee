//! Remote call payloads
//!
//! Each variant is one backend command. Serialized as
//! `{"cmd": "<name>", "args": {...}}` with camelCase argument names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A/B slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Slot `a`
    A,
    /// Slot `b`
    B,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("a"),
            Slot::B => f.write_str("b"),
        }
    }
}

/// Files making up a signed loader
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoaderFiles {
    /// Programmer ELF (`prog_firehose_*`)
    pub loader: PathBuf,
    /// Hash table sent ahead of the loader
    pub digest: PathBuf,
    /// Signature over the digest
    pub signature: PathBuf,
}

/// One backend call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum Request {
    /// Free-form command from the advanced panel
    #[serde(rename_all = "camelCase")]
    RunCommand {
        /// Command element name, e.g. "power"
        cmd_type: String,
        /// Working folder for any output files
        path: PathBuf,
        /// XML exactly as edited
        content: String,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Log the key hashes of a loader file
    IdentifyLoader {
        /// Loader file
        path: PathBuf,
    },
    /// Start a bulk flashing session from a firmware folder
    #[serde(rename_all = "camelCase")]
    StartFlashing {
        /// Firmware folder
        path: PathBuf,
        /// Leave LUN 5 untouched
        is_protect_lun5: bool,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Stop the bulk flashing session
    StopFlashing,
    /// Erase the partitions in an `<erase>` document
    #[serde(rename_all = "camelCase")]
    ErasePart {
        /// Erase document
        xml: String,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Read storage and chip information as text
    #[serde(rename_all = "camelCase")]
    ReadDeviceInfo {
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Read the partition tables; the result comes back as an event
    #[serde(rename_all = "camelCase")]
    ReadGpt {
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Dump the partitions in a `<read>` document
    #[serde(rename_all = "camelCase")]
    ReadPart {
        /// Read document
        xml: String,
        /// Folder the dumps are written to
        folder: PathBuf,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Write a program document to disk
    SaveToXml {
        /// Destination file
        path: PathBuf,
        /// Program document
        xml: String,
    },
    /// Upload a loader over Sahara
    #[serde(rename_all = "camelCase")]
    SendLoader {
        /// Programmer ELF
        loader: PathBuf,
        /// Hash table
        digest: PathBuf,
        /// Signature
        sig: PathBuf,
        /// Built-in loader boot mode
        native: bool,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Make a slot active
    #[serde(rename_all = "camelCase")]
    SwitchSlot {
        /// Slot to activate
        slot: Slot,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Flash from a rawprogram file on disk
    WriteFromXml {
        /// rawprogram file
        file_path: PathBuf,
        /// Verbose backend logging
        #[serde(rename = "isDebug")]
        is_debug: bool,
    },
    /// Flash the partitions in a `<program>` document
    #[serde(rename_all = "camelCase")]
    WritePart {
        /// Program document
        xml: String,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Reboot into EDL
    #[serde(rename_all = "camelCase")]
    RebootToEdl {
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Write the fastbootd misc image, then reboot
    #[serde(rename_all = "camelCase")]
    RebootToFastboot {
        /// Single-element program document for "misc"
        xml: String,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Write the recovery misc image, then reboot
    #[serde(rename_all = "camelCase")]
    RebootToRecovery {
        /// Single-element program document for "misc"
        xml: String,
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Reboot into the system
    #[serde(rename_all = "camelCase")]
    RebootToSystem {
        /// Verbose backend logging
        is_debug: bool,
    },
    /// Look up the EDL port
    UpdatePort,
    /// Keep-alive for a running loader
    #[serde(rename_all = "camelCase")]
    SendPing {
        /// Verbose backend logging
        is_debug: bool,
    },
}

impl Request {
    /// Backend command name
    pub fn name(&self) -> &'static str {
        match self {
            Request::RunCommand { .. } => "run_command",
            Request::IdentifyLoader { .. } => "identify_loader",
            Request::StartFlashing { .. } => "start_flashing",
            Request::StopFlashing => "stop_flashing",
            Request::ErasePart { .. } => "erase_part",
            Request::ReadDeviceInfo { .. } => "read_device_info",
            Request::ReadGpt { .. } => "read_gpt",
            Request::ReadPart { .. } => "read_part",
            Request::SaveToXml { .. } => "save_to_xml",
            Request::SendLoader { .. } => "send_loader",
            Request::SwitchSlot { .. } => "switch_slot",
            Request::WriteFromXml { .. } => "write_from_xml",
            Request::WritePart { .. } => "write_part",
            Request::RebootToEdl { .. } => "reboot_to_edl",
            Request::RebootToFastboot { .. } => "reboot_to_fastboot",
            Request::RebootToRecovery { .. } => "reboot_to_recovery",
            Request::RebootToSystem { .. } => "reboot_to_system",
            Request::UpdatePort => "update_port",
            Request::SendPing { .. } => "send_ping",
        }
    }

    /// XML document carried by this request, if any
    pub fn xml(&self) -> Option<&str> {
        match self {
            Request::RunCommand { content, .. } => Some(content.as_str()),
            Request::ErasePart { xml, .. }
            | Request::ReadPart { xml, .. }
            | Request::SaveToXml { xml, .. }
            | Request::WritePart { xml, .. }
            | Request::RebootToFastboot { xml, .. }
            | Request::RebootToRecovery { xml, .. } => Some(xml.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let req = Request::StartFlashing {
            path: PathBuf::from("/fw"),
            is_protect_lun5: true,
            is_debug: false,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "cmd": "start_flashing",
                "args": { "path": "/fw", "isProtectLun5": true, "isDebug": false }
            })
        );
        assert_eq!(req.name(), "start_flashing");
    }

    #[test]
    fn test_unit_requests() {
        let value = serde_json::to_value(Request::StopFlashing).unwrap();
        assert_eq!(value["cmd"], "stop_flashing");
        assert_eq!(Request::UpdatePort.name(), "update_port");
    }

    #[test]
    fn test_write_from_xml_keeps_snake_case_path() {
        let req = Request::WriteFromXml {
            file_path: PathBuf::from("rawprogram0.xml"),
            is_debug: true,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["args"]["file_path"], "rawprogram0.xml");
        assert_eq!(value["args"]["isDebug"], true);
    }

    #[test]
    fn test_slot_serializes_lowercase() {
        let req = Request::SwitchSlot {
            slot: Slot::B,
            is_debug: false,
        };
        assert_eq!(serde_json::to_value(&req).unwrap()["args"]["slot"], "b");
    }
}
