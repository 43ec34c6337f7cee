//! Shared application state
//!
//! Everything the panels display: the partition table, session flags fed
//! by device events, progress and the device log.

use crate::dialog::{FileDialog, XML_FILTER};
use crate::events::FlashStep;
use crate::partition::PartitionTable;
use crate::xml::{decode_partition_table, XmlError};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Maximum number of device log lines kept
pub const MAX_LOG_LINES: usize = 5000;

/// Port number reported by the backend when no EDL device is attached
pub const PORT_NOT_FOUND: &str = "Not found";

/// State shared between the dispatcher and the event bridge
pub type SharedState = Arc<RwLock<AppState>>;

/// Errors importing a partition table
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("XML file invalid: {0}")]
    InvalidFormat(#[from] XmlError),
}

impl ImportError {
    /// Locale key of the message shown to the user.
    ///
    /// Only a document that is not a partition table gets the "XML invalid"
    /// alert; read failures get their own message.
    pub fn message_key(&self) -> &'static str {
        match self {
            ImportError::InvalidFormat(e) if e.is_invalid_document() => "config.xmlInvalid",
            ImportError::InvalidFormat(_) | ImportError::Io { .. } => "config.readFailed",
        }
    }
}

/// How to react when an incoming partition table cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedXmlPolicy {
    /// Empty the table and report the failure (user-opened files)
    ClearAndReport,
    /// Keep the current table and say nothing (device-pushed tables)
    Ignore,
}

/// EDL port as last reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PortStatus {
    #[default]
    /// No EDL device attached
    NotFound,
    /// Device found on a port
    Connected {
        /// Port identifier, e.g. "COM7"
        number: String,
        /// Device name reported by the OS
        name: String,
    },
}

impl PortStatus {
    /// Interpret the `(number, name)` pair returned by `update_port`
    pub fn from_backend(number: String, name: String) -> Self {
        if number == PORT_NOT_FOUND {
            PortStatus::NotFound
        } else {
            PortStatus::Connected { number, name }
        }
    }

    /// Port name for display
    pub fn display_name(&self) -> &str {
        match self {
            PortStatus::NotFound => "N/A",
            PortStatus::Connected { name, .. } => name,
        }
    }

    /// Locale key of the status line
    pub fn message_key(&self) -> &'static str {
        match self {
            PortStatus::NotFound => "config.portStatusError",
            PortStatus::Connected { .. } => "config.portStatus",
        }
    }
}

/// UI-side application state
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    /// Current partition table
    pub table: PartitionTable,
    /// A bulk EDL flashing session is running
    pub is_running: bool,
    /// The backend is executing a command (advisory, event-owned)
    pub is_command_running: bool,
    /// A loader has been sent to the device (event-owned)
    pub is_loader_sent: bool,
    /// Overall flashing progress, 0-100
    pub percentage: f64,
    /// Progress of the file currently being written, 0-100
    pub working_percentage: f64,
    /// Coarse step derived from `percentage`
    pub active_step: FlashStep,
    /// EDL port status
    pub port: PortStatus,
    log: VecDeque<String>,
}

impl AppState {
    /// Empty state with no table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in a [`SharedState`]
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Replace the table from an XML document.
    ///
    /// Returns `Ok(true)` when the table was replaced and `Ok(false)` when a
    /// malformed document was ignored under [`MalformedXmlPolicy::Ignore`].
    pub fn import_table_xml(
        &mut self,
        xml: &str,
        policy: MalformedXmlPolicy,
    ) -> Result<bool, ImportError> {
        match decode_partition_table(xml) {
            Ok(records) => {
                self.table.load(records);
                Ok(true)
            }
            Err(e) => match policy {
                MalformedXmlPolicy::ClearAndReport => {
                    self.table.clear();
                    Err(ImportError::InvalidFormat(e))
                }
                MalformedXmlPolicy::Ignore => {
                    tracing::debug!("Ignoring malformed partition table: {e}");
                    Ok(false)
                }
            },
        }
    }

    /// Replace the table from a user-chosen file.
    ///
    /// The table is emptied first, so any failure leaves it empty.
    pub fn import_table_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ImportError> {
        let path = path.as_ref();
        self.table.clear();
        let content = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.import_table_xml(&content, MalformedXmlPolicy::ClearAndReport)?;
        tracing::info!(
            "Loaded {} partitions from {}",
            self.table.len(),
            path.display()
        );
        Ok(())
    }

    /// Append a device log line, dropping the oldest beyond [`MAX_LOG_LINES`]
    pub fn push_log(&mut self, line: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    /// Device log, oldest first
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Store overall progress and the step it maps to
    pub fn set_percentage(&mut self, percentage: f64) {
        self.percentage = percentage;
        self.active_step = FlashStep::from_percentage(percentage);
    }

    /// Keep-alive gate.
    ///
    /// A missing port means the loader is gone, so the loader flag is
    /// cleared first. A ping is due only while a loader is running and no
    /// command is in flight.
    pub fn should_ping(&mut self, enable_ping: bool) -> bool {
        if self.port == PortStatus::NotFound {
            self.is_loader_sent = false;
        }
        enable_ping && self.is_loader_sent && !self.is_command_running
    }
}

/// Read access that survives a panicked writer
pub fn read_state(state: &SharedState) -> RwLockReadGuard<'_, AppState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access that survives a panicked writer
pub fn write_state(state: &SharedState) -> RwLockWriteGuard<'_, AppState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Let the user pick a partition-table XML and load it.
///
/// Returns the number of rows loaded, or `None` if the picker was cancelled.
pub fn open_table_file(
    state: &SharedState,
    dialog: &impl FileDialog,
) -> Result<Option<usize>, ImportError> {
    let Some(path) = dialog.pick_file(Some(XML_FILTER)) else {
        return Ok(None);
    };
    let mut guard = write_state(state);
    guard.import_table_file(&path)?;
    Ok(Some(guard.table.len()))
}

/// Let the user pick the image to flash into row `index`.
///
/// Returns whether the row was updated; a cancelled picker or an index past
/// the end of the table changes nothing.
pub fn select_image(state: &SharedState, index: usize, dialog: &impl FileDialog) -> bool {
    if index >= read_state(state).table.len() {
        return false;
    }
    let Some(path) = dialog.pick_file(None) else {
        return false;
    };
    write_state(state)
        .table
        .set_image_path(index, path.to_string_lossy())
}
