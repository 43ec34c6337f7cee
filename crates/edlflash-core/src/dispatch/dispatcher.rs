//! Command dispatcher
//!
//! Builds the payload of each panel operation and submits it through the
//! single remote-call boundary. Holds no state beyond the settings that
//! every call carries. Operations take the shared state and copy what they
//! need out of it before awaiting, so no lock is held across a call.

use super::error::{BackendError, DispatchError};
use super::request::{LoaderFiles, Request, Slot};
use crate::dialog::{FileDialog, XML_FILTER};
use crate::partition::PartitionTable;
use crate::settings::Settings;
use crate::state::{read_state, write_state, PortStatus, SharedState};
use crate::xml::{
    encode_erase, encode_misc_reboot, encode_program, encode_read, AdvancedCommand,
    CommandDocument, MiscTarget,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The remote-call boundary to the flashing backend.
///
/// Every call is independent and asynchronous. Implementations return the
/// backend's JSON result (`null` for commands without one).
#[allow(async_fn_in_trait)]
pub trait Invoker {
    /// Submit one request and wait for its result
    async fn invoke(&self, request: Request) -> Result<Value, BackendError>;
}

/// Result of an operation that may stop at a picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request was sent
    Dispatched,
    /// The user closed the picker; nothing was sent
    Cancelled,
}

/// Reboot targets offered by the reboot panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootTarget {
    /// Back into emergency download mode
    Edl,
    /// Userspace fastboot, via the misc partition
    Fastboot,
    /// Recovery, via the misc partition
    Recovery,
    /// Normal boot
    System,
}

/// Submits panel operations to the backend
pub struct CommandDispatcher<I> {
    invoker: I,
    settings: Settings,
}

impl<I: Invoker> CommandDispatcher<I> {
    /// Create a dispatcher sending through `invoker`
    pub fn new(invoker: I, settings: Settings) -> Self {
        Self { invoker, settings }
    }

    /// Settings attached to every call
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings used for subsequent calls
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// The remote-call boundary in use
    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    fn is_debug(&self) -> bool {
        self.settings.is_debug
    }

    async fn call(&self, request: Request) -> Result<Value, DispatchError> {
        let name = request.name();
        debug!("Dispatching {name}");
        match self.invoker.invoke(request).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("{name} failed: {e}");
                Err(e.into())
            }
        }
    }

    async fn call_for<T: DeserializeOwned>(&self, request: Request) -> Result<T, DispatchError> {
        let command = request.name().to_string();
        let value = self.call(request).await?;
        serde_json::from_value(value)
            .map_err(|source| BackendError::UnexpectedResponse { command, source }.into())
    }

    fn render(doc: &CommandDocument, table: &PartitionTable) -> Result<String, DispatchError> {
        debug!(
            "Encoding {} {} element(s) from table generation {}",
            doc.elements.len(),
            doc.kind,
            table.generation()
        );
        Ok(doc.to_xml()?)
    }

    /// Erase every selected partition. An empty selection still dispatches.
    pub async fn erase(&self, state: &SharedState) -> Result<(), DispatchError> {
        let table = table_snapshot(state);
        let xml = Self::render(&encode_erase(&table), &table)?;
        self.call(Request::ErasePart {
            xml,
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(())
    }

    /// Dump every selected partition into the image folder
    pub async fn read_partitions(&self, state: &SharedState) -> Result<(), DispatchError> {
        let table = table_snapshot(state);
        let xml = Self::render(&encode_read(&table), &table)?;
        self.call(Request::ReadPart {
            xml,
            folder: self.settings.image_saving_path.clone(),
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(())
    }

    /// Flash every selected partition from its image. No selection guard:
    /// an empty selection dispatches an empty program list.
    pub async fn write_partitions(&self, state: &SharedState) -> Result<(), DispatchError> {
        let table = table_snapshot(state);
        let xml = Self::render(&encode_program(&table), &table)?;
        self.call(Request::WritePart {
            xml,
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(())
    }

    /// Save the selected rows as a program document.
    ///
    /// Rejected before the save picker opens when nothing is selected.
    pub async fn save_table(
        &self,
        state: &SharedState,
        dialog: &impl FileDialog,
    ) -> Result<Outcome, DispatchError> {
        let table = table_snapshot(state);
        if table.selected_count() == 0 {
            return Err(DispatchError::EmptySelection);
        }
        let xml = Self::render(&encode_program(&table), &table)?;
        let Some(path) = dialog.save_file(Some(XML_FILTER)) else {
            return Ok(Outcome::Cancelled);
        };
        self.call(Request::SaveToXml { path, xml }).await?;
        Ok(Outcome::Dispatched)
    }

    /// Flash from a user-chosen rawprogram file
    pub async fn write_from_file(&self, dialog: &impl FileDialog) -> Result<Outcome, DispatchError> {
        let Some(file_path) = dialog.pick_file(Some(XML_FILTER)) else {
            return Ok(Outcome::Cancelled);
        };
        self.call(Request::WriteFromXml {
            file_path,
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(Outcome::Dispatched)
    }

    /// Device information text
    pub async fn read_device_info(&self) -> Result<String, DispatchError> {
        self.call_for(Request::ReadDeviceInfo {
            is_debug: self.is_debug(),
        })
        .await
    }

    /// Ask the device for its GPT. The table arrives later as an
    /// `update_partition_table` event.
    pub async fn read_gpt(&self) -> Result<(), DispatchError> {
        self.call(Request::ReadGpt {
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(())
    }

    /// Identify a loader file (logs its key hashes on the backend side)
    pub async fn identify_loader(&self, path: &Path) -> Result<(), DispatchError> {
        self.call(Request::IdentifyLoader {
            path: path.to_path_buf(),
        })
        .await?;
        Ok(())
    }

    /// Pick a loader file and identify it. Returns the chosen path.
    pub async fn select_loader(
        &self,
        dialog: &impl FileDialog,
    ) -> Result<Option<PathBuf>, DispatchError> {
        let Some(path) = dialog.pick_file(None) else {
            return Ok(None);
        };
        self.identify_loader(&path).await?;
        Ok(Some(path))
    }

    /// Send a signed loader; the boot mode comes from the settings
    pub async fn send_loader(&self, files: &LoaderFiles) -> Result<(), DispatchError> {
        self.call(Request::SendLoader {
            loader: files.loader.clone(),
            digest: files.digest.clone(),
            sig: files.signature.clone(),
            native: self.settings.native_loader,
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(())
    }

    /// Make `slot` the active A/B slot
    pub async fn switch_slot(&self, slot: Slot) -> Result<(), DispatchError> {
        self.call(Request::SwitchSlot {
            slot,
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(())
    }

    /// Reboot the device.
    ///
    /// Fastboot and recovery write a prepared image into the first "misc"
    /// row; without one the reboot is aborted before anything is sent.
    pub async fn reboot(
        &self,
        target: RebootTarget,
        state: &SharedState,
    ) -> Result<(), DispatchError> {
        let is_debug = self.is_debug();
        let request = match target {
            RebootTarget::Edl => Request::RebootToEdl { is_debug },
            RebootTarget::System => Request::RebootToSystem { is_debug },
            RebootTarget::Fastboot => Request::RebootToFastboot {
                xml: self.misc_document(&table_snapshot(state), MiscTarget::Fastbootd)?,
                is_debug,
            },
            RebootTarget::Recovery => Request::RebootToRecovery {
                xml: self.misc_document(&table_snapshot(state), MiscTarget::Recovery)?,
                is_debug,
            },
        };
        self.call(request).await?;
        Ok(())
    }

    fn misc_document(
        &self,
        table: &PartitionTable,
        target: MiscTarget,
    ) -> Result<String, DispatchError> {
        let doc = encode_misc_reboot(table, target).ok_or(DispatchError::MiscNotFound)?;
        Self::render(&doc, table)
    }

    /// Start a bulk flashing session from a firmware folder.
    ///
    /// The running flag is raised before the call and dropped again if the
    /// call fails.
    pub async fn start_flashing(
        &self,
        state: &SharedState,
        folder: &Path,
    ) -> Result<(), DispatchError> {
        write_state(state).is_running = true;
        let result = self
            .call(Request::StartFlashing {
                path: folder.to_path_buf(),
                is_protect_lun5: self.settings.protect_lun5,
                is_debug: self.is_debug(),
            })
            .await;
        if result.is_err() {
            write_state(state).is_running = false;
        }
        result.map(|_| ())
    }

    /// Pick a firmware folder and start flashing from it
    pub async fn start_flashing_from_folder(
        &self,
        state: &SharedState,
        dialog: &impl FileDialog,
    ) -> Result<Outcome, DispatchError> {
        let Some(folder) = dialog.pick_folder() else {
            return Ok(Outcome::Cancelled);
        };
        self.start_flashing(state, &folder).await?;
        Ok(Outcome::Dispatched)
    }

    /// Stop the bulk flashing session. The running flag is cleared
    /// immediately, before the backend confirms.
    pub async fn stop_flashing(&self, state: &SharedState) -> Result<(), DispatchError> {
        write_state(state).is_running = false;
        self.call(Request::StopFlashing).await?;
        Ok(())
    }

    /// Refresh the EDL port status
    pub async fn update_port(&self, state: &SharedState) -> Result<PortStatus, DispatchError> {
        let (number, name): (String, String) = self.call_for(Request::UpdatePort).await?;
        let port = PortStatus::from_backend(number, name);
        write_state(state).port = port.clone();
        Ok(port)
    }

    /// Send a keep-alive ping if one is due. Returns whether it was sent.
    pub async fn keep_alive(&self, state: &SharedState) -> Result<bool, DispatchError> {
        let due = write_state(state).should_ping(self.settings.enable_ping);
        if !due {
            return Ok(false);
        }
        self.call(Request::SendPing {
            is_debug: self.is_debug(),
        })
        .await?;
        Ok(true)
    }

    /// Submit an advanced-panel command as typed. Returns the backend output.
    pub async fn run_advanced(&self, command: &AdvancedCommand) -> Result<String, DispatchError> {
        self.call_for(Request::RunCommand {
            cmd_type: command.kind.as_str().to_string(),
            path: self.settings.image_saving_path.clone(),
            content: command.content.clone(),
            is_debug: self.is_debug(),
        })
        .await
    }
}

/// Copy of the current table for encoding outside the state lock
pub fn table_snapshot(state: &SharedState) -> PartitionTable {
    read_state(state).table.clone()
}
