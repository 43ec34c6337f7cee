//! # EdlFlash Core Library
//!
//! UI-side model for the EdlFlash device flashing front-end.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The partition table shown in the partition panel
//! - Encoding of table selections into erase/read/program command documents
//! - Decoding of rawprogram XML files and device-reported GPT tables
//! - Typed dispatch of every panel operation through one remote-call boundary
//! - An event bridge applying backend push events to the shared state
//!
//! ## Example
//!
//! ```rust,ignore
//! use edlflash_core::prelude::*;
//!
//! let state = AppState::new().into_shared();
//! let (events, bridge) = event_channel(state.clone());
//! tokio::spawn(bridge.run());
//!
//! let dispatcher = CommandDispatcher::new(backend, Settings::default());
//! dispatcher.write_partitions(&state).await?;
//! ```

pub mod dialog;
pub mod dispatch;
pub mod events;
pub mod partition;
pub mod settings;
pub mod state;
pub mod xml;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::dialog::{FileDialog, FileFilter, XML_FILTER};
    pub use crate::dispatch::{
        table_snapshot, BackendError, CommandDispatcher, DispatchError, Invoker, LoaderFiles,
        Outcome, RebootTarget, Request, Slot,
    };
    pub use crate::events::{event_channel, DeviceEvent, EventBridge, EventSender, FlashStep};
    pub use crate::partition::{Lun, PartitionRecord, PartitionTable, SECTOR_SIZE_IN_BYTES};
    pub use crate::settings::Settings;
    pub use crate::state::{AppState, MalformedXmlPolicy, PortStatus, SharedState};
    pub use crate::xml::{AdvancedCommand, CommandDocument, CommandKind, XmlError};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
