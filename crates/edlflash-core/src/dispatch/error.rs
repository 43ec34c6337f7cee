//! Dispatch errors

use crate::xml::XmlError;
use thiserror::Error;

/// Failure reported by, or while talking to, the flashing backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("{command} failed: {message}")]
    Failed { command: String, message: String },

    #[error("Unexpected response to {command}: {source}")]
    UnexpectedResponse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced to the panel that triggered an operation
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Nothing selected for an operation that requires a selection
    #[error("No partition selected")]
    EmptySelection,

    /// The table has no row named "misc"
    #[error("Partition 'misc' not found")]
    MiscNotFound,

    #[error("Failed to build command document: {0}")]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DispatchError {
    /// Locale key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            DispatchError::EmptySelection => "operation.saveAlert",
            DispatchError::MiscNotFound => "reboot.miscNotFound",
            DispatchError::Xml(_) | DispatchError::Backend(_) => "backend.failed",
        }
    }

    /// Validation failures happen before anything is sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DispatchError::EmptySelection | DispatchError::MiscNotFound
        )
    }
}
