//! Command Dispatch
//!
//! Typed payloads for every backend command and the dispatcher that builds
//! and submits them.

mod dispatcher;
mod error;
pub mod request;

pub use dispatcher::{table_snapshot, CommandDispatcher, Invoker, Outcome, RebootTarget};
pub use error::{BackendError, DispatchError};
pub use request::{LoaderFiles, Request, Slot};
