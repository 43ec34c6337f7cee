//! Device Event Bridge
//!
//! Backend events arrive asynchronously with no request correlation. They
//! are queued on a channel and applied to [`crate::state::AppState`] by a
//! single consumer loop.

mod bridge;

pub use bridge::{apply_event, event_channel, DeviceEvent, EventBridge, EventError, EventSender, FlashStep};
