//! Event channel and state-mutation loop

use crate::state::{write_state, AppState, MalformedXmlPolicy, SharedState};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors decoding or delivering device events
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Event bridge is closed")]
    Closed,
}

/// Events pushed by the flashing backend
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// A line for the device log
    Log(String),
    /// The bulk flashing session ended
    FlashingStopped,
    /// Backend started or finished executing a command
    CommandRunning(bool),
    /// Loader has been sent (or lost)
    LoaderSent(bool),
    /// Overall progress, 0-100
    Percentage(f64),
    /// Progress of the current file, 0-100
    WorkingPercentage(f64),
    /// Full partition-table document read from the device
    PartitionTable(String),
}

impl DeviceEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            DeviceEvent::Log(_) => "log_event",
            DeviceEvent::FlashingStopped => "stop_edl_flashing",
            DeviceEvent::CommandRunning(_) => "update_command_running_status",
            DeviceEvent::LoaderSent(_) => "update_loader_status",
            DeviceEvent::Percentage(_) => "update_percentage",
            DeviceEvent::WorkingPercentage(_) => "update_working_percentage",
            DeviceEvent::PartitionTable(_) => "update_partition_table",
        }
    }

    /// Decode an event from its wire name and JSON payload
    pub fn from_wire(name: &str, payload: Value) -> Result<Self, EventError> {
        let invalid = |source| EventError::InvalidPayload {
            event: name.to_string(),
            source,
        };
        let event = match name {
            "log_event" => DeviceEvent::Log(payload_text(payload)),
            "stop_edl_flashing" => DeviceEvent::FlashingStopped,
            "update_command_running_status" => {
                DeviceEvent::CommandRunning(serde_json::from_value(payload).map_err(invalid)?)
            }
            "update_loader_status" => {
                DeviceEvent::LoaderSent(serde_json::from_value(payload).map_err(invalid)?)
            }
            "update_percentage" => {
                DeviceEvent::Percentage(serde_json::from_value(payload).map_err(invalid)?)
            }
            "update_working_percentage" => {
                DeviceEvent::WorkingPercentage(serde_json::from_value(payload).map_err(invalid)?)
            }
            "update_partition_table" => DeviceEvent::PartitionTable(payload_text(payload)),
            other => return Err(EventError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}

fn payload_text(payload: Value) -> String {
    match payload {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Coarse step indicator, 1 through 7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FlashStep(u8);

impl FlashStep {
    /// Map overall progress onto a step
    pub fn from_percentage(percentage: f64) -> Self {
        let step = if percentage >= 100.0 {
            7
        } else if percentage >= 95.0 {
            6
        } else if percentage >= 80.0 {
            5
        } else if percentage >= 20.0 {
            4
        } else if percentage >= 10.0 {
            3
        } else if percentage >= 5.0 {
            2
        } else {
            1
        };
        FlashStep(step)
    }

    /// Step number, 1 through 7
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for FlashStep {
    fn default() -> Self {
        FlashStep(1)
    }
}

/// Apply one event to the state
pub fn apply_event(state: &mut AppState, event: DeviceEvent) {
    match event {
        DeviceEvent::Log(line) => {
            let time = Local::now().format("%H:%M:%S");
            state.push_log(format!("[{}] {}", time, line));
        }
        DeviceEvent::FlashingStopped => state.is_running = false,
        DeviceEvent::CommandRunning(running) => state.is_command_running = running,
        DeviceEvent::LoaderSent(sent) => state.is_loader_sent = sent,
        DeviceEvent::Percentage(p) => state.set_percentage(p),
        DeviceEvent::WorkingPercentage(p) => state.working_percentage = p,
        DeviceEvent::PartitionTable(xml) => {
            // Ignore policy never returns an error
            if let Ok(true) = state.import_table_xml(&xml, MalformedXmlPolicy::Ignore) {
                tracing::info!("Partition table updated from device ({} rows)", state.table.len());
            }
        }
    }
}

/// Producer half, handed to whatever receives backend events
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl EventSender {
    /// Queue an event for the bridge
    pub fn send(&self, event: DeviceEvent) -> Result<(), EventError> {
        self.tx.send(event).map_err(|_| EventError::Closed)
    }

    /// Decode and queue a raw backend event
    pub fn send_wire(&self, name: &str, payload: Value) -> Result<(), EventError> {
        self.send(DeviceEvent::from_wire(name, payload)?)
    }
}

/// Consumer half: the only writer of event-owned state
pub struct EventBridge {
    rx: mpsc::UnboundedReceiver<DeviceEvent>,
    state: SharedState,
}

/// Create a connected sender/bridge pair writing into `state`
pub fn event_channel(state: SharedState) -> (EventSender, EventBridge) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventBridge { rx, state })
}

impl EventBridge {
    /// Apply events until every sender is dropped. Returns the number applied.
    pub async fn run(mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.rx.recv().await {
            self.dispatch(event);
            applied += 1;
        }
        tracing::debug!("Event bridge closed after {applied} events");
        applied
    }

    /// Apply whatever is queued right now without waiting
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    fn dispatch(&self, event: DeviceEvent) {
        tracing::trace!("Device event: {}", event.name());
        let mut state = write_state(&self.state);
        apply_event(&mut state, event);
    }
}
