//! Events delivered to subscribers of a [`MonitoringClient`](crate::MonitoringClient).
//!
//! Connection lifecycle notifications and backend domain events share a
//! single tagged union so subscribers can match exhaustively instead of
//! probing optional fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use netmon_core::alert::Alert;
use netmon_core::device::{DeviceStatusUpdate, DeviceWithStatus};
use netmon_core::monitor::MonitorResult;
use netmon_core::types::DbId;

/// Everything a subscriber can observe.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitoringEvent {
    /// The transport opened.
    Connected,

    /// The transport closed. `code` is the WebSocket close code.
    Disconnected { code: u16, reason: String },

    /// A transport-level failure. Always followed by the reconnect path.
    Error { message: String },

    /// A reconnect attempt has been scheduled.
    Reconnecting { attempt: u32, delay: Duration },

    /// Automatic recovery gave up after `attempts` tries.
    ReconnectFailed { attempts: u32 },

    /// Full device collection.
    Devices(Vec<DeviceWithStatus>),

    /// Full alert collection.
    Alerts(Vec<Alert>),

    /// Unified per-check update carrying a device fragment and/or a result.
    MonitorUpdate(MonitorUpdate),

    /// Legacy device status update with fields at the payload top level.
    DeviceStatus(DeviceStatusUpdate),

    /// Legacy monitor result notification.
    MonitorResult(MonitorResultUpdate),

    /// Legacy single-alert notification.
    Alert(Box<Alert>),

    /// A frame type this client does not know. Delivered untouched.
    Unknown {
        event_type: String,
        data: serde_json::Value,
    },
}

impl MonitoringEvent {
    /// The wire name of this event (`connected`, `monitorUpdate`, ...).
    pub fn event_type(&self) -> &str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::Error { .. } => "error",
            Self::Reconnecting { .. } => "reconnecting",
            Self::ReconnectFailed { .. } => "reconnectFailed",
            Self::Devices(_) => "devices",
            Self::Alerts(_) => "alerts",
            Self::MonitorUpdate(_) => "monitorUpdate",
            Self::DeviceStatus(_) => "deviceStatus",
            Self::MonitorResult(_) => "monitorResult",
            Self::Alert(_) => "alert",
            Self::Unknown { event_type, .. } => event_type,
        }
    }

    /// Whether this is a connection lifecycle notification rather than
    /// a backend domain event.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Connected
                | Self::Disconnected { .. }
                | Self::Error { .. }
                | Self::Reconnecting { .. }
                | Self::ReconnectFailed { .. }
        )
    }
}

/// Reference to the monitor a `monitorUpdate` concerns.
///
/// The backend sends the full monitor; only the id is needed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorRef {
    pub id: DbId,
}

/// Payload of a `monitorUpdate` event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorUpdate {
    #[serde(default)]
    pub device: Option<DeviceStatusUpdate>,
    #[serde(default)]
    pub monitor: Option<MonitorRef>,
    #[serde(default)]
    pub result: Option<MonitorResult>,
}

/// Payload of a legacy `monitorResult` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResultUpdate {
    pub monitor_id: DbId,
    pub result: MonitorResult,
}
