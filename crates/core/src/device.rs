//! Monitored devices and their event-driven liveness fields.

use serde::{Deserialize, Serialize};

use crate::monitor::Monitor;
use crate::types::{DbId, Timestamp};

/// Liveness classification shared by devices and monitor results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Offline,
    Warning,
    Unknown,
}

/// A monitored network device as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DbId,
    pub name: String,
    pub ip_address: String,
    /// Free-form device category (router, server, printer, ...).
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A [`Device`] plus the liveness fields filled in by status events.
///
/// The extra fields are never set by construction on the client side;
/// they arrive from the API or through [`DeviceWithStatus::apply_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceWithStatus {
    #[serde(flatten)]
    pub device: Device,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HealthStatus>,
    /// Last observed response time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    /// When the device was last checked, as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<String>,
    /// Wire fields this model does not name, kept so a cached snapshot
    /// serializes back to what the backend sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeviceWithStatus {
    pub fn id(&self) -> DbId {
        self.device.id
    }

    /// Shallow-merge a status fragment into this device.
    ///
    /// Only fields present in `update` are overwritten. The caller is
    /// responsible for matching `update.id` against [`Self::id`].
    pub fn apply_status(&mut self, update: &DeviceStatusUpdate) {
        if let Some(status) = update.status {
            self.status = Some(status);
        }
        if let Some(response_time) = update.response_time {
            self.response_time = Some(response_time);
        }
        if let Some(ref last_check) = update.last_check {
            self.last_check = Some(last_check.clone());
        }
    }
}

/// A partial device carrying only liveness fields.
///
/// Sent nested under `device` in `monitorUpdate` events and at the top
/// level of legacy `deviceStatus` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusUpdate {
    pub id: DbId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HealthStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<String>,
}

/// A device with its monitors, as returned by the device detail API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceWithMonitors {
    #[serde(flatten)]
    pub device: Device,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitors: Option<Vec<Monitor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_monitors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_monitors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HealthStatus>,
}
