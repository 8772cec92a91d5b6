//! Cache mutations driven by classified monitoring events.
//!
//! Each domain event maps to one fixed set of replace / merge /
//! invalidate operations against a [`CacheStore`]. Merges are shallow and
//! never insert: a fragment addressed to an id missing from the cached
//! collection is dropped.

use std::sync::Arc;

use netmon_core::device::DeviceStatusUpdate;
use netmon_core::monitor::MonitorResult;
use netmon_core::types::DbId;

use crate::cache::{CacheKey, CacheStore, CacheValue};
use crate::events::{MonitorUpdate, MonitoringEvent};

/// Applies the cache side effects of inbound events.
pub struct CacheSynchronizer {
    store: Arc<dyn CacheStore>,
}

impl CacheSynchronizer {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Apply the mutation for one event. Lifecycle and unknown events
    /// leave the cache untouched.
    pub fn apply(&self, event: &MonitoringEvent) {
        match event {
            MonitoringEvent::Devices(devices) => {
                self.store
                    .set_entry(CacheKey::Devices, CacheValue::Devices(devices.clone()));
            }
            MonitoringEvent::Alerts(alerts) => {
                self.store
                    .set_entry(CacheKey::Alerts, CacheValue::Alerts(alerts.clone()));
                self.store.invalidate(&CacheKey::DashboardSummary);
            }
            MonitoringEvent::MonitorUpdate(update) => self.apply_monitor_update(update),
            MonitoringEvent::DeviceStatus(update) => {
                tracing::debug!(device_id = update.id, "Legacy device status update");
                self.merge_device_status(update);
                self.store.invalidate(&CacheKey::Device(update.id));
                self.store.invalidate(&CacheKey::DashboardSummary);
            }
            MonitoringEvent::MonitorResult(update) => {
                self.record_latest_result(update.monitor_id, &update.result);
                self.store.invalidate(&CacheKey::DashboardSummary);
            }
            MonitoringEvent::Alert(_) => {
                self.store.invalidate(&CacheKey::Alerts);
                self.store.invalidate(&CacheKey::DashboardSummary);
            }
            MonitoringEvent::Connected
            | MonitoringEvent::Disconnected { .. }
            | MonitoringEvent::Error { .. }
            | MonitoringEvent::Reconnecting { .. }
            | MonitoringEvent::ReconnectFailed { .. }
            | MonitoringEvent::Unknown { .. } => {}
        }
    }

    fn apply_monitor_update(&self, update: &MonitorUpdate) {
        if let Some(device) = &update.device {
            self.merge_device_status(device);
            self.store.invalidate(&CacheKey::Device(device.id));
        }

        if let (Some(monitor), Some(result)) = (&update.monitor, &update.result) {
            self.record_latest_result(monitor.id, result);
        }

        self.store.invalidate(&CacheKey::DashboardSummary);
    }

    /// Merge liveness fields into the matching cached device, if any.
    fn merge_device_status(&self, update: &DeviceStatusUpdate) {
        let Some(CacheValue::Devices(mut devices)) = self.store.get_entry(&CacheKey::Devices)
        else {
            return;
        };

        let Some(device) = devices.iter_mut().find(|d| d.id() == update.id) else {
            tracing::debug!(device_id = update.id, "Status update for uncached device ignored");
            return;
        };

        device.apply_status(update);
        self.store
            .set_entry(CacheKey::Devices, CacheValue::Devices(devices));
    }

    /// Set the latest result for a monitor and patch the cached monitor
    /// collection when it holds that monitor.
    fn record_latest_result(&self, monitor_id: DbId, result: &MonitorResult) {
        self.store.set_entry(
            CacheKey::LatestResult(monitor_id),
            CacheValue::MonitorResult(result.clone()),
        );

        let Some(CacheValue::Monitors(mut monitors)) = self.store.get_entry(&CacheKey::Monitors)
        else {
            return;
        };

        if let Some(monitor) = monitors.iter_mut().find(|m| m.id == monitor_id) {
            monitor.latest_result = Some(result.clone());
            self.store
                .set_entry(CacheKey::Monitors, CacheValue::Monitors(monitors));
        }
    }
}
