//! Deprecated "last metric" adapter.
//!
//! Older consumers polled a single value describing the most recent
//! device check instead of subscribing to the event stream. This module
//! keeps that shape alive on top of [`MonitoringClient::subscribe`]; the
//! connection manager, dispatcher and cache do not depend on it.
//!
//! New code should subscribe to [`MonitoringEvent::MonitorUpdate`]
//! directly.

use chrono::Utc;
use tokio::sync::watch;

use netmon_core::device::HealthStatus;
use netmon_core::types::DbId;

use crate::dispatcher::Subscription;
use crate::events::MonitoringEvent;
use crate::manager::MonitoringClient;

/// Snapshot of the latest device check seen on the event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LastMetric {
    pub device_id: DbId,
    pub status: Option<HealthStatus>,
    pub response_time: Option<f64>,
    /// The check's `lastCheck`, or the time the update was received.
    pub timestamp: String,
}

/// Derive a [`LastMetric`] from an event, if it carries a device fragment.
pub fn last_metric_from(event: &MonitoringEvent) -> Option<LastMetric> {
    let MonitoringEvent::MonitorUpdate(update) = event else {
        return None;
    };
    let device = update.device.as_ref()?;

    Some(LastMetric {
        device_id: device.id,
        status: device.status,
        response_time: device.response_time,
        timestamp: device
            .last_check
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    })
}

/// Observable holder of the most recent [`LastMetric`].
pub struct LastMetricWatcher {
    rx: watch::Receiver<Option<LastMetric>>,
    subscription: Subscription,
}

impl LastMetricWatcher {
    /// Start tracking `monitorUpdate` events on `client`.
    pub fn attach(client: &MonitoringClient) -> Self {
        tracing::warn!("LastMetricWatcher is deprecated; subscribe to MonitoringClient events instead");

        let (tx, rx) = watch::channel(None);
        let subscription = client.subscribe(move |event| {
            if let Some(metric) = last_metric_from(event) {
                tx.send_replace(Some(metric));
            }
        });

        Self { rx, subscription }
    }

    /// The latest metric, or `None` before the first device update.
    pub fn last_metric(&self) -> Option<LastMetric> {
        self.rx.borrow().clone()
    }

    /// Receiver notified on every new metric.
    pub fn watch(&self) -> watch::Receiver<Option<LastMetric>> {
        self.rx.clone()
    }

    /// Stop tracking. The last value stays readable through receivers
    /// obtained from [`watch`](Self::watch).
    pub fn detach(self) {
        self.subscription.unsubscribe();
    }
}
