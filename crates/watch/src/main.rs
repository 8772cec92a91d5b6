//! `netmon-watch` -- follow the monitoring event stream from a terminal.
//!
//! Connects to the backend's monitoring WebSocket, logs every event
//! and cache invalidation, and disconnects cleanly on Ctrl-C.
//!
//! # Environment variables
//!
//! See [`ClientConfig::from_env`] for the full table. The most common:
//!
//! | Variable          | Default          | Description                      |
//! |-------------------|------------------|----------------------------------|
//! | `MONITORING_HOST` | `localhost:5000` | Backend `host[:port]`            |
//! | `MONITORING_TLS`  | `false`          | Use `wss://`                     |
//! | `RUST_LOG`        | see below        | Standard `tracing` filter        |

use std::sync::Arc;
use std::time::Duration;

use netmon_client::{ClientConfig, MonitoringClient, MonitoringEvent, QueryCache};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Grace period for the close handshake after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netmon_watch=info,netmon_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid monitoring configuration");
        std::process::exit(1);
    });

    let cache = Arc::new(QueryCache::new());
    let client = MonitoringClient::with_websocket(config, cache.clone());

    tracing::info!(url = %client.url(), "Starting netmon-watch");

    let _events = client.subscribe(log_event);

    let mut invalidations = cache.subscribe_invalidations();
    tokio::spawn(async move {
        loop {
            match invalidations.recv().await {
                Ok(key) => tracing::debug!(key = %key, "Cache entry invalidated"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Invalidation listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    client.connect();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }

    tracing::info!("Shutting down");
    client.disconnect();
    tokio::time::sleep(SHUTDOWN_GRACE).await;
}

fn log_event(event: &MonitoringEvent) {
    match event {
        MonitoringEvent::Connected => tracing::info!("Connected"),
        MonitoringEvent::Disconnected { code, reason } => {
            tracing::info!(code, reason = %reason, "Disconnected");
        }
        MonitoringEvent::Error { message } => tracing::warn!(error = %message, "Connection error"),
        MonitoringEvent::Reconnecting { attempt, delay } => tracing::info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting",
        ),
        MonitoringEvent::ReconnectFailed { attempts } => {
            tracing::error!(attempts, "Gave up reconnecting");
        }
        MonitoringEvent::Devices(devices) => tracing::info!(count = devices.len(), "Device snapshot"),
        MonitoringEvent::Alerts(alerts) => tracing::info!(count = alerts.len(), "Alert snapshot"),
        MonitoringEvent::MonitorUpdate(update) => tracing::info!(
            device_id = update.device.as_ref().map(|d| d.id),
            monitor_id = update.monitor.as_ref().map(|m| m.id),
            "Monitor update",
        ),
        MonitoringEvent::DeviceStatus(update) => tracing::info!(
            device_id = update.id,
            status = ?update.status,
            "Device status",
        ),
        MonitoringEvent::MonitorResult(update) => tracing::info!(
            monitor_id = update.monitor_id,
            status = ?update.result.status,
            "Monitor result",
        ),
        MonitoringEvent::Alert(alert) => tracing::warn!(
            alert_id = alert.id,
            severity = ?alert.severity,
            message = %alert.message,
            "Alert",
        ),
        MonitoringEvent::Unknown { event_type, .. } => {
            tracing::debug!(event_type = %event_type, "Unrecognised event");
        }
    }
}
