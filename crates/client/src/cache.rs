//! Keyed read cache mirroring server-side monitoring state.
//!
//! The client is the only writer. External data-fetching layers read
//! entries, and refetch whatever key they see invalidated. The client
//! never decides *how* a key is fetched, only when its value changes or
//! goes stale.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;

use netmon_core::alert::Alert;
use netmon_core::dashboard::DashboardSummary;
use netmon_core::device::DeviceWithStatus;
use netmon_core::monitor::{Monitor, MonitorResult};
use netmon_core::types::{DbId, Timestamp};

/// Broadcast channel capacity for invalidation notices.
const INVALIDATION_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Keys and values
// ---------------------------------------------------------------------------

/// Resource keys understood by the client.
///
/// [`Display`](fmt::Display) renders the REST path the fetch layer uses
/// for the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `/api/devices`
    Devices,
    /// `/api/devices/<id>`
    Device(DbId),
    /// `/api/alerts`
    Alerts,
    /// `/api/monitors`
    Monitors,
    /// `/api/monitor-results/<monitor id>/latest`
    LatestResult(DbId),
    /// `/api/dashboard/summary`
    DashboardSummary,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Devices => f.write_str("/api/devices"),
            Self::Device(id) => write!(f, "/api/devices/{id}"),
            Self::Alerts => f.write_str("/api/alerts"),
            Self::Monitors => f.write_str("/api/monitors"),
            Self::LatestResult(id) => write!(f, "/api/monitor-results/{id}/latest"),
            Self::DashboardSummary => f.write_str("/api/dashboard/summary"),
        }
    }
}

/// A cached snapshot. Collections are always stored whole.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Devices(Vec<DeviceWithStatus>),
    Device(DeviceWithStatus),
    Alerts(Vec<Alert>),
    Monitors(Vec<Monitor>),
    MonitorResult(MonitorResult),
    DashboardSummary(DashboardSummary),
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// The keyed store the client writes into.
///
/// Implementations must be cheap to call from the connection task; they
/// are invoked synchronously while an inbound frame is processed.
pub trait CacheStore: Send + Sync {
    /// Current value for `key`, stale or not.
    fn get_entry(&self, key: &CacheKey) -> Option<CacheValue>;

    /// Replace the value for `key` wholesale and clear its stale marker.
    fn set_entry(&self, key: CacheKey, value: CacheValue);

    /// Mark `key` stale so consumers refetch it.
    fn invalidate(&self, key: &CacheKey);
}

/// One slot in a [`QueryCache`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheEntry {
    /// Last known value. `None` if the key was invalidated before it was
    /// ever populated.
    pub value: Option<CacheValue>,
    pub stale: bool,
    pub updated_at: Option<Timestamp>,
}

/// In-memory [`CacheStore`] with invalidation notifications.
///
/// Every invalidated key is also published on a broadcast channel; call
/// [`subscribe_invalidations`](Self::subscribe_invalidations) to drive
/// refetches.
pub struct QueryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    invalidations: broadcast::Sender<CacheKey>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            invalidations,
        }
    }

    /// Full entry (value plus stale marker) for `key`.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.read().get(key).cloned()
    }

    /// Whether `key` has been invalidated since it was last set.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.read().get(key).is_some_and(|entry| entry.stale)
    }

    /// Receive every key invalidated from now on.
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<CacheKey> {
        self.invalidations.subscribe()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for QueryCache {
    fn get_entry(&self, key: &CacheKey) -> Option<CacheValue> {
        self.read().get(key).and_then(|entry| entry.value.clone())
    }

    fn set_entry(&self, key: CacheKey, value: CacheValue) {
        tracing::trace!(key = %key, "Cache entry set");
        self.write().insert(
            key,
            CacheEntry {
                value: Some(value),
                stale: false,
                updated_at: Some(Utc::now()),
            },
        );
    }

    fn invalidate(&self, key: &CacheKey) {
        tracing::trace!(key = %key, "Cache entry invalidated");
        self.write().entry(key.clone()).or_default().stale = true;
        // A SendError only means nobody is listening.
        let _ = self.invalidations.send(key.clone());
    }
}
