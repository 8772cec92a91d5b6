//! Aggregate counts shown on the dashboard.
//!
//! The summary is computed server-side. Clients never patch it; they
//! invalidate their cached copy and refetch.

use serde::{Deserialize, Serialize};

/// Online/total counts for one class of monitored resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityCount {
    pub total: u32,
    pub online: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub devices: AvailabilityCount,
    pub web_services: AvailabilityCount,
    pub active_alerts: u32,
    /// Mean response time across recent results, in milliseconds.
    pub average_response_time: f64,
}
