//! Monitors, their type-specific configuration, and check results.
//!
//! On the wire a monitor carries a `type` tag next to a `config` object
//! whose shape depends on the tag. [`Monitor`] folds the pair into a
//! single [`MonitorConfig`] enum so the two can never disagree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::device::HealthStatus;
use crate::error::ModelError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Fields common to every monitor type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseMonitorConfig {
    pub timeout_seconds: u32,
    pub threshold_ms: u32,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcmpConfig {
    #[serde(flatten)]
    pub base: BaseMonitorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(flatten)]
    pub base: BaseMonitorConfig,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, rename = "validateSSL", skip_serializing_if = "Option::is_none")]
    pub validate_ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpConfig {
    #[serde(flatten)]
    pub base: BaseMonitorConfig,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnmpConfig {
    #[serde(flatten)]
    pub base: BaseMonitorConfig,
    pub oids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Type-specific monitor configuration, keyed by the monitor's `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorConfig {
    Icmp(IcmpConfig),
    Http(HttpConfig),
    Tcp(TcpConfig),
    Snmp(SnmpConfig),
}

impl MonitorConfig {
    /// The wire tag for this configuration (`icmp`, `http`, `tcp`, `snmp`).
    pub fn monitor_type(&self) -> &'static str {
        match self {
            Self::Icmp(_) => "icmp",
            Self::Http(_) => "http",
            Self::Tcp(_) => "tcp",
            Self::Snmp(_) => "snmp",
        }
    }

    pub fn base(&self) -> &BaseMonitorConfig {
        match self {
            Self::Icmp(c) => &c.base,
            Self::Http(c) => &c.base,
            Self::Tcp(c) => &c.base,
            Self::Snmp(c) => &c.base,
        }
    }

    fn from_wire(monitor_type: &str, config: serde_json::Value) -> Result<Self, ModelError> {
        fn parse<T: serde::de::DeserializeOwned>(
            monitor_type: &'static str,
            config: serde_json::Value,
        ) -> Result<T, ModelError> {
            serde_json::from_value(config).map_err(|source| ModelError::InvalidConfig {
                monitor_type,
                source,
            })
        }

        match monitor_type {
            "icmp" => parse("icmp", config).map(Self::Icmp),
            "http" => parse("http", config).map(Self::Http),
            "tcp" => parse("tcp", config).map(Self::Tcp),
            "snmp" => parse("snmp", config).map(Self::Snmp),
            other => Err(ModelError::UnknownMonitorType(other.to_string())),
        }
    }

    fn to_wire(&self) -> serde_json::Value {
        let value = match self {
            Self::Icmp(c) => serde_json::to_value(c),
            Self::Http(c) => serde_json::to_value(c),
            Self::Tcp(c) => serde_json::to_value(c),
            Self::Snmp(c) => serde_json::to_value(c),
        };
        // Plain structs of strings, numbers and string maps cannot fail.
        value.unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// A check configured against exactly one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MonitorWire", into = "MonitorWire")]
pub struct Monitor {
    pub id: DbId,
    pub device_id: DbId,
    pub config: MonitorConfig,
    pub enabled: bool,
    /// Check interval in seconds.
    pub interval: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub latest_result: Option<MonitorResult>,
}

/// Wire shape of [`Monitor`]: `type` and `config` as siblings.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonitorWire {
    id: DbId,
    device_id: DbId,
    #[serde(rename = "type")]
    monitor_type: String,
    config: serde_json::Value,
    enabled: bool,
    interval: u32,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_result: Option<MonitorResult>,
}

impl TryFrom<MonitorWire> for Monitor {
    type Error = ModelError;

    fn try_from(wire: MonitorWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            device_id: wire.device_id,
            config: MonitorConfig::from_wire(&wire.monitor_type, wire.config)?,
            enabled: wire.enabled,
            interval: wire.interval,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            latest_result: wire.latest_result,
        })
    }
}

impl From<Monitor> for MonitorWire {
    fn from(monitor: Monitor) -> Self {
        Self {
            id: monitor.id,
            device_id: monitor.device_id,
            monitor_type: monitor.config.monitor_type().to_string(),
            config: monitor.config.to_wire(),
            enabled: monitor.enabled,
            interval: monitor.interval,
            created_at: monitor.created_at,
            updated_at: monitor.updated_at,
            latest_result: monitor.latest_result,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Min/avg/max round-trip times reported by ICMP checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoundTripTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Free-form outcome details. Unrecognised keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResultDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip_time: Option<RoundTripTime>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One timestamped outcome of a monitor check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResult {
    pub id: DbId,
    pub monitor_id: DbId,
    pub timestamp: Timestamp,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<MonitorResultDetails>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn http_monitor_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "deviceId": 3,
            "type": "http",
            "config": {
                "timeoutSeconds": 5,
                "thresholdMs": 300,
                "retries": 2,
                "url": "https://status.example.com/health",
                "method": "GET",
                "validateSSL": true
            },
            "enabled": true,
            "interval": 60,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    fn http_monitor_parses_into_matching_config() {
        let monitor: Monitor = serde_json::from_value(http_monitor_json()).unwrap();
        assert_eq!(monitor.id, 7);
        assert_eq!(monitor.device_id, 3);
        assert_eq!(monitor.config.base().retries, 2);
        assert_matches!(monitor.config, MonitorConfig::Http(ref c) => {
            assert_eq!(c.url, "https://status.example.com/health");
            assert_eq!(c.method.as_deref(), Some("GET"));
            assert_eq!(c.validate_ssl, Some(true));
        });
        assert!(monitor.latest_result.is_none());
    }

    #[test]
    fn serialized_monitor_keeps_type_beside_config() {
        let monitor: Monitor = serde_json::from_value(http_monitor_json()).unwrap();
        let json = serde_json::to_value(&monitor).unwrap();
        assert_eq!(json["type"], "http");
        assert_eq!(json["deviceId"], 3);
        assert_eq!(json["config"]["url"], "https://status.example.com/health");
        assert_eq!(json["config"]["validateSSL"], true);
    }

    #[test]
    fn config_mismatching_type_is_rejected() {
        let mut json = http_monitor_json();
        json["type"] = "tcp".into();
        assert!(serde_json::from_value::<Monitor>(json).is_err());
    }

    #[test]
    fn unknown_monitor_type_is_rejected() {
        let mut json = http_monitor_json();
        json["type"] = "dns".into();
        let err = serde_json::from_value::<Monitor>(json).unwrap_err();
        assert!(err.to_string().contains("dns"));
    }

    #[test]
    fn snmp_config_requires_oids() {
        let config = MonitorConfig::from_wire(
            "snmp",
            serde_json::json!({"timeoutSeconds": 1, "thresholdMs": 1, "retries": 0}),
        );
        assert_matches!(config, Err(ModelError::InvalidConfig { monitor_type: "snmp", .. }));
    }

    #[test]
    fn result_details_keep_unknown_keys() {
        let result: MonitorResult = serde_json::from_value(serde_json::json!({
            "id": 1,
            "monitorId": 7,
            "timestamp": "2024-01-01T00:00:00Z",
            "status": "warning",
            "responseTime": 812.5,
            "details": {
                "packetLoss": 20,
                "roundTripTime": {"min": 1.0, "avg": 2.5, "max": 4.0},
                "hops": 9
            }
        }))
        .unwrap();

        assert_eq!(result.status, HealthStatus::Warning);
        let details = result.details.unwrap();
        assert_eq!(details.packet_loss, Some(20.0));
        assert_eq!(details.round_trip_time.unwrap().avg, Some(2.5));
        assert_eq!(details.extra["hops"], 9);
    }
}
