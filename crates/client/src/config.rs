use std::time::Duration;

use crate::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::reconnect::ReconnectConfig;

/// Path of the monitoring WebSocket endpoint on the backend host.
pub const MONITORING_PATH: &str = "/ws/monitoring";

/// Port the backend listens on during local development.
pub const DEV_BACKEND_PORT: u16 = 5000;

/// Monitoring client configuration.
///
/// [`Default`] matches the values [`from_env`](Self::from_env) uses when
/// no variable is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend `host[:port]`.
    pub host: String,
    /// Use `wss://` instead of `ws://`.
    pub tls: bool,
    /// Redirect an explicit port to [`DEV_BACKEND_PORT`].
    pub dev_mode: bool,
    pub reconnect: ReconnectConfig,
    pub heartbeat_interval: Duration,
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:5000".into(),
            tls: false,
            dev_mode: false,
            reconnect: ReconnectConfig::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default          |
    /// |---------------------------|------------------|
    /// | `MONITORING_HOST`         | `localhost:5000` |
    /// | `MONITORING_TLS`          | `false`          |
    /// | `MONITORING_DEV`          | `false`          |
    /// | `RECONNECT_BASE_MS`       | `500`            |
    /// | `RECONNECT_MAX_MS`        | `30000`          |
    /// | `RECONNECT_MAX_ATTEMPTS`  | `5`              |
    /// | `HEARTBEAT_INTERVAL_SECS` | `30`             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("MONITORING_HOST").unwrap_or(defaults.host);
        let tls = parse_bool(&lookup, "MONITORING_TLS", defaults.tls)?;
        let dev_mode = parse_bool(&lookup, "MONITORING_DEV", defaults.dev_mode)?;

        let base_ms = parse_u64(
            &lookup,
            "RECONNECT_BASE_MS",
            defaults.reconnect.base_delay.as_millis() as u64,
        )?;
        let max_ms = parse_u64(
            &lookup,
            "RECONNECT_MAX_MS",
            defaults.reconnect.max_delay.as_millis() as u64,
        )?;
        let max_attempts = parse_u64(
            &lookup,
            "RECONNECT_MAX_ATTEMPTS",
            u64::from(defaults.reconnect.max_attempts),
        )?;
        let max_attempts = u32::try_from(max_attempts).map_err(|_| ConfigError::Invalid {
            var: "RECONNECT_MAX_ATTEMPTS",
            expected: "a 32-bit unsigned integer",
            value: max_attempts.to_string(),
        })?;
        let heartbeat_secs = parse_u64(
            &lookup,
            "HEARTBEAT_INTERVAL_SECS",
            defaults.heartbeat_interval.as_secs(),
        )?;
        if heartbeat_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "HEARTBEAT_INTERVAL_SECS",
                expected: "greater than zero",
                value: "0".into(),
            });
        }

        Ok(Self {
            host,
            tls,
            dev_mode,
            reconnect: ReconnectConfig {
                base_delay: Duration::from_millis(base_ms),
                max_delay: Duration::from_millis(max_ms),
                max_attempts,
            },
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
        })
    }

    /// Full WebSocket URL of the monitoring endpoint.
    ///
    /// In dev mode a host with an explicit port is pointed at
    /// [`DEV_BACKEND_PORT`], since the front-end dev server and the
    /// backend listen on different ports.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        let host = match self.host.rsplit_once(':') {
            Some((name, _port)) if self.dev_mode => format!("{name}:{DEV_BACKEND_PORT}"),
            _ => self.host.clone(),
        };
        format!("{scheme}://{host}{MONITORING_PATH}")
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                expected: "a boolean",
                value,
            }),
        },
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "an unsigned integer",
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.reconnect.max_attempts, 5);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MONITORING_HOST", "monitor.example.com"),
            ("MONITORING_TLS", "true"),
            ("RECONNECT_BASE_MS", "1000"),
            ("RECONNECT_MAX_MS", "10000"),
            ("RECONNECT_MAX_ATTEMPTS", "8"),
            ("HEARTBEAT_INTERVAL_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.host, "monitor.example.com");
        assert!(config.tls);
        assert_eq!(config.reconnect.base_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(10));
        assert_eq!(config.reconnect.max_attempts, 8);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_matches!(
            ClientConfig::from_lookup(lookup(&[("MONITORING_TLS", "maybe")])),
            Err(ConfigError::Invalid { var: "MONITORING_TLS", .. })
        );
        assert_matches!(
            ClientConfig::from_lookup(lookup(&[("RECONNECT_MAX_ATTEMPTS", "-1")])),
            Err(ConfigError::Invalid { var: "RECONNECT_MAX_ATTEMPTS", .. })
        );
        assert_matches!(
            ClientConfig::from_lookup(lookup(&[("HEARTBEAT_INTERVAL_SECS", "0")])),
            Err(ConfigError::Invalid { var: "HEARTBEAT_INTERVAL_SECS", .. })
        );
    }

    #[test]
    fn endpoint_url_uses_monitoring_path() {
        let config = ClientConfig {
            host: "monitor.example.com".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "ws://monitor.example.com/ws/monitoring");

        let secure = ClientConfig {
            tls: true,
            ..config
        };
        assert_eq!(secure.endpoint_url(), "wss://monitor.example.com/ws/monitoring");
    }

    #[test]
    fn dev_mode_redirects_explicit_port() {
        let config = ClientConfig {
            host: "localhost:5173".into(),
            dev_mode: true,
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "ws://localhost:5000/ws/monitoring");
    }

    #[test]
    fn dev_mode_leaves_portless_host_alone() {
        let config = ClientConfig {
            host: "monitor.local".into(),
            dev_mode: true,
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "ws://monitor.local/ws/monitoring");
    }

    #[test]
    fn production_keeps_explicit_port() {
        let config = ClientConfig {
            host: "monitor.example.com:8443".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "ws://monitor.example.com:8443/ws/monitoring");
    }
}
