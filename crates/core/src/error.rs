/// Errors raised while converting wire records into domain types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Unknown monitor type: {0}")]
    UnknownMonitorType(String),

    #[error("Invalid {monitor_type} monitor config: {source}")]
    InvalidConfig {
        monitor_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
