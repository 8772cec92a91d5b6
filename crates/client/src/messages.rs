//! Monitoring WebSocket frame parser.
//!
//! The backend sends JSON frames shaped `{"type": "<kind>", "data": ...}`.
//! [`parse_frame`] reads the envelope, filters keep-alive
//! acknowledgements, and classifies everything else into a
//! [`MonitoringEvent`]. Unknown kinds are passed through as
//! [`MonitoringEvent::Unknown`].

use serde::Deserialize;

use crate::events::MonitoringEvent;
use crate::heartbeat;

/// Raw `{type, data}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Result of classifying one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Keep-alive acknowledgement. Consumed, never dispatched.
    Ack,
    /// Anything that should reach subscribers.
    Event(MonitoringEvent),
}

/// Parse a text frame into its classified form.
///
/// Returns `Err` for malformed JSON, a missing `type`, or a known type
/// whose payload does not have the expected shape. Callers should log
/// and drop such frames.
pub fn parse_frame(text: &str) -> Result<Inbound, serde_json::Error> {
    let frame: Frame = serde_json::from_str(text)?;
    classify(frame)
}

/// Classify an already-decoded envelope.
pub fn classify(frame: Frame) -> Result<Inbound, serde_json::Error> {
    use serde_json::from_value;

    let Frame { kind, data } = frame;
    if heartbeat::is_ack(&kind) {
        return Ok(Inbound::Ack);
    }

    let event = match kind.as_str() {
        "devices" => MonitoringEvent::Devices(from_value(data)?),
        "alerts" => MonitoringEvent::Alerts(from_value(data)?),
        "monitorUpdate" => MonitoringEvent::MonitorUpdate(from_value(data)?),
        "deviceStatus" => MonitoringEvent::DeviceStatus(from_value(data)?),
        "monitorResult" => MonitoringEvent::MonitorResult(from_value(data)?),
        "alert" => MonitoringEvent::Alert(Box::new(from_value(data)?)),
        _ => MonitoringEvent::Unknown {
            event_type: kind,
            data,
        },
    };

    Ok(Inbound::Event(event))
}
