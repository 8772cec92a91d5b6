//! Keep-alive traffic on an open monitoring connection.
//!
//! While the transport is open the client sends `{"type":"ping"}` every
//! [`DEFAULT_HEARTBEAT_INTERVAL`]; the backend answers `{"type":"pong"}`.
//! Acknowledgements are swallowed by [`crate::messages::parse_frame`]
//! and never reach subscribers or the cache.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Client-to-server keep-alive frame type.
pub const MSG_TYPE_PING: &str = "ping";

/// Server-to-client acknowledgement frame type.
pub const MSG_TYPE_PONG: &str = "pong";

/// Interval between keep-alive frames.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Whether a frame type is the keep-alive acknowledgement.
pub fn is_ack(frame_type: &str) -> bool {
    frame_type == MSG_TYPE_PONG
}

/// Serialized keep-alive frame.
pub fn ping_frame() -> String {
    serde_json::json!({ "type": MSG_TYPE_PING }).to_string()
}

/// Periodic keep-alive timer for one open session.
///
/// The first tick fires one full period after creation. Dropping the
/// heartbeat cancels it, so a session simply lets it go out of scope when
/// the connection leaves the open state.
pub struct Heartbeat {
    interval: Interval,
}

impl Heartbeat {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Wait for the next keep-alive slot.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
