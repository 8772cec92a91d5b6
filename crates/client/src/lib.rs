//! Real-time monitoring event client.
//!
//! Keeps a WebSocket connection to the monitoring backend open,
//! reconnects with bounded exponential backoff, fans classified events
//! out to subscribers, and mirrors server-side state into a keyed
//! read cache.
//!
//! Build a [`MonitoringClient`] with a [`ClientConfig`], a
//! [`transport::Connector`] and a [`cache::CacheStore`], then call
//! [`MonitoringClient::connect`].

pub mod cache;
pub mod compat;
pub mod config;
pub mod dispatcher;
pub mod events;
pub mod heartbeat;
pub mod manager;
pub mod messages;
pub mod reconnect;
pub mod sync;
pub mod transport;
pub mod websocket;

pub use cache::{CacheKey, CacheStore, CacheValue, QueryCache};
pub use config::ClientConfig;
pub use dispatcher::{EventDispatcher, Subscription};
pub use events::MonitoringEvent;
pub use manager::{ConnectionState, MonitoringClient};
