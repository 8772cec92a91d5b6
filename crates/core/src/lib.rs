//! Domain records mirrored by the netmon monitoring client.
//!
//! Every type here is owned by the monitoring backend. The client only
//! deserializes them from WebSocket frames, merges status fragments into
//! them, and hands them to cache consumers.

pub mod alert;
pub mod dashboard;
pub mod device;
pub mod error;
pub mod monitor;
pub mod types;
