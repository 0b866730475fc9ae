//! # saphari-realtime
//!
//! Real-time fan-out engine for the Saphari gateway:
//!
//! - per-user rooms of live WebSocket connections
//! - first-message authentication protocol types and close codes
//! - broadcast de-duplicated by connection identity
//! - a bridge that turns authorized broker messages into room multicasts

pub mod bridge;
pub mod close_code;
pub mod connection;
pub mod engine;
pub mod message;

pub use bridge::MessageBridge;
pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::rooms::RoomRegistry;
pub use engine::RealtimeEngine;
pub use message::{ClientMessage, ServerMessage};
