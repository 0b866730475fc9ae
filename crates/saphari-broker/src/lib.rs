//! # saphari-broker
//!
//! The gateway's single connection to the MQTT broker. Subscribes to the
//! fixed set of device channels, routes each inbound message through
//! access resolution and presence tracking, and exposes fail-fast
//! publishing for outbound commands.

pub mod client;
pub mod dispatch;
pub mod topics;

pub use client::{BrokerClient, BrokerEventLoop};
pub use dispatch::InboundDispatcher;
