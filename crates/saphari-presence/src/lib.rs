//! # saphari-presence
//!
//! Device presence tracking for the Saphari gateway:
//!
//! - in-memory per-device state (last seen + online flag) fed by broker
//!   traffic
//! - TTL-based demotion of silent devices, checked by a periodic sweep
//! - periodic persistence flush bounded by a minimum snapshot age
//! - topic/payload normalization so every status variant collapses to one
//!   canonical wire shape

pub mod normalize;
pub mod sweeper;
pub mod tracker;

pub use normalize::normalize_topic_payload;
pub use tracker::{DevicePresence, PresenceTracker, PresenceTransition};
