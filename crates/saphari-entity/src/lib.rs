//! # saphari-entity
//!
//! Database entity models shared between the repository layer and the
//! HTTP surface.

pub mod device;
pub mod presence;

pub use device::Device;
pub use presence::PresenceEvent;
