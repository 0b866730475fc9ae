//! Connection handles and per-user rooms.

pub mod handle;
pub mod rooms;
