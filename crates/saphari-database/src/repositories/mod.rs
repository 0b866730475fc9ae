//! Repository implementations over the PostgreSQL pool.

pub mod device;
pub mod presence;

pub use device::DeviceRepository;
pub use presence::PresenceRepository;
