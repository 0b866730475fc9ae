//! Core traits defined in `saphari-core` and implemented by other crates.
//!
//! These are the seams between the broker transport, the access resolver,
//! the presence tracker, and the WebSocket fan-out engine. Each component
//! receives its collaborators as `Arc<dyn Trait>` so tests can substitute
//! fakes without process-wide state.

pub mod broadcast;
pub mod directory;
pub mod handler;
pub mod presence_store;
pub mod resolver;

pub use broadcast::{BroadcastEvent, EventBroadcaster};
pub use directory::{DeviceAccess, DeviceDirectory};
pub use handler::DeviceMessageHandler;
pub use presence_store::PresenceStore;
pub use resolver::AccessResolver;
