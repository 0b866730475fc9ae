//! Device directory trait — the external lookup behind access resolution.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;

/// The users entitled to observe one device, as recorded in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAccess {
    /// The device owner.
    pub owner_id: Uuid,
    /// Additional users granted observation access.
    pub granted_user_ids: Vec<Uuid>,
}

impl DeviceAccess {
    /// All user ids covered by this access record (owner first).
    pub fn user_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        std::iter::once(self.owner_id).chain(self.granted_user_ids.iter().copied())
    }
}

/// Directory lookup for device ownership and grants.
#[async_trait]
pub trait DeviceDirectory: Send + Sync + 'static {
    /// Look up the owner and granted users for a device.
    ///
    /// Returns `Ok(None)` when the device is not registered.
    async fn owner_and_granted_users(&self, device_id: &str) -> AppResult<Option<DeviceAccess>>;
}
