//! Handler trait for authorized inbound device messages.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;

/// Receives each inbound broker message that survived authorization.
///
/// The transport client has already extracted the device id, resolved the
/// authorized users, and updated presence by the time this is invoked.
#[async_trait]
pub trait DeviceMessageHandler: Send + Sync + 'static {
    /// Handle one inbound device message.
    async fn handle(
        &self,
        device_id: &str,
        topic: &str,
        payload: &str,
        authorized: Arc<HashSet<Uuid>>,
    ) -> AppResult<()>;
}
