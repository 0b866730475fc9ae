//! Device repository — the directory behind access resolution.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use saphari_core::error::{AppError, ErrorKind};
use saphari_core::result::AppResult;
use saphari_core::traits::{DeviceAccess, DeviceDirectory};
use saphari_entity::device::Device;

/// Repository for device rows and access grants.
#[derive(Debug, Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Create a new device repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a single device by id.
    pub async fn find_by_id(&self, device_id: &str) -> AppResult<Option<Device>> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch device", e))
    }

    /// List all devices owned by or granted to a user.
    pub async fn find_visible_to(&self, user_id: Uuid) -> AppResult<Vec<Device>> {
        sqlx::query_as::<_, Device>(
            "SELECT d.* FROM devices d \
             LEFT JOIN device_grants g ON g.device_id = d.id \
             WHERE d.owner_id = $1 OR g.user_id = $1 \
             ORDER BY d.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list devices", e))
    }
}

#[async_trait]
impl DeviceDirectory for DeviceRepository {
    async fn owner_and_granted_users(&self, device_id: &str) -> AppResult<Option<DeviceAccess>> {
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM devices WHERE id = $1")
                .bind(device_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to fetch device owner", e)
                })?;

        let Some(owner_id) = owner else {
            return Ok(None);
        };

        let granted_user_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM device_grants WHERE device_id = $1")
                .bind(device_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to fetch device grants", e)
                })?;

        Ok(Some(DeviceAccess {
            owner_id,
            granted_user_ids,
        }))
    }
}
