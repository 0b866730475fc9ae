//! Presence repository — transition log and snapshot upserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use saphari_core::error::{AppError, ErrorKind};
use saphari_core::result::AppResult;
use saphari_core::traits::PresenceStore;
use saphari_entity::presence::PresenceEvent;

/// Repository for presence events and device presence snapshots.
#[derive(Debug, Clone)]
pub struct PresenceRepository {
    pool: PgPool,
}

impl PresenceRepository {
    /// Create a new presence repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent presence events for a device, newest first.
    pub async fn recent_events(&self, device_id: &str, limit: i64) -> AppResult<Vec<PresenceEvent>> {
        sqlx::query_as::<_, PresenceEvent>(
            "SELECT * FROM presence_events WHERE device_id = $1 \
             ORDER BY occurred_at DESC LIMIT $2",
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list presence events", e)
        })
    }
}

#[async_trait]
impl PresenceStore for PresenceRepository {
    async fn append_presence_event(
        &self,
        device_id: &str,
        online: bool,
        occurred_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO presence_events (device_id, online, occurred_at) VALUES ($1, $2, $3)",
        )
        .bind(device_id)
        .bind(online)
        .bind(occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append presence event", e)
        })?;
        Ok(())
    }

    async fn upsert_device_presence(
        &self,
        device_id: &str,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE devices SET online = $2, last_seen = $3 WHERE id = $1")
            .bind(device_id)
            .bind(online)
            .bind(last_seen)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to upsert device presence", e)
            })?;
        Ok(())
    }
}
