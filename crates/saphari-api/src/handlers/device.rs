//! Device endpoints: listing and command publishing.

use axum::Json;
use axum::extract::{Path, State};

use saphari_broker::topics::command_topic;
use saphari_core::error::AppError;
use saphari_entity::device::Device;

use crate::dto::{ApiResponse, CommandRequest, CommandResponse};
use crate::error::ApiError;
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

/// GET /api/devices — devices visible to the caller.
pub async fn list_devices(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Device>>>, ApiError> {
    let devices = state.device_repo.find_visible_to(user.user_id()).await?;
    Ok(Json(ApiResponse::ok(devices)))
}

/// POST /api/devices/{id}/commands — publish a command to a device.
///
/// Publishing fails fast with 503 while the broker connection is down;
/// callers retry at their own pace.
pub async fn send_command(
    State(state): State<AppState>,
    user: AuthUser,
    Path(device_id): Path<String>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<ApiResponse<CommandResponse>>, ApiError> {
    if request.command.is_empty() || request.command.contains('/') {
        return Err(AppError::validation("Invalid command name").into());
    }

    // Same resolution path the broker uses, so grant changes (and their
    // cache invalidation) apply here too.
    let authorized = state.access_resolver.resolve(&device_id).await;
    if !authorized.contains(&user.user_id()) {
        return Err(AppError::forbidden("Not authorized to command this device").into());
    }

    let topic = command_topic(
        &state.config.broker.topic_prefix,
        &device_id,
        &request.command,
    );
    state
        .broker
        .publish(&topic, &request.payload.to_string())
        .await?;

    Ok(Json(ApiResponse::ok(CommandResponse { device_id, topic })))
}
