//! User presence handler.

use axum::extract::{Path, State};
use axum::Json;

use kinnect_core::types::UserId;

use crate::dto::response::{ApiResponse, PresenceResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/users/{user_id}/presence
/// (also served at the legacy path GET /api/messages/{user_id}/status)
///
/// Live presence from the registry, with the persisted `last_seen` as a
/// fallback for users this process has never observed.
pub async fn presence(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<ApiResponse<PresenceResponse>>> {
    let registry = &state.engine.registry;
    let is_online = registry.is_online(user_id);

    let last_seen = match registry.last_seen(user_id) {
        Some(at) => Some(at),
        None => state
            .users
            .find_by_id(user_id)
            .await?
            .and_then(|user| user.last_seen),
    };

    Ok(Json(ApiResponse::ok(PresenceResponse {
        is_online,
        last_seen,
    })))
}
