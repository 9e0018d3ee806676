//! Message history and status handlers.

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use kinnect_core::error::AppError;
use kinnect_core::types::{MessageId, UserId};
use kinnect_entity::message::{Message, MessageStatus};

use crate::dto::request::StatusUpdateRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/messages/{user_a}/{user_b}
///
/// Full conversation history between two users, ascending by creation
/// time. The caller must be one of the two parties.
pub async fn conversation_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((user_a, user_b)): Path<(UserId, UserId)>,
) -> ApiResult<Json<ApiResponse<Vec<Message>>>> {
    if auth.user_id != user_a && auth.user_id != user_b {
        return Err(AppError::authentication("Not a party to this conversation").into());
    }

    let messages = state.messages.history(user_a, user_b).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// PATCH /api/messages/{id}/status
///
/// REST fallback for clients without a live socket. Pushes the same
/// status update to the sender's sessions as the WebSocket path.
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<MessageId>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<Json<ApiResponse<Message>>> {
    let advance = match body.status {
        MessageStatus::Sent => {
            return Err(AppError::validation("Status cannot move back to sent").into());
        }
        MessageStatus::Delivered => state.engine.delivery.mark_delivered(message_id).await?,
        MessageStatus::Read => state.engine.delivery.mark_read(message_id).await?,
    };

    info!(
        message_id = %message_id,
        status = %advance.message.status,
        changed = advance.changed,
        user_id = %auth.user_id,
        "Status updated via REST"
    );
    Ok(Json(ApiResponse::ok(advance.message)))
}
