//! Direct message handlers
//!
//! Thin adapters from HTTP to the messaging service. The caller is always
//! the authenticated user; ids in paths and bodies are never trusted for
//! identity.

use axum::{extract::State, Json};
use dm_service::{
    ConversationMessagesResponse, ConversationPreviewResponse, MarkReadResponse,
    SendMessageRequest, SendMessageResponse, UnreadCountResponse,
};

use crate::extractors::{
    AuthUser, ConversationIdPath, OtherUserIdPath, Pagination, SnowflakePath, ValidatedJson,
};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Send a message, opening the conversation on first contact
///
/// POST /messages/send
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> ApiResult<Created<Json<SendMessageResponse>>> {
    let service = state.messaging();
    let response = service
        .send_message(auth.user_id, request.to, request.message)
        .await?;
    Ok(Created(Json(response)))
}

/// Inbox
///
/// GET /messages/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<ConversationPreviewResponse>>> {
    let service = state.messaging();
    let conversations = service.list_conversations(auth.user_id).await?;
    Ok(Json(conversations))
}

/// Page of a conversation; marks the caller's incoming messages read
///
/// GET /messages/conversations/{conversation_id}
pub async fn get_conversation_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(path): SnowflakePath<ConversationIdPath>,
    pagination: Pagination,
) -> ApiResult<Json<ConversationMessagesResponse>> {
    let conversation_id = path.conversation_id()?;

    let service = state.messaging();
    let page = service
        .get_conversation_messages(auth.user_id, conversation_id, pagination.to_query())
        .await?;
    Ok(Json(page))
}

/// Explicit read action
///
/// POST /messages/conversations/{conversation_id}/read
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(path): SnowflakePath<ConversationIdPath>,
) -> ApiResult<Json<MarkReadResponse>> {
    let conversation_id = path.conversation_id()?;

    let service = state.messaging();
    let response = service
        .mark_conversation_read(auth.user_id, conversation_id)
        .await?;
    Ok(Json(response))
}

/// Thread with another user, addressed by their id
///
/// GET /messages/conversation/{other_user_id}
pub async fn get_messages_with_user(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(path): SnowflakePath<OtherUserIdPath>,
    pagination: Pagination,
) -> ApiResult<Json<ConversationMessagesResponse>> {
    let other_user_id = path.other_user_id()?;

    let service = state.messaging();
    let page = service
        .get_messages_with_user(auth.user_id, other_user_id, pagination.to_query())
        .await?;
    Ok(Json(page))
}

/// Unread badge
///
/// GET /messages/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UnreadCountResponse>> {
    let service = state.messaging();
    let response = service.unread_count(auth.user_id).await?;
    Ok(Json(response))
}
