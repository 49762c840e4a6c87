//! Conversation and messaging handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{ConversationSummary, InboxEntry, Message};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Serialize)]
pub struct InboxResponse {
    pub conversations: Vec<InboxEntry>,
}

#[derive(Serialize)]
pub struct MessagesResponse {
    pub conversation_id: Uuid,
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// List every conversation the current user takes part in
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<InboxResponse>, AppError> {
    let conversations = state.conversation_service().list_for_user(ctx.user_id).await?;
    Ok(Json(InboxResponse { conversations }))
}

/// Get one conversation
pub async fn get_conversation(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ConversationSummary>, AppError> {
    let summary = state
        .conversation_service()
        .get_for_user(conversation_id, ctx.user_id)
        .await?;
    Ok(Json(summary))
}

/// Full message history, oldest first
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .conversation_service()
        .list_messages_for_user(conversation_id, ctx.user_id)
        .await?;
    Ok(Json(MessagesResponse {
        conversation_id,
        messages,
    }))
}

/// Append a message to a conversation
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = state
        .conversation_service()
        .send_message_as_participant(conversation_id, ctx.user_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
