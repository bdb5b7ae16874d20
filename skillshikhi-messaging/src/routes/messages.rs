use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{Message, NewMessage};
use crate::schema::messages;
use crate::AppState;

const MAX_MESSAGE_LEN: usize = 4000;
const PREVIEW_LEN: usize = 80;

// --- Request / response DTOs ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked_read: usize,
}

fn content_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_LEN {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(PREVIEW_LEN).collect();
        format!("{truncated}…")
    }
}

// --- POST /messages ---

pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    if auth_user.id == req.recipient_id {
        return Err(AppError::new(ErrorCode::CannotMessageSelf, "cannot message yourself"));
    }

    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "message content must not be empty"));
    }
    if content.len() > MAX_MESSAGE_LEN {
        return Err(AppError::new(ErrorCode::ValidationError, "message content too long"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let recipient_exists: bool = users::table
        .find(req.recipient_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if !recipient_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "recipient not found"));
    }

    let new_message = NewMessage {
        sender_id: auth_user.id,
        recipient_id: req.recipient_id,
        content,
    };

    let message = diesel::insert_into(messages::table)
        .values(&new_message)
        .get_result::<Message>(&mut conn)?;

    let sender_name: String = users::table
        .find(auth_user.id)
        .select(users::name)
        .first(&mut conn)
        .unwrap_or_else(|_| "someone".to_string());

    publisher::publish_message_sent(
        &state.rabbitmq,
        &message,
        &sender_name,
        &content_preview(&message.content),
    )
    .await;

    Ok(Json(ApiResponse::ok(message)))
}

// --- GET /messages/:id (conversation with a user) ---

pub async fn get_conversation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(other_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Message>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let between = messages::sender_id
        .eq(auth_user.id)
        .and(messages::recipient_id.eq(other_id))
        .or(messages::sender_id.eq(other_id).and(messages::recipient_id.eq(auth_user.id)));

    let total: i64 = messages::table
        .filter(between)
        .count()
        .get_result(&mut conn)?;

    let items: Vec<Message> = messages::table
        .filter(between)
        .order(messages::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load(&mut conn)?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

// --- POST /messages/:id/read ---

/// Marks every unread message from the given user as read. Only the
/// recipient side is touched, so a user cannot flip read state on messages
/// they sent.
pub async fn mark_conversation_read(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(other_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let marked_read = diesel::update(
        messages::table
            .filter(messages::sender_id.eq(other_id))
            .filter(messages::recipient_id.eq(auth_user.id))
            .filter(messages::is_read.eq(false)),
    )
    .set(messages::is_read.eq(true))
    .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(MarkReadResponse { marked_read })))
}

// --- GET /messages/unread-count ---

pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total_unread: i64 = messages::table
        .filter(messages::recipient_id.eq(auth_user.id))
        .filter(messages::is_read.eq(false))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread })))
}

#[cfg(test)]
mod tests {
    use super::content_preview;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(content_preview("hello"), "hello");
    }

    #[test]
    fn long_content_is_truncated_on_char_boundary() {
        let long = "x".repeat(200);
        let preview = content_preview(&long);
        assert_eq!(preview.chars().count(), 81);
        assert!(preview.ends_with('…'));
    }
}
