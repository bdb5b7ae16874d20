use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::AppResult;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::Notification;
use crate::services::notification_service;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked_read: usize,
}

/// GET /notifications
pub async fn list_notifications(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Notification>>>> {
    let (items, total) = notification_service::list_notifications(
        &state.db,
        user.id,
        params.limit() as i64,
        params.offset() as i64,
    )?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let unread = notification_service::count_unread(&state.db, user.id)?;
    Ok(Json(ApiResponse::ok(UnreadCountResponse { unread })))
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let marked_read = notification_service::mark_all_read(&state.db, user.id)?;
    Ok(Json(ApiResponse::ok(MarkAllReadResponse { marked_read })))
}

/// POST /notifications/:id/read
pub async fn mark_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_read(&state.db, notification_id, user.id)?;
    Ok(Json(ApiResponse::ok(notification)))
}
