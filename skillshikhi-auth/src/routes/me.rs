use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::models::User;
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::ApiResponse;

use crate::AppState;

pub async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let stored: User = users::table
        .find(user.id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(stored)))
}
