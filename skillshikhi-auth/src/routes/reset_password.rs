use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::ApiResponse;

use crate::models::PasswordReset;
use crate::schema::{password_resets, refresh_tokens};
use crate::services::auth_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    auth_service::validate_password(&req.new_password)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user_id: uuid::Uuid = users::table
        .filter(users::email.eq(req.email.to_lowercase()))
        .select(users::id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ResetCodeInvalid, "invalid reset code"))?;

    let reset: PasswordReset = password_resets::table
        .filter(password_resets::user_id.eq(user_id))
        .filter(password_resets::code.eq(&req.code))
        .filter(password_resets::used_at.is_null())
        .order(password_resets::created_at.desc())
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ResetCodeInvalid, "invalid reset code"))?;

    if reset.expires_at < chrono::Utc::now() {
        return Err(AppError::new(ErrorCode::ResetCodeExpired, "reset code expired"));
    }

    // Mark code as used
    diesel::update(password_resets::table.find(reset.id))
        .set(password_resets::used_at.eq(Some(chrono::Utc::now())))
        .execute(&mut conn)?;

    // Update password
    let new_hash = auth_service::hash_password(&req.new_password)?;
    diesel::update(users::table.find(user_id))
        .set((
            users::password_hash.eq(new_hash),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    // Revoke all refresh tokens for this user
    diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::revoked_at.is_null()),
    )
    .set(refresh_tokens::revoked_at.eq(Some(chrono::Utc::now())))
    .execute(&mut conn)?;

    tracing::info!(user_id = %user_id, "password reset");

    Ok(Json(ApiResponse::ok("password reset successful")))
}
