use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::models::User;
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::auth::UserRole;
use skillshikhi_shared::types::ApiResponse;

use crate::models::NewRefreshToken;
use crate::routes::register::AuthResponse;
use crate::schema::refresh_tokens;
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device_fingerprint: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .filter(users::email.eq(req.email.to_lowercase()))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    if user.is_banned {
        let reason = user.ban_reason.as_deref().unwrap_or("account banned");
        return Err(AppError::new(ErrorCode::UserBanned, format!("account banned: {reason}")));
    }

    let valid = auth_service::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    let role = user.role.parse::<UserRole>().unwrap_or(UserRole::User);

    let (token_pair, refresh_hash) = token_service::create_token_pair(
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    let new_rt = NewRefreshToken {
        user_id: user.id,
        token_hash: refresh_hash,
        device_fingerprint: req.device_fingerprint,
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(state.config.jwt_refresh_ttl),
    };
    diesel::insert_into(refresh_tokens::table)
        .values(&new_rt)
        .execute(&mut conn)?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(AuthResponse { token: token_pair, user })))
}
