use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::auth::{TokenPair, UserRole};
use skillshikhi_shared::types::ApiResponse;

use crate::models::{NewRefreshToken, RefreshToken};
use crate::schema::refresh_tokens;
use crate::services::token_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let token_hash = token_service::hash_token(&req.refresh_token);

    let stored: RefreshToken = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(&token_hash))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid, "invalid refresh token"))?;

    if stored.revoked_at.is_some() {
        return Err(AppError::new(ErrorCode::RefreshTokenRevoked, "refresh token revoked"));
    }
    if stored.expires_at < chrono::Utc::now() {
        return Err(AppError::new(ErrorCode::TokenExpired, "refresh token expired"));
    }

    // Role and ban state are read fresh: a demoted or banned user does not
    // get a new access token with stale privileges.
    let (role_str, is_banned): (String, bool) = users::table
        .find(stored.user_id)
        .select((users::role, users::is_banned))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid, "invalid refresh token"))?;

    if is_banned {
        return Err(AppError::new(ErrorCode::UserBanned, "account is banned"));
    }

    let role = role_str.parse::<UserRole>().unwrap_or(UserRole::User);

    // Rotate: revoke the presented token, issue a fresh pair.
    diesel::update(refresh_tokens::table.find(stored.id))
        .set(refresh_tokens::revoked_at.eq(Some(chrono::Utc::now())))
        .execute(&mut conn)?;

    let (token_pair, refresh_hash) = token_service::create_token_pair(
        stored.user_id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    let new_rt = NewRefreshToken {
        user_id: stored.user_id,
        token_hash: refresh_hash,
        device_fingerprint: stored.device_fingerprint,
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(state.config.jwt_refresh_ttl),
    };
    diesel::insert_into(refresh_tokens::table)
        .values(&new_rt)
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(token_pair)))
}
