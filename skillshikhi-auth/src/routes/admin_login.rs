use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::middleware::AdminUser;
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
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /admin/login
///
/// Same credential check as the regular login, but the stored role must
/// already be `admin`. The issued token carries the admin role claim and is
/// mirrored into the `adminToken` cookie the gateway honors when guarding
/// `/api/admin/*`.
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .filter(users::email.eq(req.email.to_lowercase()))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    if user.is_banned {
        return Err(AppError::new(ErrorCode::UserBanned, "account is banned"));
    }

    let valid = auth_service::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    if user.role.parse::<UserRole>() != Ok(UserRole::Admin) {
        return Err(AppError::new(ErrorCode::Forbidden, "admin access required"));
    }

    let (token_pair, refresh_hash) = token_service::create_token_pair(
        user.id,
        UserRole::Admin,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    let new_rt = NewRefreshToken {
        user_id: user.id,
        token_hash: refresh_hash,
        device_fingerprint: None,
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(state.config.jwt_refresh_ttl),
    };
    diesel::insert_into(refresh_tokens::table)
        .values(&new_rt)
        .execute(&mut conn)?;

    let cookie = format!(
        "adminToken={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token_pair.access_token, state.config.jwt_access_ttl
    );

    tracing::info!(user_id = %user.id, "admin logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::ok(AuthResponse { token: token_pair, user })),
    ))
}

/// GET /admin/login
///
/// Validates the bearer token as a live admin session. The `AdminUser`
/// extractor re-reads the stored role, so this returns 403 the moment the
/// account is demoted, regardless of what the token claims.
pub async fn validate_admin(
    admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .find(admin.0.id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(user)))
}
