use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::models::{NewUser, User};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::auth::{TokenPair, UserRole};
use skillshikhi_shared::types::ApiResponse;

use crate::models::NewRefreshToken;
use crate::schema::refresh_tokens;
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: TokenPair,
    pub user: User,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    auth_service::validate_password(&req.password)?;

    let password_hash = auth_service::hash_password(&req.password)?;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Check if email already exists
    let exists: bool = users::table
        .filter(users::email.eq(&req.email.to_lowercase()))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if exists {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let new_user = NewUser {
        name: req.name.trim().to_string(),
        email: req.email.to_lowercase(),
        password_hash,
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)?;

    let (token_pair, refresh_hash) = token_service::create_token_pair(
        user.id,
        UserRole::User,
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

    // Publish registration event
    crate::events::publisher::publish_user_registered(&state.rabbitmq, user.id, &user.email, &user.name).await;

    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok(Json(ApiResponse::ok(AuthResponse { token: token_pair, user })))
}
