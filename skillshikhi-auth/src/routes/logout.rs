use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use skillshikhi_shared::errors::{AppError, AppResult};
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::ApiResponse;

use crate::schema::{device_sessions, refresh_tokens};
use crate::services::token_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

pub async fn logout(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if let Some(refresh) = req.refresh_token {
        let token_hash = token_service::hash_token(&refresh);
        diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::user_id.eq(user.id))
                .filter(refresh_tokens::token_hash.eq(token_hash))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set(refresh_tokens::revoked_at.eq(Some(chrono::Utc::now())))
        .execute(&mut conn)?;
    }

    // Close the device session tied to this access token.
    diesel::update(
        device_sessions::table
            .filter(device_sessions::token_id.eq(user.token_id))
            .filter(device_sessions::is_active.eq(true)),
    )
    .set((
        device_sessions::is_active.eq(false),
        device_sessions::ended_at.eq(chrono::Utc::now()),
        device_sessions::termination_reason.eq("logout"),
    ))
    .execute(&mut conn)?;

    tracing::info!(user_id = %user.id, "user logged out");

    Ok(Json(ApiResponse::ok("logged out")))
}
