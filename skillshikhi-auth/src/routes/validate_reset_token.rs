use axum::extract::{Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::ApiResponse;

use crate::models::PasswordReset;
use crate::schema::password_resets;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateResetTokenQuery {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResetTokenResponse {
    pub valid: bool,
}

/// GET /validate-reset-token?email=...&code=...
///
/// Lets the reset form check a code before the user types a new password.
/// Never distinguishes "no such account" from "bad code".
pub async fn validate_reset_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ValidateResetTokenQuery>,
) -> AppResult<Json<ApiResponse<ValidateResetTokenResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user_id: Option<Uuid> = users::table
        .filter(users::email.eq(query.email.to_lowercase()))
        .select(users::id)
        .first(&mut conn)
        .optional()?;

    let valid = match user_id {
        Some(user_id) => {
            let reset: Option<PasswordReset> = password_resets::table
                .filter(password_resets::user_id.eq(user_id))
                .filter(password_resets::code.eq(&query.code))
                .filter(password_resets::used_at.is_null())
                .order(password_resets::created_at.desc())
                .first(&mut conn)
                .optional()?;

            reset.map(|r| r.expires_at >= chrono::Utc::now()).unwrap_or(false)
        }
        None => false,
    };

    Ok(Json(ApiResponse::ok(ValidateResetTokenResponse { valid })))
}
