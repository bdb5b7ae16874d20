use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::ApiResponse;

use crate::models::NewPasswordReset;
use crate::schema::password_resets;
use crate::services::auth_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// POST /forgot-password
///
/// Always answers 200 so the endpoint cannot be used to probe which emails
/// are registered. The reset code is only created and mailed when the
/// account exists.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user_id: Option<Uuid> = users::table
        .filter(users::email.eq(req.email.to_lowercase()))
        .select(users::id)
        .first(&mut conn)
        .optional()?;

    if let Some(user_id) = user_id {
        let code = auth_service::generate_reset_code();
        let reset = NewPasswordReset {
            user_id,
            code: code.clone(),
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(15),
        };
        diesel::insert_into(password_resets::table)
            .values(&reset)
            .execute(&mut conn)?;

        if let Err(e) = state.email.send_password_reset_code(&req.email.to_lowercase(), &code).await {
            tracing::error!(error = %e, "failed to send password reset email");
        }

        tracing::info!(user_id = %user_id, "password reset code issued");
    }

    Ok(Json(ApiResponse::ok("if the email exists, a reset code has been sent")))
}
