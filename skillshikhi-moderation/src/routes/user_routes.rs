use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::models::{NewReport, Report, REPORT_PENDING, REPORT_REASONS};
use crate::schema::reports;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub reported_id: Uuid,
    pub reason: String,
    pub description: String,
    pub evidence_url: Option<String>,
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    // Cannot report self
    if auth.id == body.reported_id {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "you cannot report yourself"));
    }

    if !REPORT_REASONS.contains(&body.reason.as_str()) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!(
                "invalid reason '{}'. Must be one of: {}",
                body.reason,
                REPORT_REASONS.join(", ")
            ),
        ));
    }

    if body.description.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "description must not be empty"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let reported_exists: bool = users::table
        .find(body.reported_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if !reported_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "reported user not found"));
    }

    // Check for duplicate pending report from same reporter against same user
    let existing: i64 = reports::table
        .filter(reports::reporter_id.eq(auth.id))
        .filter(reports::reported_id.eq(body.reported_id))
        .filter(reports::status.eq(REPORT_PENDING))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    if existing > 0 {
        return Err(AppError::new(
            ErrorCode::DuplicateReport,
            "you already have a pending report against this user",
        ));
    }

    let new_report = NewReport {
        reporter_id: auth.id,
        reported_id: body.reported_id,
        reason: body.reason,
        description: body.description.trim().to_string(),
        evidence_url: body.evidence_url,
    };

    let report: Report = diesel::insert_into(reports::table)
        .values(&new_report)
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to create report: {e}")))?;

    // Publish event
    publisher::publish_report_created(
        &state.rabbitmq,
        report.id,
        report.reporter_id,
        report.reported_id,
        &report.reason,
    )
    .await;

    Ok(Json(ApiResponse::ok(report)))
}
