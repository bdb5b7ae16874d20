use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::middleware::AdminUser;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::pagination::{Paginated, PaginationParams};

use crate::audit;
use crate::events::publisher;
use crate::models::{Report, REPORT_DISMISSED, REPORT_PENDING, REPORT_RESOLVED};
use crate::schema::reports;
use crate::AppState;

// --- Request / response types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Resolve,
    Dismiss,
}

impl ReportAction {
    fn target_status(self) -> &'static str {
        match self {
            ReportAction::Resolve => REPORT_RESOLVED,
            ReportAction::Dismiss => REPORT_DISMISSED,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ReportAction::Resolve => "resolve",
            ReportAction::Dismiss => "dismiss",
        }
    }
}

impl std::str::FromStr for ReportAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resolve" => Ok(ReportAction::Resolve),
            "dismiss" => Ok(ReportAction::Dismiss),
            _ => Err(format!("unknown report action: {s}")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub status: Option<String>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl ReportFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkReviewRequest {
    pub report_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub error: String,
}

/// Partial-success outcome of a bulk review: each id succeeds or fails on
/// its own, successes are never rolled back.
#[derive(Debug, Serialize)]
pub struct BulkSummary {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

pub fn summarize_bulk(results: Vec<(Uuid, Result<(), String>)>) -> BulkSummary {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(()) => succeeded.push(id),
            Err(error) => failed.push(BulkFailure { id, error }),
        }
    }
    BulkSummary { succeeded, failed }
}

// --- List reports (paginated, optional status filter) ---

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<ReportFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Report>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (items, total): (Vec<Report>, i64) = if let Some(ref status) = params.status {
        let items = reports::table
            .filter(reports::status.eq(status))
            .order(reports::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<Report>(&mut conn)?;

        let total: i64 = reports::table
            .filter(reports::status.eq(status))
            .count()
            .get_result(&mut conn)?;

        (items, total)
    } else {
        let items = reports::table
            .order(reports::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<Report>(&mut conn)?;

        let total: i64 = reports::table
            .count()
            .get_result(&mut conn)?;

        (items, total)
    };

    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}

// --- Get report details ---

pub async fn get_report(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let report = reports::table
        .find(report_id)
        .first::<Report>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;

    Ok(Json(ApiResponse::ok(report)))
}

// --- Review (resolve / dismiss) ---

/// Conditional update on status = pending. Two admins reviewing the same
/// report race to a single winner; the loser sees "already reviewed".
fn apply_review(
    conn: &mut diesel::pg::PgConnection,
    report_id: Uuid,
    admin_id: Uuid,
    action: ReportAction,
) -> AppResult<Report> {
    let updated: Option<Report> = diesel::update(
        reports::table
            .find(report_id)
            .filter(reports::status.eq(REPORT_PENDING)),
    )
    .set((
        reports::status.eq(action.target_status()),
        reports::reviewed_by.eq(Some(admin_id)),
        reports::reviewed_at.eq(Some(Utc::now())),
    ))
    .get_result(conn)
    .optional()?;

    match updated {
        Some(report) => Ok(report),
        None => {
            let exists: bool = reports::table
                .find(report_id)
                .count()
                .get_result::<i64>(conn)
                .map(|c| c > 0)
                .unwrap_or(false);

            if exists {
                Err(AppError::new(
                    ErrorCode::ReportAlreadyReviewed,
                    "this report has already been reviewed",
                ))
            } else {
                Err(AppError::new(ErrorCode::ReportNotFound, "report not found"))
            }
        }
    }
}

/// POST /admin/reports/:id/{resolve,dismiss}
pub async fn review_report(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path((report_id, action)): Path<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let action: ReportAction = action
        .parse()
        .map_err(|e: String| AppError::new(ErrorCode::ValidationError, e))?;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let report = apply_review(&mut conn, report_id, admin.0.id, action)?;

    audit::record(
        &mut conn,
        admin.0.id,
        &format!("report_{}", action.name()),
        Some(report.reported_id),
        Some(serde_json::json!({ "report_id": report_id })),
    )?;

    publisher::publish_report_reviewed(&state.rabbitmq, &report, admin.0.id).await;

    Ok(Json(ApiResponse::ok(report)))
}

/// POST /admin/reports/bulk/{resolve,dismiss}
///
/// Applies the single-record rule per id and reports partial success; a
/// failure on one id never rolls back the others.
pub async fn bulk_review_reports(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(action): Path<String>,
    Json(body): Json<BulkReviewRequest>,
) -> AppResult<Json<ApiResponse<BulkSummary>>> {
    let action: ReportAction = action
        .parse()
        .map_err(|e: String| AppError::new(ErrorCode::ValidationError, e))?;

    if body.report_ids.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "report_ids must not be empty"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let mut results = Vec::with_capacity(body.report_ids.len());
    let mut reviewed = Vec::new();

    for report_id in body.report_ids {
        match apply_review(&mut conn, report_id, admin.0.id, action) {
            Ok(report) => {
                results.push((report_id, Ok(())));
                reviewed.push(report);
            }
            Err(e) => {
                results.push((report_id, Err(e.to_string())));
            }
        }
    }

    let summary = summarize_bulk(results);

    audit::record(
        &mut conn,
        admin.0.id,
        &format!("report_bulk_{}", action.name()),
        None,
        Some(serde_json::json!({
            "succeeded": summary.succeeded,
            "failed": summary.failed.iter().map(|f| f.id).collect::<Vec<_>>(),
        })),
    )?;

    for report in &reviewed {
        publisher::publish_report_reviewed(&state.rabbitmq, report, admin.0.id).await;
    }

    Ok(Json(ApiResponse::ok(summary)))
}

// --- Audit log (paginated admin actions) ---

pub async fn get_audit_log(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<crate::models::AdminAction>>>> {
    use crate::schema::admin_actions;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let offset = params.offset() as i64;
    let limit = params.limit() as i64;

    let items = admin_actions::table
        .order(admin_actions::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<crate::models::AdminAction>(&mut conn)?;

    let total: i64 = admin_actions::table
        .count()
        .get_result(&mut conn)?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_summary_keeps_successes_when_one_fails() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::now_v7()).collect();
        let results = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                if i == 2 {
                    (*id, Err("this report has already been reviewed".to_string()))
                } else {
                    (*id, Ok(()))
                }
            })
            .collect();

        let summary = summarize_bulk(results);
        assert_eq!(summary.succeeded.len(), 4);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].id, ids[2]);
    }

    #[test]
    fn report_action_parsing() {
        assert_eq!("resolve".parse::<ReportAction>().unwrap(), ReportAction::Resolve);
        assert_eq!("dismiss".parse::<ReportAction>().unwrap(), ReportAction::Dismiss);
        assert!("approve".parse::<ReportAction>().is_err());
    }
}
