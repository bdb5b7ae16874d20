use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use skillshikhi_shared::errors::{AppError, AppResult};
use skillshikhi_shared::middleware::AdminUser;
use skillshikhi_shared::types::api::ApiResponse;

use crate::models::DailySnapshot;
use crate::schema::daily_snapshots;
use crate::services::aggregation;
use crate::AppState;

// --- Query / response types ---

#[derive(Debug, Deserialize)]
pub struct SnapshotRangeQuery {
    /// Start date in YYYY-MM-DD format; defaults to 30 days before `to`.
    pub from: Option<String>,
    /// End date in YYYY-MM-DD format; defaults to today.
    pub to: Option<String>,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotWithTrend {
    #[serde(flatten)]
    pub snapshot: DailySnapshot,
    /// Percent change vs the previous day's snapshot, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_users_change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_users_change_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateSnapshotRequest {
    /// Defaults to today.
    pub date: Option<String>,
}

// --- Trend / CSV helpers ---

pub fn percent_change(current: i64, previous: i64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    let change = (current - previous) as f64 / previous as f64 * 100.0;
    Some((change * 10.0).round() / 10.0)
}

/// Attach read-time trends to a date-descending snapshot list. Each entry is
/// compared with its successor in the list (the previous calendar snapshot);
/// nothing is persisted.
pub fn with_trends(snapshots: Vec<DailySnapshot>) -> Vec<SnapshotWithTrend> {
    let mut result = Vec::with_capacity(snapshots.len());
    for (i, snapshot) in snapshots.iter().enumerate() {
        let previous = snapshots.get(i + 1);
        result.push(SnapshotWithTrend {
            active_users_change_pct: previous
                .and_then(|p| percent_change(snapshot.active_users, p.active_users)),
            new_users_change_pct: previous
                .and_then(|p| percent_change(snapshot.new_users, p.new_users)),
            snapshot: snapshot.clone(),
        });
    }
    result
}

pub fn render_csv(snapshots: &[DailySnapshot]) -> String {
    let mut csv = String::from(
        "date,active_users,new_users,sessions_created,sessions_completed,reports_created,reports_resolved,moderation_actions\n",
    );
    for s in snapshots {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            s.date,
            s.active_users,
            s.new_users,
            s.sessions_created,
            s.sessions_completed,
            s.reports_created,
            s.reports_resolved,
            s.moderation_actions,
        ));
    }
    csv
}

fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid '{field}' date format, expected YYYY-MM-DD")))
}

// --- GET /admin/analytics?from=&to=&format= ---

pub async fn get_snapshots(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SnapshotRangeQuery>,
) -> AppResult<Response> {
    let to = match query.to.as_deref() {
        Some(raw) => parse_date(raw, "to")?,
        None => Utc::now().date_naive(),
    };
    let from = match query.from.as_deref() {
        Some(raw) => parse_date(raw, "from")?,
        None => to - chrono::Duration::days(30),
    };

    if from > to {
        return Err(AppError::bad_request("'from' date must be before or equal to 'to' date"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let snapshots: Vec<DailySnapshot> = daily_snapshots::table
        .filter(daily_snapshots::date.ge(from))
        .filter(daily_snapshots::date.le(to))
        .order(daily_snapshots::date.desc())
        .load(&mut conn)?;

    if query.format.as_deref() == Some("csv") {
        let csv = render_csv(&snapshots);
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"analytics.csv\""),
            ],
            csv,
        )
            .into_response());
    }

    let enriched = with_trends(snapshots);
    Ok(Json(ApiResponse::ok(enriched)).into_response())
}

// --- POST /admin/analytics/generate ---

pub async fn generate_snapshot(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateSnapshotRequest>,
) -> AppResult<Json<ApiResponse<DailySnapshot>>> {
    let date = match body.date.as_deref() {
        Some(raw) => parse_date(raw, "date")?,
        None => Utc::now().date_naive(),
    };

    let snapshot = aggregation::generate_snapshot(&state.db, date)
        .map_err(|e| AppError::internal(format!("snapshot generation failed: {e}")))?;

    Ok(Json(ApiResponse::ok(snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(date: &str, active: i64, new_users: i64) -> DailySnapshot {
        DailySnapshot {
            date: date.parse().unwrap(),
            active_users: active,
            new_users,
            sessions_created: 0,
            sessions_completed: 0,
            reports_created: 0,
            reports_resolved: 0,
            moderation_actions: 0,
            top_active: serde_json::json!([]),
            top_reported: serde_json::json!([]),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn percent_change_rounds_to_one_decimal() {
        assert_eq!(percent_change(150, 100), Some(50.0));
        assert_eq!(percent_change(100, 150), Some(-33.3));
        assert_eq!(percent_change(100, 100), Some(0.0));
    }

    #[test]
    fn percent_change_from_zero_is_undefined() {
        assert_eq!(percent_change(10, 0), None);
    }

    #[test]
    fn trends_compare_adjacent_snapshots_descending() {
        let list = vec![
            snapshot("2025-03-03", 120, 10),
            snapshot("2025-03-02", 100, 0),
            snapshot("2025-03-01", 80, 5),
        ];
        let enriched = with_trends(list);

        assert_eq!(enriched[0].active_users_change_pct, Some(20.0));
        // previous day had zero new users, so the trend is undefined
        assert_eq!(enriched[0].new_users_change_pct, None);
        assert_eq!(enriched[1].active_users_change_pct, Some(25.0));
        // oldest snapshot has nothing to compare against
        assert_eq!(enriched[2].active_users_change_pct, None);
    }

    #[test]
    fn csv_has_header_and_one_line_per_snapshot() {
        let list = vec![snapshot("2025-03-02", 100, 7), snapshot("2025-03-01", 80, 5)];
        let csv = render_csv(&list);
        let lines: Vec<&str> = csv.trim_end().split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,active_users"));
        assert!(lines[1].starts_with("2025-03-02,100,7"));
    }
}
