use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::middleware::AdminUser;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::DeviceSession;
use crate::schema::device_sessions;
use crate::services::session_service;
use crate::AppState;

// --- Internal heartbeat (called by the gateway, fire-and-forget) ---

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// POST /internal/sessions/heartbeat
///
/// Not exposed through the gateway; the gateway calls it after each
/// successful token validation.
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HeartbeatRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    session_service::record_heartbeat(
        &state.db,
        req.user_id,
        req.token_id,
        req.ip_address,
        req.user_agent,
    )?;

    Ok(Json(ApiResponse::ok("recorded")))
}

/// POST /admin/sessions
///
/// Self-reported heartbeat for the calling token, used by the admin console
/// alongside the gateway-driven heartbeats.
pub async fn record_own_session(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    session_service::record_heartbeat(&state.db, user.id, user.token_id, ip_address, user_agent)?;

    Ok(Json(ApiResponse::ok("recorded")))
}

// --- Admin device-session views ---

#[derive(Debug, Deserialize)]
pub struct SessionFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub active: Option<bool>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl SessionFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// GET /admin/sessions
pub async fn list_sessions(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<DeviceSession>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (items, total): (Vec<DeviceSession>, i64) = if let Some(active) = params.active {
        let items = device_sessions::table
            .filter(device_sessions::is_active.eq(active))
            .order(device_sessions::last_activity.desc())
            .offset(offset)
            .limit(limit)
            .load::<DeviceSession>(&mut conn)?;

        let total: i64 = device_sessions::table
            .filter(device_sessions::is_active.eq(active))
            .count()
            .get_result(&mut conn)?;

        (items, total)
    } else {
        let items = device_sessions::table
            .order(device_sessions::last_activity.desc())
            .offset(offset)
            .limit(limit)
            .load::<DeviceSession>(&mut conn)?;

        let total: i64 = device_sessions::table
            .count()
            .get_result(&mut conn)?;

        (items, total)
    };

    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}

#[derive(Debug, Deserialize)]
pub struct TerminateSessionRequest {
    pub reason: Option<String>,
}

/// PATCH /admin/sessions/:id/terminate
///
/// Only valid while the session is active. The update is conditional on
/// `is_active` so two admins terminating the same session race to a single
/// winner; the loser gets a conflict.
pub async fn terminate_session(
    admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<TerminateSessionRequest>,
) -> AppResult<Json<ApiResponse<DeviceSession>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let reason = req.reason.unwrap_or_else(|| "terminated by admin".to_string());

    let updated: Option<DeviceSession> = diesel::update(
        device_sessions::table
            .find(session_id)
            .filter(device_sessions::is_active.eq(true)),
    )
    .set((
        device_sessions::is_active.eq(false),
        device_sessions::ended_at.eq(Some(Utc::now())),
        device_sessions::termination_reason.eq(Some(reason)),
        device_sessions::terminated_by.eq(Some(admin.0.id)),
    ))
    .get_result(&mut conn)
    .optional()?;

    match updated {
        Some(session) => {
            tracing::info!(session_id = %session_id, admin_id = %admin.0.id, "device session terminated");
            Ok(Json(ApiResponse::ok(session)))
        }
        None => {
            // Distinguish a missing session from one already terminated.
            let exists: bool = device_sessions::table
                .find(session_id)
                .count()
                .get_result::<i64>(&mut conn)
                .map(|c| c > 0)
                .unwrap_or(false);

            if exists {
                Err(AppError::new(
                    ErrorCode::SessionAlreadyTerminated,
                    "session is not active",
                ))
            } else {
                Err(AppError::new(
                    ErrorCode::DeviceSessionNotFound,
                    "session not found",
                ))
            }
        }
    }
}
