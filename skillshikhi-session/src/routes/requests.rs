use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::lifecycle::{check_transition, SessionAction, SessionStatus, TransitionError};
use crate::models::{NewSessionRequest, SessionRequest};
use crate::schema::session_requests;
use crate::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequestPayload {
    pub to_user_id: Uuid,
    pub skill: String,
    pub message: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    /// "sent", "received" or absent for both directions
    pub direction: Option<String>,
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /sessions
// ---------------------------------------------------------------------------

pub async fn create_request(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequestPayload>,
) -> AppResult<Json<ApiResponse<SessionRequest>>> {
    if auth_user.id == payload.to_user_id {
        return Err(AppError::new(
            ErrorCode::CannotRequestSelf,
            "cannot request a session with yourself",
        ));
    }

    let skill = payload.skill.trim().to_string();
    if skill.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "skill must not be empty"));
    }

    let mut conn = state
        .db
        .get()
        .map_err(|e| AppError::internal(format!("database connection error: {e}")))?;

    // Target must exist
    let target_exists: bool = users::table
        .find(payload.to_user_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if !target_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    // Friendly pre-check; the partial unique index on
    // (from_user_id, to_user_id, skill) WHERE status = 'pending' is the
    // actual guard under concurrency.
    let duplicate: bool = session_requests::table
        .filter(session_requests::from_user_id.eq(auth_user.id))
        .filter(session_requests::to_user_id.eq(payload.to_user_id))
        .filter(session_requests::skill.eq(&skill))
        .filter(session_requests::status.eq(SessionStatus::Pending.as_str()))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if duplicate {
        return Err(AppError::new(
            ErrorCode::DuplicatePendingRequest,
            "a pending request for this skill already exists",
        ));
    }

    let new_request = NewSessionRequest {
        from_user_id: auth_user.id,
        to_user_id: payload.to_user_id,
        skill,
        message: payload.message,
        preferred_date: payload.preferred_date,
    };

    let request = diesel::insert_into(session_requests::table)
        .values(&new_request)
        .get_result::<SessionRequest>(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::new(
                ErrorCode::DuplicatePendingRequest,
                "a pending request for this skill already exists",
            ),
            other => AppError::Database(other),
        })?;

    let from_user_name: String = users::table
        .find(auth_user.id)
        .select(users::name)
        .first(&mut conn)
        .unwrap_or_else(|_| "someone".to_string());

    publisher::publish_session_requested(&state.rabbitmq, &request, &from_user_name).await;

    Ok(Json(ApiResponse::ok(request)))
}

// ---------------------------------------------------------------------------
// GET /sessions
// ---------------------------------------------------------------------------

pub async fn list_requests(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<Json<ApiResponse<Vec<SessionRequest>>>> {
    let mut conn = state
        .db
        .get()
        .map_err(|e| AppError::internal(format!("database connection error: {e}")))?;

    let mut db_query = session_requests::table.into_boxed();

    match query.direction.as_deref() {
        Some("sent") => {
            db_query = db_query.filter(session_requests::from_user_id.eq(auth_user.id));
        }
        Some("received") => {
            db_query = db_query.filter(session_requests::to_user_id.eq(auth_user.id));
        }
        _ => {
            db_query = db_query.filter(
                session_requests::from_user_id
                    .eq(auth_user.id)
                    .or(session_requests::to_user_id.eq(auth_user.id)),
            );
        }
    }

    if let Some(ref status) = query.status {
        status
            .parse::<SessionStatus>()
            .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;
        db_query = db_query.filter(session_requests::status.eq(status.clone()));
    }

    let requests = db_query
        .order(session_requests::created_at.desc())
        .load::<SessionRequest>(&mut conn)?;

    Ok(Json(ApiResponse::ok(requests)))
}

// ---------------------------------------------------------------------------
// GET /sessions/:id
// ---------------------------------------------------------------------------

pub async fn get_request(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionRequest>>> {
    let mut conn = state
        .db
        .get()
        .map_err(|e| AppError::internal(format!("database connection error: {e}")))?;

    let request = session_requests::table
        .find(request_id)
        .first::<SessionRequest>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::SessionRequestNotFound, "session request not found"))?;

    if request.party_of(auth_user.id).is_none() {
        return Err(AppError::forbidden("you are not part of this session request"));
    }

    Ok(Json(ApiResponse::ok(request)))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/{accept,reject,cancel,complete}
// ---------------------------------------------------------------------------

pub async fn transition_request(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((request_id, action)): Path<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<SessionRequest>>> {
    let action: SessionAction = action
        .parse()
        .map_err(|e: String| AppError::new(ErrorCode::ValidationError, e))?;

    let mut conn = state
        .db
        .get()
        .map_err(|e| AppError::internal(format!("database connection error: {e}")))?;

    let request = session_requests::table
        .find(request_id)
        .first::<SessionRequest>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::SessionRequestNotFound, "session request not found"))?;

    let party = request
        .party_of(auth_user.id)
        .ok_or_else(|| AppError::forbidden("you are not part of this session request"))?;

    let target = check_transition(request.current_status(), action, party).map_err(|e| match e {
        TransitionError::NotAuthorized { .. } => AppError::forbidden(e.to_string()),
        TransitionError::InvalidTransition { .. } => {
            AppError::new(ErrorCode::InvalidTransition, e.to_string())
        }
    })?;

    // The update is conditional on a status the action is allowed from, so a
    // concurrent transition that commits first leaves this one matching zero
    // rows instead of overwriting.
    let allowed: Vec<&str> = action.allowed_from().iter().map(|s| s.as_str()).collect();

    let updated: Option<SessionRequest> = diesel::update(
        session_requests::table
            .find(request_id)
            .filter(session_requests::status.eq_any(allowed)),
    )
    .set((
        session_requests::status.eq(target.as_str()),
        session_requests::responded_at.eq(Some(Utc::now())),
        session_requests::updated_at.eq(Utc::now()),
    ))
    .get_result(&mut conn)
    .optional()?;

    let updated = updated.ok_or_else(|| {
        AppError::new(
            ErrorCode::InvalidTransition,
            "request state changed, transition no longer valid",
        )
    })?;

    tracing::info!(
        request_id = %request_id,
        user_id = %auth_user.id,
        status = %updated.status,
        "session request transitioned"
    );

    publisher::publish_session_transitioned(&state.rabbitmq, &updated, auth_user.id).await;

    Ok(Json(ApiResponse::ok(updated)))
}
