use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::PgTextExpressionMethods;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::middleware::AdminUser;
use skillshikhi_shared::models::User;
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::api::ApiResponse;
use skillshikhi_shared::types::auth::UserRole;
use skillshikhi_shared::types::pagination::{Paginated, PaginationParams};

use crate::audit;
use crate::events::publisher;
use crate::AppState;

// --- List users (paginated, optional search / ban filter) ---

#[derive(Debug, Deserialize)]
pub struct UserFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub q: Option<String>,
    pub banned: Option<bool>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<UserFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<User>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = PaginationParams {
        page: params.page,
        per_page: params.per_page,
    };

    let mut query = users::table.into_boxed();
    let mut count_query = users::table.select(count_star()).into_boxed();

    if let Some(ref q) = params.q {
        let pattern = format!("%{}%", q.replace('%', "\\%").replace('_', "\\_"));
        query = query.filter(
            users::name.ilike(pattern.clone()).or(users::email.ilike(pattern.clone())),
        );
        count_query = count_query.filter(
            users::name.ilike(pattern.clone()).or(users::email.ilike(pattern)),
        );
    }

    if let Some(banned) = params.banned {
        query = query.filter(users::is_banned.eq(banned));
        count_query = count_query.filter(users::is_banned.eq(banned));
    }

    let items: Vec<User> = query
        .order(users::created_at.desc())
        .offset(pagination.offset() as i64)
        .limit(pagination.limit() as i64)
        .load(&mut conn)?;

    let total: i64 = count_query.first(&mut conn)?;

    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}

// --- Promote ---

/// PATCH /admin/users/:id/promote
///
/// Conditional on the current role so promoting an already-admin user is a
/// conflict, not a no-op.
pub async fn promote_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let updated: Option<User> = diesel::update(
        users::table
            .find(user_id)
            .filter(users::role.eq(UserRole::User.to_string())),
    )
    .set((
        users::role.eq(UserRole::Admin.to_string()),
        users::updated_at.eq(Utc::now()),
    ))
    .get_result(&mut conn)
    .optional()?;

    let user = match updated {
        Some(user) => user,
        None => {
            return Err(user_role_conflict(&mut conn, user_id, ErrorCode::AlreadyAdmin,
                "user is already an admin"));
        }
    };

    audit::record(&mut conn, admin.0.id, "user_promote", Some(user_id), None)?;
    publisher::publish_role_changed(&state.rabbitmq, user_id, UserRole::Admin, admin.0.id).await;

    tracing::info!(user_id = %user_id, admin_id = %admin.0.id, "user promoted to admin");

    Ok(Json(ApiResponse::ok(user)))
}

// --- Demote ---

/// PATCH /admin/users/:id/demote
///
/// Self-demotion is forbidden before any state is consulted; demoting a
/// non-admin is a conflict. Outstanding admin tokens for the demoted user die
/// immediately because admin routes re-read the stored role.
pub async fn demote_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    if admin.0.id == user_id {
        return Err(AppError::new(ErrorCode::CannotDemoteSelf, "you cannot demote yourself"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let updated: Option<User> = diesel::update(
        users::table
            .find(user_id)
            .filter(users::role.eq(UserRole::Admin.to_string())),
    )
    .set((
        users::role.eq(UserRole::User.to_string()),
        users::updated_at.eq(Utc::now()),
    ))
    .get_result(&mut conn)
    .optional()?;

    let user = match updated {
        Some(user) => user,
        None => {
            return Err(user_role_conflict(&mut conn, user_id, ErrorCode::NotAnAdmin,
                "user is not an admin"));
        }
    };

    audit::record(&mut conn, admin.0.id, "user_demote", Some(user_id), None)?;
    publisher::publish_role_changed(&state.rabbitmq, user_id, UserRole::User, admin.0.id).await;

    tracing::info!(user_id = %user_id, admin_id = %admin.0.id, "admin demoted to user");

    Ok(Json(ApiResponse::ok(user)))
}

// --- Ban / unban ---

#[derive(Debug, Deserialize)]
pub struct BanUserRequest {
    pub reason: String,
}

/// PATCH /admin/users/:id/ban
pub async fn ban_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<BanUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let reason = body.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "ban reason must not be empty"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let updated: Option<User> = diesel::update(
        users::table
            .find(user_id)
            .filter(users::is_banned.eq(false)),
    )
    .set((
        users::is_banned.eq(true),
        users::ban_reason.eq(Some(reason.clone())),
        users::banned_at.eq(Some(Utc::now())),
        users::banned_by.eq(Some(admin.0.id)),
        users::updated_at.eq(Utc::now()),
    ))
    .get_result(&mut conn)
    .optional()?;

    let user = match updated {
        Some(user) => user,
        None => {
            return Err(user_role_conflict(&mut conn, user_id, ErrorCode::AlreadyBanned,
                "user is already banned"));
        }
    };

    audit::record(
        &mut conn,
        admin.0.id,
        "user_ban",
        Some(user_id),
        Some(serde_json::json!({ "reason": reason })),
    )?;
    publisher::publish_user_banned(&state.rabbitmq, user_id, &reason, admin.0.id).await;

    tracing::info!(user_id = %user_id, admin_id = %admin.0.id, "user banned");

    Ok(Json(ApiResponse::ok(user)))
}

/// PATCH /admin/users/:id/unban
pub async fn unban_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let updated: Option<User> = diesel::update(
        users::table
            .find(user_id)
            .filter(users::is_banned.eq(true)),
    )
    .set((
        users::is_banned.eq(false),
        users::ban_reason.eq(None::<String>),
        users::banned_at.eq(None::<chrono::DateTime<Utc>>),
        users::banned_by.eq(None::<Uuid>),
        users::updated_at.eq(Utc::now()),
    ))
    .get_result(&mut conn)
    .optional()?;

    let user = match updated {
        Some(user) => user,
        None => {
            return Err(user_role_conflict(&mut conn, user_id, ErrorCode::NotBanned,
                "user is not banned"));
        }
    };

    audit::record(&mut conn, admin.0.id, "user_unban", Some(user_id), None)?;
    publisher::publish_user_unbanned(&state.rabbitmq, user_id, admin.0.id).await;

    tracing::info!(user_id = %user_id, admin_id = %admin.0.id, "user unbanned");

    Ok(Json(ApiResponse::ok(user)))
}

/// A conditional user update matched zero rows: either the user is missing
/// (404) or the precondition failed (the given conflict).
fn user_role_conflict(
    conn: &mut diesel::pg::PgConnection,
    user_id: Uuid,
    conflict: ErrorCode,
    message: &str,
) -> AppError {
    let exists: bool = users::table
        .find(user_id)
        .count()
        .get_result::<i64>(conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if exists {
        AppError::new(conflict, message)
    } else {
        AppError::new(ErrorCode::UserNotFound, "user not found")
    }
}
