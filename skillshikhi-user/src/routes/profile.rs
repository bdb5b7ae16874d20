use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use diesel::{PgArrayExpressionMethods, PgTextExpressionMethods};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::models::User;
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::ApiResponse;

use crate::models::PublicProfile;
use crate::AppState;

// --- GET /users/me ---

pub async fn get_own_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let stored: User = users::table
        .find(user.id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(stored)))
}

// --- GET /users/:id ---

pub async fn get_profile(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PublicProfile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let stored: User = users::table
        .find(user_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(PublicProfile::from(stored))))
}

// --- PUT /users/me ---

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100, message = "location too long"))]
    pub location: Option<String>,
    #[validate(length(max = 2000, message = "bio too long"))]
    pub bio: Option<String>,
    pub skills_taught: Option<Vec<String>>,
    pub skills_mastered: Option<Vec<String>>,
}

fn clean_skills(skills: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    cleaned.dedup();
    cleaned
}

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let current: User = users::table
        .find(user.id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let updated: User = diesel::update(users::table.find(user.id))
        .set((
            users::name.eq(req.name.map(|n| n.trim().to_string()).unwrap_or(current.name)),
            users::location.eq(req.location.or(current.location)),
            users::bio.eq(req.bio.or(current.bio)),
            users::skills_taught.eq(req.skills_taught.map(clean_skills).unwrap_or(current.skills_taught)),
            users::skills_mastered.eq(req.skills_mastered.map(clean_skills).unwrap_or(current.skills_mastered)),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .get_result(&mut conn)?;

    tracing::debug!(user_id = %user.id, "profile updated");

    Ok(Json(ApiResponse::ok(updated)))
}

// --- GET /users/search?q=... ---

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 { 20 }

/// Matches against names and taught skills. The skill match uses the array
/// containment operator, so it is exact on the skill name, while the name
/// match is a case-insensitive substring.
pub async fn search_users(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<PublicProfile>>>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "search term must not be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
    let limit = query.limit.clamp(1, 50);

    let matches: Vec<User> = users::table
        .filter(users::is_banned.eq(false))
        .filter(
            users::name.ilike(&pattern)
                .or(users::skills_taught.contains(vec![term.to_string()])),
        )
        .order(users::name.asc())
        .limit(limit)
        .load(&mut conn)?;

    let profiles = matches.into_iter().map(PublicProfile::from).collect();
    Ok(Json(ApiResponse::ok(profiles)))
}
