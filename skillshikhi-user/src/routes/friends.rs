use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use skillshikhi_shared::errors::{AppError, AppResult, ErrorCode};
use skillshikhi_shared::models::User;
use skillshikhi_shared::schema::users;
use skillshikhi_shared::types::auth::AuthUser;
use skillshikhi_shared::types::ApiResponse;

use crate::events::publisher;
use crate::friendship::{derive_relation, normalize_pair, Relation, STATUS_ACCEPTED, STATUS_PENDING};
use crate::models::{Friendship, NewFriendship, PublicProfile};
use crate::schema::friendships;
use crate::AppState;

fn load_pair(
    conn: &mut diesel::pg::PgConnection,
    a: Uuid,
    b: Uuid,
) -> AppResult<Option<Friendship>> {
    let (lo, hi) = normalize_pair(a, b);
    let row = friendships::table
        .filter(friendships::user_lo.eq(lo))
        .filter(friendships::user_hi.eq(hi))
        .first::<Friendship>(conn)
        .optional()?;
    Ok(row)
}

// --- POST /friends/:user_id ---

pub async fn send_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    if user.id == target_id {
        return Err(AppError::new(ErrorCode::CannotFriendSelf, "cannot send a friend request to yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let target: User = users::table
        .find(target_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    match load_pair(&mut conn, user.id, target.id)? {
        Some(f) if f.status == STATUS_ACCEPTED => {
            return Err(AppError::new(ErrorCode::AlreadyFriends, "you are already friends"));
        }
        Some(f) if f.requested_by == user.id => {
            return Err(AppError::new(ErrorCode::FriendRequestPending, "friend request already sent"));
        }
        Some(_) => {
            return Err(AppError::new(
                ErrorCode::FriendRequestPending,
                "this user already sent you a friend request",
            ));
        }
        None => {}
    }

    let (lo, hi) = normalize_pair(user.id, target.id);
    let new_friendship = NewFriendship {
        user_lo: lo,
        user_hi: hi,
        requested_by: user.id,
    };

    // The unique (user_lo, user_hi) index is the real guard; a concurrent
    // create that slips past the read above surfaces here as a conflict.
    let friendship = diesel::insert_into(friendships::table)
        .values(&new_friendship)
        .get_result::<Friendship>(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::new(ErrorCode::FriendRequestPending, "friend request already exists"),
            other => AppError::Database(other),
        })?;

    let requester_name: String = users::table
        .find(user.id)
        .select(users::name)
        .first(&mut conn)
        .unwrap_or_else(|_| "someone".to_string());

    publisher::publish_friend_requested(&state.rabbitmq, user.id, target.id, &requester_name).await;

    Ok(Json(ApiResponse::ok(friendship)))
}

// --- PUT /friends/:id/accept ---

pub async fn accept_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let friendship: Friendship = friendships::table
        .find(friendship_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::FriendshipNotFound, "friend request not found"))?;

    if !friendship.involves(user.id) {
        return Err(AppError::forbidden("you are not part of this friend request"));
    }
    if friendship.requested_by == user.id {
        return Err(AppError::forbidden("only the recipient can accept a friend request"));
    }

    // Conditional on the pending status so a racing cancel loses cleanly.
    let updated: Option<Friendship> = diesel::update(
        friendships::table
            .find(friendship_id)
            .filter(friendships::status.eq(STATUS_PENDING)),
    )
    .set((
        friendships::status.eq(STATUS_ACCEPTED),
        friendships::responded_at.eq(Some(Utc::now())),
    ))
    .get_result(&mut conn)
    .optional()?;

    let updated = updated.ok_or_else(|| {
        AppError::new(ErrorCode::Conflict, "friend request is no longer pending")
    })?;

    let recipient_name: String = users::table
        .find(user.id)
        .select(users::name)
        .first(&mut conn)
        .unwrap_or_else(|_| "someone".to_string());

    publisher::publish_friend_accepted(
        &state.rabbitmq,
        updated.requested_by,
        user.id,
        &recipient_name,
    )
    .await;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- DELETE /friends/:id ---
//
// Cancels a pending request (sender) or declines it (recipient).

#[derive(Debug, Serialize)]
pub struct FriendshipRemovedResponse {
    pub removed: bool,
}

pub async fn remove_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FriendshipRemovedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let friendship: Friendship = friendships::table
        .find(friendship_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::FriendshipNotFound, "friend request not found"))?;

    if !friendship.involves(user.id) {
        return Err(AppError::forbidden("you are not part of this friend request"));
    }

    let deleted = diesel::delete(
        friendships::table
            .find(friendship_id)
            .filter(friendships::status.eq(STATUS_PENDING)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::Conflict, "friend request is no longer pending"));
    }

    Ok(Json(ApiResponse::ok(FriendshipRemovedResponse { removed: true })))
}

// --- DELETE /friends/:user_id/unfriend ---

pub async fn unfriend(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(other_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FriendshipRemovedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let (lo, hi) = normalize_pair(user.id, other_id);

    let deleted = diesel::delete(
        friendships::table
            .filter(friendships::user_lo.eq(lo))
            .filter(friendships::user_hi.eq(hi))
            .filter(friendships::status.eq(STATUS_ACCEPTED)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::FriendshipNotFound, "you are not friends with this user"));
    }

    publisher::publish_friend_removed(&state.rabbitmq, user.id, other_id).await;

    Ok(Json(ApiResponse::ok(FriendshipRemovedResponse { removed: true })))
}

// --- GET /friends/status/:user_id ---

#[derive(Debug, Serialize)]
pub struct FriendStatusResponse {
    pub status: Relation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendship_id: Option<Uuid>,
}

pub async fn friend_status(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(other_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FriendStatusResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let row = load_pair(&mut conn, user.id, other_id)?;
    let status = derive_relation(user.id, row.as_ref());

    Ok(Json(ApiResponse::ok(FriendStatusResponse {
        status,
        friendship_id: row.map(|f| f.id),
    })))
}

// --- GET /friends ---

pub async fn list_friends(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<PublicProfile>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<Friendship> = friendships::table
        .filter(
            friendships::user_lo.eq(user.id).or(friendships::user_hi.eq(user.id)),
        )
        .filter(friendships::status.eq(STATUS_ACCEPTED))
        .order(friendships::responded_at.desc())
        .load(&mut conn)?;

    let friend_ids: Vec<Uuid> = rows.iter().map(|f| f.other_user(user.id)).collect();

    let mut friends: Vec<User> = users::table
        .filter(users::id.eq_any(&friend_ids))
        .load(&mut conn)?;

    // Preserve order from the friendships query (most recent first)
    let id_order: std::collections::HashMap<Uuid, usize> =
        friend_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    friends.sort_by_key(|u| id_order.get(&u.id).copied().unwrap_or(usize::MAX));

    let profiles = friends.into_iter().map(PublicProfile::from).collect();
    Ok(Json(ApiResponse::ok(profiles)))
}

// --- GET /friends/requests ---

#[derive(Debug, Serialize)]
pub struct PendingRequestEntry {
    pub friendship_id: Uuid,
    pub user: PublicProfile,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PendingRequestsResponse {
    pub received: Vec<PendingRequestEntry>,
    pub sent: Vec<PendingRequestEntry>,
}

pub async fn list_pending_requests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<PendingRequestsResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<Friendship> = friendships::table
        .filter(
            friendships::user_lo.eq(user.id).or(friendships::user_hi.eq(user.id)),
        )
        .filter(friendships::status.eq(STATUS_PENDING))
        .order(friendships::created_at.desc())
        .load(&mut conn)?;

    let other_ids: Vec<Uuid> = rows.iter().map(|f| f.other_user(user.id)).collect();
    let others: Vec<User> = users::table
        .filter(users::id.eq_any(&other_ids))
        .load(&mut conn)?;
    let by_id: std::collections::HashMap<Uuid, User> =
        others.into_iter().map(|u| (u.id, u)).collect();

    let mut received = Vec::new();
    let mut sent = Vec::new();
    for f in rows {
        let other_id = f.other_user(user.id);
        let Some(other) = by_id.get(&other_id) else { continue };
        let entry = PendingRequestEntry {
            friendship_id: f.id,
            user: PublicProfile::from(other.clone()),
            created_at: f.created_at,
        };
        if f.requested_by == user.id {
            sent.push(entry);
        } else {
            received.push(entry);
        }
    }

    Ok(Json(ApiResponse::ok(PendingRequestsResponse { received, sent })))
}
