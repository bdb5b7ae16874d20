use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{device_sessions, password_resets, refresh_tokens};

// --- Password Resets ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = password_resets)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = password_resets)]
pub struct NewPasswordReset {
    pub user_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

// --- Refresh Tokens ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_fingerprint: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_fingerprint: Option<String>,
    pub expires_at: DateTime<Utc>,
}

// --- Device Sessions ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = device_sessions)]
pub struct DeviceSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub termination_reason: Option<String>,
    pub terminated_by: Option<Uuid>,
    pub ended_at: Option<DateTime<Utc>>,
}
