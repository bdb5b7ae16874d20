use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{admin_actions, reports};

pub const REPORT_PENDING: &str = "pending";
pub const REPORT_RESOLVED: &str = "resolved";
pub const REPORT_DISMISSED: &str = "dismissed";

/// Reasons a user can be reported for. Anything else is a validation error.
pub const REPORT_REASONS: &[&str] = &[
    "spam",
    "harassment",
    "inappropriate_content",
    "fake_profile",
    "scam",
    "other",
];

// --- Report ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: String,
    pub description: String,
    pub evidence_url: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: String,
    pub description: String,
    pub evidence_url: Option<String>,
}

// --- AdminAction ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = admin_actions)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = admin_actions)]
pub struct NewAdminAction {
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}
