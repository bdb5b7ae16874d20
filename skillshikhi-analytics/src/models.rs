use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{analytics_events, daily_snapshots};

// --- Analytics Events ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = analytics_events)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub properties: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = analytics_events)]
pub struct NewAnalyticsEvent {
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub properties: Option<serde_json::Value>,
}

// --- Daily Snapshots ---
//
// One row per calendar date, regenerated idempotently; trend fields are
// computed at read time and never stored.

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = daily_snapshots)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub active_users: i64,
    pub new_users: i64,
    pub sessions_created: i64,
    pub sessions_completed: i64,
    pub reports_created: i64,
    pub reports_resolved: i64,
    pub moderation_actions: i64,
    pub top_active: serde_json::Value,
    pub top_reported: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}
