use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::{Party, SessionStatus};
use crate::schema::session_requests;

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = session_requests)]
pub struct SessionRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub skill: String,
    pub message: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub status: String,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRequest {
    pub fn current_status(&self) -> SessionStatus {
        self.status
            .parse()
            .unwrap_or(SessionStatus::Pending)
    }

    /// Which side of the request this user is on, if any.
    pub fn party_of(&self, user_id: Uuid) -> Option<Party> {
        if self.from_user_id == user_id {
            Some(Party::Requester)
        } else if self.to_user_id == user_id {
            Some(Party::Recipient)
        } else {
            None
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = session_requests)]
pub struct NewSessionRequest {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub skill: String,
    pub message: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
}
