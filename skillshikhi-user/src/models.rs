use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use skillshikhi_shared::models::User;

use crate::schema::friendships;

// --- Friendship ---
//
// One row per user pair, keyed by the ordered (user_lo, user_hi) form of the
// unordered pair. Both directions of the relationship read the same row, so
// "A is friends with B" and "B is friends with A" cannot diverge.

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = friendships)]
pub struct Friendship {
    pub id: Uuid,
    pub user_lo: Uuid,
    pub user_hi: Uuid,
    pub requested_by: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship {
    pub user_lo: Uuid,
    pub user_hi: Uuid,
    pub requested_by: Uuid,
}

impl Friendship {
    pub fn other_user(&self, user_id: Uuid) -> Uuid {
        if self.user_lo == user_id {
            self.user_hi
        } else {
            self.user_lo
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_lo == user_id || self.user_hi == user_id
    }
}

// --- Public profile projection ---

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills_taught: Vec<String>,
    pub skills_mastered: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            location: user.location,
            bio: user.bio,
            skills_taught: user.skills_taught,
            skills_mastered: user.skills_mastered,
            created_at: user.created_at,
        }
    }
}
