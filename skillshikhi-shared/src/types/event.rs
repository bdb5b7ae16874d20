use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `skillshikhi.{domain}.{entity}.{action}`
/// Example: `skillshikhi.auth.user.registered`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Auth events
    pub const AUTH_USER_REGISTERED: &str = "skillshikhi.auth.user.registered";

    // Friendship events
    pub const USER_FRIEND_REQUESTED: &str = "skillshikhi.user.friend.requested";
    pub const USER_FRIEND_ACCEPTED: &str = "skillshikhi.user.friend.accepted";
    pub const USER_FRIEND_REMOVED: &str = "skillshikhi.user.friend.removed";

    // Teaching-session events
    pub const SESSION_REQUESTED: &str = "skillshikhi.session.request.created";
    pub const SESSION_TRANSITIONED: &str = "skillshikhi.session.request.transitioned";

    // Messaging events
    pub const MESSAGING_MESSAGE_SENT: &str = "skillshikhi.messaging.message.sent";

    // Moderation events
    pub const MODERATION_REPORT_CREATED: &str = "skillshikhi.moderation.report.created";
    pub const MODERATION_REPORT_REVIEWED: &str = "skillshikhi.moderation.report.reviewed";
    pub const MODERATION_USER_BANNED: &str = "skillshikhi.moderation.user.banned";
    pub const MODERATION_USER_UNBANNED: &str = "skillshikhi.moderation.user.unbanned";
    pub const MODERATION_ROLE_CHANGED: &str = "skillshikhi.moderation.user.role_changed";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserRegistered {
        pub user_id: Uuid,
        pub email: String,
        pub name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FriendRequested {
        pub requester_id: Uuid,
        pub recipient_id: Uuid,
        pub requester_name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FriendAccepted {
        pub requester_id: Uuid,
        pub recipient_id: Uuid,
        pub recipient_name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FriendRemoved {
        pub user_id: Uuid,
        pub other_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SessionRequested {
        pub request_id: Uuid,
        pub from_user_id: Uuid,
        pub to_user_id: Uuid,
        pub skill: String,
        pub from_user_name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SessionTransitioned {
        pub request_id: Uuid,
        pub from_user_id: Uuid,
        pub to_user_id: Uuid,
        pub skill: String,
        pub status: String,
        pub acted_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageSent {
        pub message_id: Uuid,
        pub sender_id: Uuid,
        pub recipient_id: Uuid,
        pub sender_name: String,
        pub content_preview: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportCreated {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub reported_id: Uuid,
        pub reason: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportReviewed {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub reported_id: Uuid,
        pub status: String,
        pub reviewed_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserBanned {
        pub user_id: Uuid,
        pub reason: String,
        pub banned_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserUnbanned {
        pub user_id: Uuid,
        pub unbanned_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RoleChanged {
        pub user_id: Uuid,
        pub new_role: String,
        pub changed_by: Uuid,
    }
}
