use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: User/friendship errors
/// - E3xxx: Teaching-session errors
/// - E4xxx: Messaging errors
/// - E5xxx: Notification errors
/// - E6xxx: Moderation errors
/// - E7xxx: Analytics errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,
    Conflict,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,
    RefreshTokenRevoked,
    PasswordTooWeak,
    ResetCodeExpired,
    ResetCodeInvalid,
    UserBanned,
    DeviceSessionNotFound,
    SessionAlreadyTerminated,

    // User / friendship (E2xxx)
    UserNotFound,
    CannotFriendSelf,
    FriendRequestPending,
    AlreadyFriends,
    FriendshipNotFound,

    // Teaching session (E3xxx)
    SessionRequestNotFound,
    CannotRequestSelf,
    DuplicatePendingRequest,
    InvalidTransition,

    // Messaging (E4xxx)
    CannotMessageSelf,
    MessageNotFound,

    // Notification (E5xxx)
    NotificationNotFound,

    // Moderation (E6xxx)
    ReportNotFound,
    ReportAlreadyReviewed,
    CannotReportSelf,
    DuplicateReport,
    AlreadyAdmin,
    NotAnAdmin,
    CannotDemoteSelf,
    AlreadyBanned,
    NotBanned,

    // Analytics (E7xxx)
    SnapshotNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::Conflict => "E0009",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1003",
            Self::TokenInvalid => "E1004",
            Self::RefreshTokenRevoked => "E1005",
            Self::PasswordTooWeak => "E1006",
            Self::ResetCodeExpired => "E1007",
            Self::ResetCodeInvalid => "E1008",
            Self::UserBanned => "E1009",
            Self::DeviceSessionNotFound => "E1010",
            Self::SessionAlreadyTerminated => "E1011",

            // User / friendship
            Self::UserNotFound => "E2001",
            Self::CannotFriendSelf => "E2002",
            Self::FriendRequestPending => "E2003",
            Self::AlreadyFriends => "E2004",
            Self::FriendshipNotFound => "E2005",

            // Teaching session
            Self::SessionRequestNotFound => "E3001",
            Self::CannotRequestSelf => "E3002",
            Self::DuplicatePendingRequest => "E3003",
            Self::InvalidTransition => "E3004",

            // Messaging
            Self::CannotMessageSelf => "E4001",
            Self::MessageNotFound => "E4002",

            // Notification
            Self::NotificationNotFound => "E5001",

            // Moderation
            Self::ReportNotFound => "E6001",
            Self::ReportAlreadyReviewed => "E6002",
            Self::CannotReportSelf => "E6003",
            Self::DuplicateReport => "E6004",
            Self::AlreadyAdmin => "E6005",
            Self::NotAnAdmin => "E6006",
            Self::CannotDemoteSelf => "E6007",
            Self::AlreadyBanned => "E6008",
            Self::NotBanned => "E6009",

            // Analytics
            Self::SnapshotNotFound => "E7001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::FriendshipNotFound
            | Self::SessionRequestNotFound | Self::MessageNotFound | Self::NotificationNotFound
            | Self::ReportNotFound | Self::DeviceSessionNotFound | Self::SnapshotNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid | Self::RefreshTokenRevoked
            | Self::ResetCodeExpired | Self::ResetCodeInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::UserBanned | Self::CannotFriendSelf | Self::CannotRequestSelf
            | Self::CannotMessageSelf | Self::CannotReportSelf | Self::CannotDemoteSelf => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Conflict | Self::EmailAlreadyExists | Self::FriendRequestPending
            | Self::AlreadyFriends | Self::DuplicatePendingRequest | Self::InvalidTransition
            | Self::ReportAlreadyReviewed | Self::DuplicateReport | Self::AlreadyAdmin
            | Self::NotAnAdmin | Self::AlreadyBanned | Self::NotBanned
            | Self::SessionAlreadyTerminated => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
