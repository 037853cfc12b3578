use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Helpdesk service error variants.
///
/// Reset-flow failures collapse into [`HelpdeskError::InvalidOrExpiredCode`] so the
/// response never reveals which check failed.
#[derive(Debug, thiserror::Error)]
pub enum HelpdeskError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid password")]
    InvalidPassword,
    #[error("invalid name")]
    InvalidName,
    #[error("invalid title")]
    InvalidTitle,
    #[error("comment must not be empty")]
    EmptyComment,
    #[error("invalid status")]
    InvalidStatus,
    #[error("invalid role")]
    InvalidRole,
    #[error("assignee must be an active staff user")]
    InvalidAssignee,
    #[error("priority level must be between 1 and 10")]
    InvalidPriorityLevel,
    #[error("invalid filename")]
    InvalidFilename,
    #[error("invalid or expired code")]
    InvalidOrExpiredCode,
    #[error("missing data")]
    MissingData,

    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("inactive user")]
    InactiveUser,

    #[error("forbidden")]
    Forbidden,

    #[error("user not found")]
    UserNotFound,
    #[error("ticket not found")]
    TicketNotFound,
    #[error("attachment not found")]
    AttachmentNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("priority not found")]
    PriorityNotFound,

    #[error("email already registered")]
    EmailAlreadyRegistered,
    #[error("duplicate filename")]
    DuplicateFilename,
    #[error("category already exists")]
    CategoryAlreadyExists,
    #[error("priority already exists")]
    PriorityAlreadyExists,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl HelpdeskError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::InvalidName => "INVALID_NAME",
            Self::InvalidTitle => "INVALID_TITLE",
            Self::EmptyComment => "EMPTY_COMMENT",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidRole => "INVALID_ROLE",
            Self::InvalidAssignee => "INVALID_ASSIGNEE",
            Self::InvalidPriorityLevel => "INVALID_PRIORITY_LEVEL",
            Self::InvalidFilename => "INVALID_FILENAME",
            Self::InvalidOrExpiredCode => "INVALID_OR_EXPIRED_CODE",
            Self::MissingData => "MISSING_DATA",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InactiveUser => "INACTIVE_USER",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::AttachmentNotFound => "ATTACHMENT_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::PriorityNotFound => "PRIORITY_NOT_FOUND",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::DuplicateFilename => "DUPLICATE_FILENAME",
            Self::CategoryAlreadyExists => "CATEGORY_ALREADY_EXISTS",
            Self::PriorityAlreadyExists => "PRIORITY_ALREADY_EXISTS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail
            | Self::InvalidPassword
            | Self::InvalidName
            | Self::InvalidTitle
            | Self::EmptyComment
            | Self::InvalidStatus
            | Self::InvalidRole
            | Self::InvalidAssignee
            | Self::InvalidPriorityLevel
            | Self::InvalidFilename
            | Self::InvalidOrExpiredCode
            | Self::MissingData => StatusCode::BAD_REQUEST,
            Self::MissingToken
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidCredentials
            | Self::InactiveUser => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound
            | Self::TicketNotFound
            | Self::AttachmentNotFound
            | Self::CategoryNotFound
            | Self::PriorityNotFound => StatusCode::NOT_FOUND,
            Self::EmailAlreadyRegistered
            | Self::DuplicateFilename
            | Self::CategoryAlreadyExists
            | Self::PriorityAlreadyExists => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HelpdeskError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only 500s are logged here; TraceLayer already records status for every request.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
