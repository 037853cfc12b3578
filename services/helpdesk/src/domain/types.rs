use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use helpdesk_core::serde::to_rfc3339_ms;
use helpdesk_domain::pagination::PageRequest;
use helpdesk_domain::policy::{Actor, Resource};
use helpdesk_domain::ticket::TicketStatus;
use helpdesk_domain::user::UserRole;

/// Reset code length in digits.
pub const RESET_CODE_LEN: usize = 6;

/// Reset code time-to-live in seconds.
pub const RESET_CODE_TTL_SECS: i64 = 15 * 60;

/// Upper bound on password length in bytes.
pub const MAX_PASSWORD_LEN: usize = 128;

pub const MAX_TITLE_LEN: usize = 200;

pub const MAX_NAME_LEN: usize = 100;

pub const MAX_FILENAME_LEN: usize = 255;

/// Stored account. Never serialized: `password_hash` must not leave the service.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Admin-side changes to an account. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserAccessChanges {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn issue(email: &str, code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            code,
            expires_at: now + Duration::seconds(RESET_CODE_TTL_SECS),
            used: false,
            created_at: now,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: TicketStatus,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn resource(&self) -> Resource {
        Resource::Ticket {
            created_by: self.created_by,
        }
    }
}

/// Field changes applied by a single ticket update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketChanges {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<Uuid>,
}

impl TicketChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TicketFilter {
    pub created_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TicketStatus>,
    pub category_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub storage_path: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Priority {
    pub id: Uuid,
    pub name: String,
    pub level: i16,
}

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: one `@`, non-empty local part, a dot inside the domain, no
/// whitespace.
pub fn validate_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

pub fn validate_password(password: &str) -> bool {
    !password.is_empty() && password.len() <= MAX_PASSWORD_LEN
}

pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_NAME_LEN
}

pub fn validate_title(title: &str) -> bool {
    let trimmed = title.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_TITLE_LEN
}

/// Filenames become a path component of the attachment store, so anything that could
/// escape the ticket directory or break a `Content-Disposition` header is rejected.
pub fn validate_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FILENAME_LEN
        && name != "."
        && !name.contains("..")
        && !name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '"') || c.is_control())
}

/// Current time truncated to microseconds, the precision the database keeps.
pub fn stamp_now() -> DateTime<Utc> {
    truncate_micros(Utc::now())
}

/// Next `updated_at` stamp: [`stamp_now`], but always strictly after `prev`.
pub fn next_stamp(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = stamp_now();
    if now > prev {
        now
    } else {
        truncate_micros(prev) + Duration::microseconds(1)
    }
}

fn truncate_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}
