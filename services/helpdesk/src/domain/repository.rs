#![allow(async_fn_in_trait)]

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use helpdesk_domain::pagination::PageRequest;

use crate::domain::types::{
    Attachment, Category, Comment, PasswordResetToken, Priority, Ticket, TicketChanges,
    TicketFilter, User, UserAccessChanges,
};
use crate::error::HelpdeskError;

/// Credential store.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, HelpdeskError>;

    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, HelpdeskError>;

    /// Insert a new user. A taken email fails with `EmailAlreadyRegistered`, enforced by
    /// the store's unique constraint rather than a prior lookup.
    async fn create(&self, user: &User) -> Result<(), HelpdeskError>;

    async fn update_full_name(
        &self,
        id: Uuid,
        full_name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, HelpdeskError>;

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), HelpdeskError>;

    /// Returns the updated user, or `None` if it does not exist.
    async fn update_access(
        &self,
        id: Uuid,
        changes: &UserAccessChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, HelpdeskError>;

    /// Oldest first.
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, HelpdeskError>;
}

/// Persisted one-time reset codes.
pub trait PasswordResetRepository: Send + Sync {
    /// Mark every unused code for `token.email` as used and insert `token`, in one
    /// transaction. Concurrent calls for one email leave exactly one unused code.
    async fn replace_for_email(&self, token: &PasswordResetToken) -> Result<(), HelpdeskError>;

    /// An unused, unexpired code matching email and code exactly.
    async fn find_valid(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, HelpdeskError>;

    /// Atomically mark the token used and set the user's password hash.
    ///
    /// Returns `false`, with nothing changed, when the token was already used by a
    /// concurrent redeem or is no longer unexpired at `at`.
    async fn redeem(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, HelpdeskError>;
}

pub trait TicketRepository: Send + Sync {
    async fn create(&self, ticket: &Ticket) -> Result<(), HelpdeskError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, HelpdeskError>;

    /// Newest first.
    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, HelpdeskError>;

    /// Write only the fields present in `changes`, plus `updated_at`. Returns the updated
    /// ticket, or `None` if it no longer exists.
    async fn apply_changes(
        &self,
        id: Uuid,
        changes: &TicketChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, HelpdeskError>;
}

pub trait CommentRepository: Send + Sync {
    /// Insert the comment and stamp the ticket's `updated_at` in one transaction.
    async fn append(
        &self,
        comment: &Comment,
        ticket_updated_at: DateTime<Utc>,
    ) -> Result<(), HelpdeskError>;

    /// Oldest first.
    async fn list_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Comment>, HelpdeskError>;
}

pub trait AttachmentRepository: Send + Sync {
    /// Insert all rows in one transaction. A `(ticket_id, filename)` collision fails with
    /// `DuplicateFilename` and inserts nothing.
    async fn create_many(&self, attachments: &[Attachment]) -> Result<(), HelpdeskError>;

    async fn list_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Attachment>, HelpdeskError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, HelpdeskError>;

    /// Returns `true` if deleted, `false` if not found.
    async fn delete(&self, id: Uuid) -> Result<bool, HelpdeskError>;
}

pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, HelpdeskError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, HelpdeskError>;

    /// Duplicate name fails with `CategoryAlreadyExists`.
    async fn create(&self, category: &Category) -> Result<(), HelpdeskError>;
}

pub trait PriorityRepository: Send + Sync {
    /// Highest level first.
    async fn list(&self) -> Result<Vec<Priority>, HelpdeskError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Priority>, HelpdeskError>;

    /// Duplicate name fails with `PriorityAlreadyExists`.
    async fn create(&self, priority: &Priority) -> Result<(), HelpdeskError>;
}

/// Outbound mail. Callers only need an attempt at delivery.
///
/// The future is `Send` so a send can be handed to a background task.
pub trait Mailer: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> impl Future<Output = Result<(), HelpdeskError>> + Send;
}

/// Byte storage for attachments.
pub trait AttachmentStore: Send + Sync {
    /// Store under a per-ticket namespace and return the storage path. Fails with
    /// `DuplicateFilename` if the ticket already has a file with that name.
    async fn store(
        &self,
        ticket_id: Uuid,
        filename: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, HelpdeskError>;

    async fn retrieve(&self, path: &str) -> Result<Bytes, HelpdeskError>;

    /// Deleting a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<(), HelpdeskError>;
}
