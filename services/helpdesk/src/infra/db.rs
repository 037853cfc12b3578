use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionError,
    TransactionTrait,
};
use uuid::Uuid;

use helpdesk_domain::pagination::PageRequest;
use helpdesk_schema::{
    attachments, categories, comments, password_reset_tokens, priorities, tickets, users,
};

use crate::domain::repository::{
    AttachmentRepository, CategoryRepository, CommentRepository, PasswordResetRepository,
    PriorityRepository, TicketRepository, UserRepository,
};
use crate::domain::types::{
    Attachment, Category, Comment, PasswordResetToken, Priority, Ticket, TicketChanges,
    TicketFilter, User, UserAccessChanges,
};
use crate::error::HelpdeskError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// `update` on an active model reports a vanished row as `RecordNotUpdated`.
fn is_not_updated(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotUpdated)
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, HelpdeskError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, HelpdeskError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn create(&self, user: &User) -> Result<(), HelpdeskError> {
        let result = users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            full_name: Set(user.full_name.clone()),
            role: Set(user.role.as_str().to_owned()),
            is_active: Set(user.is_active),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(HelpdeskError::EmailAlreadyRegistered),
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn update_full_name(
        &self,
        id: Uuid,
        full_name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, HelpdeskError> {
        let am = users::ActiveModel {
            id: Set(id),
            full_name: Set(full_name.to_owned()),
            updated_at: Set(updated_at),
            ..Default::default()
        };
        match am.update(&self.db).await {
            Ok(model) => Ok(Some(user_from_model(model)?)),
            Err(e) if is_not_updated(&e) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("update user full name").into()),
        }
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), HelpdeskError> {
        let am = users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_owned()),
            updated_at: Set(updated_at),
            ..Default::default()
        };
        match am.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_updated(&e) => Err(HelpdeskError::UserNotFound),
            Err(e) => Err(anyhow::Error::new(e).context("set user password").into()),
        }
    }

    async fn update_access(
        &self,
        id: Uuid,
        changes: &UserAccessChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, HelpdeskError> {
        let mut am = users::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(ref full_name) = changes.full_name {
            am.full_name = Set(full_name.clone());
        }
        if let Some(role) = changes.role {
            am.role = Set(role.as_str().to_owned());
        }
        if let Some(is_active) = changes.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(updated_at);
        match am.update(&self.db).await {
            Ok(model) => Ok(Some(user_from_model(model)?)),
            Err(e) if is_not_updated(&e) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("update user access").into()),
        }
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, HelpdeskError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list users")?;
        let users = models
            .into_iter()
            .map(user_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(users)
    }
}

fn user_from_model(model: users::Model) -> anyhow::Result<User> {
    let role = model
        .role
        .parse()
        .with_context(|| format!("user {} has unknown role", model.id))?;
    Ok(User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        full_name: model.full_name,
        role,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Password reset repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPasswordResetRepository {
    pub db: DatabaseConnection,
}

impl PasswordResetRepository for DbPasswordResetRepository {
    async fn replace_for_email(&self, token: &PasswordResetToken) -> Result<(), HelpdeskError> {
        retry_on_conflict(REPLACE_RESET_ATTEMPTS, "replace password reset token", move || {
            self.try_replace_for_email(token)
        })
        .await
    }

    async fn find_valid(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, HelpdeskError> {
        let model = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Email.eq(email))
            .filter(password_reset_tokens::Column::Code.eq(code))
            .filter(password_reset_tokens::Column::Used.eq(false))
            .filter(password_reset_tokens::Column::ExpiresAt.gt(now))
            .order_by_desc(password_reset_tokens::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find valid password reset token")?;
        Ok(model.map(reset_token_from_model))
    }

    async fn redeem(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, HelpdeskError> {
        let password_hash = password_hash.to_owned();
        let redeemed = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    // Conditional on `used = false` so two concurrent redeems cannot both
                    // win; the loser sees zero rows and changes nothing. Expiry is checked
                    // again because hashing runs between lookup and redeem.
                    let marked = password_reset_tokens::Entity::update_many()
                        .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
                        .filter(password_reset_tokens::Column::Id.eq(token_id))
                        .filter(password_reset_tokens::Column::Used.eq(false))
                        .filter(password_reset_tokens::Column::ExpiresAt.gt(at))
                        .exec(txn)
                        .await?;
                    if marked.rows_affected == 0 {
                        return Ok(false);
                    }
                    users::ActiveModel {
                        id: Set(user_id),
                        password_hash: Set(password_hash),
                        updated_at: Set(at),
                        ..Default::default()
                    }
                    .update(txn)
                    .await?;
                    Ok(true)
                })
            })
            .await
            .context("redeem password reset token")?;
        Ok(redeemed)
    }
}

/// Attempts at a reset-code replace before a lost uniqueness race becomes an error.
const REPLACE_RESET_ATTEMPTS: u32 = 3;

impl DbPasswordResetRepository {
    async fn try_replace_for_email(
        &self,
        token: &PasswordResetToken,
    ) -> Result<Attempt<()>, HelpdeskError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let token = token.clone();
                Box::pin(async move {
                    // Requests for one account queue on its row, so the update below
                    // always sees the code a concurrent request just committed.
                    users::Entity::find()
                        .filter(users::Column::Email.eq(token.email.as_str()))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    password_reset_tokens::Entity::update_many()
                        .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
                        .filter(password_reset_tokens::Column::Email.eq(token.email.as_str()))
                        .filter(password_reset_tokens::Column::Used.eq(false))
                        .exec(txn)
                        .await?;
                    insert_reset_token(txn, &token).await
                })
            })
            .await;
        match result {
            Ok(()) => Ok(Attempt::Done(())),
            // uq_password_reset_tokens_email_unused: another request inserted first.
            Err(TransactionError::Transaction(e)) if is_unique_violation(&e) => {
                Ok(Attempt::Conflict)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("replace password reset token")
                .into()),
        }
    }
}

/// One try at a write that can lose a uniqueness race to a concurrent writer.
enum Attempt<T> {
    Done(T),
    Conflict,
}

async fn retry_on_conflict<T, F, Fut>(
    attempts: u32,
    what: &'static str,
    mut op: F,
) -> Result<T, HelpdeskError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, HelpdeskError>>,
{
    for attempt in 1..=attempts {
        match op().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Conflict => {
                tracing::warn!(attempt, what, "write lost a uniqueness race, retrying");
            }
        }
    }
    Err(anyhow::anyhow!("{what}: still conflicting after {attempts} attempts").into())
}

async fn insert_reset_token(
    txn: &DatabaseTransaction,
    token: &PasswordResetToken,
) -> Result<(), DbErr> {
    password_reset_tokens::ActiveModel {
        id: Set(token.id),
        email: Set(token.email.clone()),
        code: Set(token.code.clone()),
        expires_at: Set(token.expires_at),
        used: Set(token.used),
        created_at: Set(token.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn reset_token_from_model(model: password_reset_tokens::Model) -> PasswordResetToken {
    PasswordResetToken {
        id: model.id,
        email: model.email,
        code: model.code,
        expires_at: model.expires_at,
        used: model.used,
        created_at: model.created_at,
    }
}

// ── Ticket repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTicketRepository {
    pub db: DatabaseConnection,
}

impl TicketRepository for DbTicketRepository {
    async fn create(&self, ticket: &Ticket) -> Result<(), HelpdeskError> {
        tickets::ActiveModel {
            id: Set(ticket.id),
            title: Set(ticket.title.clone()),
            description: Set(ticket.description.clone()),
            category_id: Set(ticket.category_id),
            priority_id: Set(ticket.priority_id),
            created_by: Set(ticket.created_by),
            assigned_to: Set(ticket.assigned_to),
            status: Set(ticket.status.as_str().to_owned()),
            created_at: Set(ticket.created_at),
            updated_at: Set(ticket.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create ticket")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, HelpdeskError> {
        let model = tickets::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find ticket by id")?;
        Ok(model.map(ticket_from_model).transpose()?)
    }

    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, HelpdeskError> {
        let mut query = tickets::Entity::find();
        if let Some(created_by) = filter.created_by {
            query = query.filter(tickets::Column::CreatedBy.eq(created_by));
        }
        if let Some(assigned_to) = filter.assigned_to {
            query = query.filter(tickets::Column::AssignedTo.eq(assigned_to));
        }
        if let Some(status) = filter.status {
            query = query.filter(tickets::Column::Status.eq(status.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(tickets::Column::CategoryId.eq(category_id));
        }
        if let Some(priority_id) = filter.priority_id {
            query = query.filter(tickets::Column::PriorityId.eq(priority_id));
        }
        let models = query
            .order_by_desc(tickets::Column::CreatedAt)
            .order_by_desc(tickets::Column::Id)
            .offset(filter.page.offset())
            .limit(filter.page.limit())
            .all(&self.db)
            .await
            .context("list tickets")?;
        let tickets = models
            .into_iter()
            .map(ticket_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(tickets)
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        changes: &TicketChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, HelpdeskError> {
        let mut am = tickets::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(status) = changes.status {
            am.status = Set(status.as_str().to_owned());
        }
        if let Some(assigned_to) = changes.assigned_to {
            am.assigned_to = Set(Some(assigned_to));
        }
        am.updated_at = Set(updated_at);
        match am.update(&self.db).await {
            Ok(model) => Ok(Some(ticket_from_model(model)?)),
            Err(e) if is_not_updated(&e) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("update ticket").into()),
        }
    }
}

fn ticket_from_model(model: tickets::Model) -> anyhow::Result<Ticket> {
    let status = model
        .status
        .parse()
        .with_context(|| format!("ticket {} has unknown status", model.id))?;
    Ok(Ticket {
        id: model.id,
        title: model.title,
        description: model.description,
        category_id: model.category_id,
        priority_id: model.priority_id,
        created_by: model.created_by,
        assigned_to: model.assigned_to,
        status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Comment repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCommentRepository {
    pub db: DatabaseConnection,
}

impl CommentRepository for DbCommentRepository {
    async fn append(
        &self,
        comment: &Comment,
        ticket_updated_at: DateTime<Utc>,
    ) -> Result<(), HelpdeskError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let comment = comment.clone();
                Box::pin(async move {
                    comments::ActiveModel {
                        id: Set(comment.id),
                        ticket_id: Set(comment.ticket_id),
                        author_id: Set(comment.author_id),
                        content: Set(comment.content),
                        created_at: Set(comment.created_at),
                    }
                    .insert(txn)
                    .await?;
                    tickets::Entity::update_many()
                        .col_expr(tickets::Column::UpdatedAt, Expr::value(ticket_updated_at))
                        .filter(tickets::Column::Id.eq(comment.ticket_id))
                        .exec(txn)
                        .await?;
                    Ok(())
                })
            })
            .await
            .context("append comment")?;
        Ok(())
    }

    async fn list_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Comment>, HelpdeskError> {
        let models = comments::Entity::find()
            .filter(comments::Column::TicketId.eq(ticket_id))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .all(&self.db)
            .await
            .context("list comments by ticket")?;
        Ok(models.into_iter().map(comment_from_model).collect())
    }
}

fn comment_from_model(model: comments::Model) -> Comment {
    Comment {
        id: model.id,
        ticket_id: model.ticket_id,
        author_id: model.author_id,
        content: model.content,
        created_at: model.created_at,
    }
}

// ── Attachment repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAttachmentRepository {
    pub db: DatabaseConnection,
}

impl AttachmentRepository for DbAttachmentRepository {
    async fn create_many(&self, rows: &[Attachment]) -> Result<(), HelpdeskError> {
        let rows = rows.to_vec();
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    for row in rows {
                        attachments::ActiveModel {
                            id: Set(row.id),
                            ticket_id: Set(row.ticket_id),
                            filename: Set(row.filename),
                            content_type: Set(row.content_type),
                            storage_path: Set(row.storage_path),
                            uploaded_at: Set(row.uploaded_at),
                        }
                        .insert(txn)
                        .await?;
                    }
                    Ok(())
                })
            })
            .await;
        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Transaction(e)) if is_unique_violation(&e) => {
                Err(HelpdeskError::DuplicateFilename)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create attachments").into()),
        }
    }

    async fn list_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<Attachment>, HelpdeskError> {
        let models = attachments::Entity::find()
            .filter(attachments::Column::TicketId.eq(ticket_id))
            .order_by_asc(attachments::Column::UploadedAt)
            .order_by_asc(attachments::Column::Filename)
            .all(&self.db)
            .await
            .context("list attachments by ticket")?;
        Ok(models.into_iter().map(attachment_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, HelpdeskError> {
        let model = attachments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find attachment by id")?;
        Ok(model.map(attachment_from_model))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, HelpdeskError> {
        let result = attachments::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete attachment")?;
        Ok(result.rows_affected > 0)
    }
}

fn attachment_from_model(model: attachments::Model) -> Attachment {
    Attachment {
        id: model.id,
        ticket_id: model.ticket_id,
        filename: model.filename,
        content_type: model.content_type,
        storage_path: model.storage_path,
        uploaded_at: model.uploaded_at,
    }
}

// ── Catalog repositories ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

impl CategoryRepository for DbCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, HelpdeskError> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .context("list categories")?;
        Ok(models
            .into_iter()
            .map(|m| Category {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, HelpdeskError> {
        let model = categories::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find category by id")?;
        Ok(model.map(|m| Category {
            id: m.id,
            name: m.name,
        }))
    }

    async fn create(&self, category: &Category) -> Result<(), HelpdeskError> {
        let result = categories::ActiveModel {
            id: Set(category.id),
            name: Set(category.name.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(HelpdeskError::CategoryAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create category").into()),
        }
    }
}

#[derive(Clone)]
pub struct DbPriorityRepository {
    pub db: DatabaseConnection,
}

impl PriorityRepository for DbPriorityRepository {
    async fn list(&self) -> Result<Vec<Priority>, HelpdeskError> {
        let models = priorities::Entity::find()
            .order_by_desc(priorities::Column::Level)
            .order_by_asc(priorities::Column::Name)
            .all(&self.db)
            .await
            .context("list priorities")?;
        Ok(models.into_iter().map(priority_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Priority>, HelpdeskError> {
        let model = priorities::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find priority by id")?;
        Ok(model.map(priority_from_model))
    }

    async fn create(&self, priority: &Priority) -> Result<(), HelpdeskError> {
        let result = priorities::ActiveModel {
            id: Set(priority.id),
            name: Set(priority.name.clone()),
            level: Set(priority.level),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(HelpdeskError::PriorityAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create priority").into()),
        }
    }
}

fn priority_from_model(model: priorities::Model) -> Priority {
    Priority {
        id: model.id,
        name: model.name,
        level: model.level,
    }
}
