use uuid::Uuid;

use helpdesk_domain::policy::{Action, Actor, can_act};

use crate::domain::repository::{CommentRepository, TicketRepository};
use crate::domain::types::{Comment, next_stamp};
use crate::error::HelpdeskError;

// ── AddComment ───────────────────────────────────────────────────────────────

pub struct AddCommentUseCase<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    pub tickets: T,
    pub comments: C,
}

impl<T, C> AddCommentUseCase<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    /// Appends a comment and bumps the ticket's `updated_at`; status is left alone.
    pub async fn execute(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        content: String,
    ) -> Result<Comment, HelpdeskError> {
        if content.trim().is_empty() {
            return Err(HelpdeskError::EmptyComment);
        }
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(HelpdeskError::TicketNotFound)?;
        if !can_act(actor, Action::Comment, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }

        let now = next_stamp(ticket.updated_at);
        let comment = Comment {
            id: Uuid::now_v7(),
            ticket_id: ticket.id,
            author_id: actor.id,
            content,
            created_at: now,
        };
        self.comments.append(&comment, now).await?;
        Ok(comment)
    }
}

// ── ListComments ─────────────────────────────────────────────────────────────

pub struct ListCommentsUseCase<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    pub tickets: T,
    pub comments: C,
}

impl<T, C> ListCommentsUseCase<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
    ) -> Result<Vec<Comment>, HelpdeskError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(HelpdeskError::TicketNotFound)?;
        if !can_act(actor, Action::ReadTicket, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }
        self.comments.list_by_ticket(ticket.id).await
    }
}
