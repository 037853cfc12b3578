use uuid::Uuid;

use helpdesk_domain::pagination::PageRequest;
use helpdesk_domain::policy::{Action, Actor, Resource, can_act};
use helpdesk_domain::ticket::TicketStatus;

use crate::domain::repository::{
    CategoryRepository, CommentRepository, PriorityRepository, TicketRepository, UserRepository,
};
use crate::domain::types::{
    Comment, Ticket, TicketChanges, TicketFilter, next_stamp, stamp_now, validate_title,
};
use crate::error::HelpdeskError;

// ── CreateTicket ─────────────────────────────────────────────────────────────

pub struct CreateTicketInput {
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
}

pub struct CreateTicketUseCase<T, C, P>
where
    T: TicketRepository,
    C: CategoryRepository,
    P: PriorityRepository,
{
    pub tickets: T,
    pub categories: C,
    pub priorities: P,
}

impl<T, C, P> CreateTicketUseCase<T, C, P>
where
    T: TicketRepository,
    C: CategoryRepository,
    P: PriorityRepository,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        input: CreateTicketInput,
    ) -> Result<Ticket, HelpdeskError> {
        if !can_act(actor, Action::CreateTicket, &Resource::System) {
            return Err(HelpdeskError::Forbidden);
        }
        if !validate_title(&input.title) {
            return Err(HelpdeskError::InvalidTitle);
        }
        if let Some(id) = input.category_id {
            self.categories
                .find_by_id(id)
                .await?
                .ok_or(HelpdeskError::CategoryNotFound)?;
        }
        if let Some(id) = input.priority_id {
            self.priorities
                .find_by_id(id)
                .await?
                .ok_or(HelpdeskError::PriorityNotFound)?;
        }

        let now = stamp_now();
        let ticket = Ticket {
            id: Uuid::now_v7(),
            title: input.title.trim().to_owned(),
            description: input.description,
            category_id: input.category_id,
            priority_id: input.priority_id,
            created_by: actor.id,
            assigned_to: None,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.tickets.create(&ticket).await?;
        Ok(ticket)
    }
}

// ── ListTickets ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ListTicketsInput {
    pub status: Option<TicketStatus>,
    pub category_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub page: PageRequest,
}

pub struct ListTicketsUseCase<T: TicketRepository> {
    pub tickets: T,
}

impl<T: TicketRepository> ListTicketsUseCase<T> {
    /// Staff see every ticket; clients only the ones they created.
    pub async fn execute(
        &self,
        actor: &Actor,
        input: ListTicketsInput,
    ) -> Result<Vec<Ticket>, HelpdeskError> {
        let created_by = (!actor.role.is_staff()).then_some(actor.id);
        let filter = TicketFilter {
            created_by,
            assigned_to: input.assigned_to,
            status: input.status,
            category_id: input.category_id,
            priority_id: input.priority_id,
            page: input.page.clamped(),
        };
        self.tickets.list(&filter).await
    }
}

// ── GetTicket ────────────────────────────────────────────────────────────────

pub struct TicketDetail {
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
}

pub struct GetTicketUseCase<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    pub tickets: T,
    pub comments: C,
}

impl<T, C> GetTicketUseCase<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
    ) -> Result<TicketDetail, HelpdeskError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(HelpdeskError::TicketNotFound)?;
        if !can_act(actor, Action::ReadTicket, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }
        let comments = self.comments.list_by_ticket(ticket.id).await?;
        Ok(TicketDetail { ticket, comments })
    }
}

// ── UpdateTicket ─────────────────────────────────────────────────────────────

pub struct UpdateTicketInput {
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
}

pub struct UpdateTicketUseCase<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    pub tickets: T,
    pub users: U,
}

impl<T, U> UpdateTicketUseCase<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    /// Every requested change is authorized before anything is written, so a request
    /// that is only partly allowed changes nothing.
    pub async fn execute(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        input: UpdateTicketInput,
    ) -> Result<Ticket, HelpdeskError> {
        let changes = TicketChanges {
            status: input
                .status
                .as_deref()
                .map(str::parse::<TicketStatus>)
                .transpose()
                .map_err(|_| HelpdeskError::InvalidStatus)?,
            assigned_to: input.assigned_to,
        };
        if changes.is_empty() {
            return Err(HelpdeskError::MissingData);
        }

        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(HelpdeskError::TicketNotFound)?;
        let resource = ticket.resource();
        if let Some(status) = changes.status {
            if !can_act(actor, Action::SetStatus(status), &resource) {
                return Err(HelpdeskError::Forbidden);
            }
        }
        if let Some(assignee_id) = changes.assigned_to {
            if !can_act(actor, Action::Reassign, &resource) {
                return Err(HelpdeskError::Forbidden);
            }
            let assignee = self.users.find_by_id(assignee_id).await?;
            if !assignee.is_some_and(|u| u.is_active && u.role.is_staff()) {
                return Err(HelpdeskError::InvalidAssignee);
            }
        }

        let updated = self
            .tickets
            .apply_changes(ticket.id, &changes, next_stamp(ticket.updated_at))
            .await?
            .ok_or(HelpdeskError::TicketNotFound)?;
        tracing::info!(
            ticket_id = %updated.id,
            actor_id = %actor.id,
            status = %updated.status,
            assigned_to = ?updated.assigned_to,
            "ticket updated"
        );
        Ok(updated)
    }
}
