use std::collections::HashSet;

use bytes::Bytes;
use uuid::Uuid;

use helpdesk_domain::policy::{Action, Actor, can_act};

use crate::domain::repository::{AttachmentRepository, AttachmentStore, TicketRepository};
use crate::domain::types::{Attachment, Ticket, stamp_now, validate_filename};
use crate::error::HelpdeskError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

async fn load_ticket<T: TicketRepository>(
    tickets: &T,
    ticket_id: Uuid,
) -> Result<Ticket, HelpdeskError> {
    tickets
        .find_by_id(ticket_id)
        .await?
        .ok_or(HelpdeskError::TicketNotFound)
}

// ── UploadAttachments ────────────────────────────────────────────────────────

pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub struct UploadAttachmentsUseCase<T, A, S>
where
    T: TicketRepository,
    A: AttachmentRepository,
    S: AttachmentStore,
{
    pub tickets: T,
    pub attachments: A,
    pub store: S,
}

impl<T, A, S> UploadAttachmentsUseCase<T, A, S>
where
    T: TicketRepository,
    A: AttachmentRepository,
    S: AttachmentStore,
{
    /// All-or-nothing: if any file fails to store or the rows fail to insert, every file
    /// already written by this call is removed again.
    pub async fn execute(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Attachment>, HelpdeskError> {
        if files.is_empty() {
            return Err(HelpdeskError::MissingData);
        }
        let mut seen = HashSet::with_capacity(files.len());
        for file in &files {
            if !validate_filename(&file.filename) {
                return Err(HelpdeskError::InvalidFilename);
            }
            if !seen.insert(file.filename.as_str()) {
                return Err(HelpdeskError::DuplicateFilename);
            }
        }

        let ticket = load_ticket(&self.tickets, ticket_id).await?;
        if !can_act(actor, Action::AttachFile, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }

        let mut rows = Vec::with_capacity(files.len());
        for file in files {
            let content_type = file
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
            let stored = self
                .store
                .store(ticket.id, &file.filename, file.bytes, &content_type)
                .await;
            match stored {
                Ok(storage_path) => rows.push(Attachment {
                    id: Uuid::now_v7(),
                    ticket_id: ticket.id,
                    filename: file.filename,
                    content_type,
                    storage_path,
                    uploaded_at: stamp_now(),
                }),
                Err(e) => {
                    self.discard(&rows).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.attachments.create_many(&rows).await {
            self.discard(&rows).await;
            return Err(e);
        }
        tracing::info!(ticket_id = %ticket.id, count = rows.len(), "attachments uploaded");
        Ok(rows)
    }

    async fn discard(&self, written: &[Attachment]) {
        for attachment in written {
            if let Err(e) = self.store.delete(&attachment.storage_path).await {
                tracing::warn!(
                    error = ?e,
                    path = %attachment.storage_path,
                    "failed to remove attachment after aborted upload"
                );
            }
        }
    }
}

// ── ListAttachments ──────────────────────────────────────────────────────────

pub struct ListAttachmentsUseCase<T, A>
where
    T: TicketRepository,
    A: AttachmentRepository,
{
    pub tickets: T,
    pub attachments: A,
}

impl<T, A> ListAttachmentsUseCase<T, A>
where
    T: TicketRepository,
    A: AttachmentRepository,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        ticket_id: Uuid,
    ) -> Result<Vec<Attachment>, HelpdeskError> {
        let ticket = load_ticket(&self.tickets, ticket_id).await?;
        if !can_act(actor, Action::ReadTicket, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }
        self.attachments.list_by_ticket(ticket.id).await
    }
}

// ── DownloadAttachment ───────────────────────────────────────────────────────

pub struct DownloadAttachmentUseCase<T, A, S>
where
    T: TicketRepository,
    A: AttachmentRepository,
    S: AttachmentStore,
{
    pub tickets: T,
    pub attachments: A,
    pub store: S,
}

impl<T, A, S> DownloadAttachmentUseCase<T, A, S>
where
    T: TicketRepository,
    A: AttachmentRepository,
    S: AttachmentStore,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        attachment_id: Uuid,
    ) -> Result<(Attachment, Bytes), HelpdeskError> {
        let attachment = self
            .attachments
            .find_by_id(attachment_id)
            .await?
            .ok_or(HelpdeskError::AttachmentNotFound)?;
        let ticket = load_ticket(&self.tickets, attachment.ticket_id).await?;
        if !can_act(actor, Action::ReadTicket, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }
        let bytes = self.store.retrieve(&attachment.storage_path).await?;
        Ok((attachment, bytes))
    }
}

// ── DeleteAttachment ─────────────────────────────────────────────────────────

pub struct DeleteAttachmentUseCase<T, A, S>
where
    T: TicketRepository,
    A: AttachmentRepository,
    S: AttachmentStore,
{
    pub tickets: T,
    pub attachments: A,
    pub store: S,
}

impl<T, A, S> DeleteAttachmentUseCase<T, A, S>
where
    T: TicketRepository,
    A: AttachmentRepository,
    S: AttachmentStore,
{
    /// The row goes first; an orphaned file is only logged.
    pub async fn execute(&self, actor: &Actor, attachment_id: Uuid) -> Result<(), HelpdeskError> {
        let attachment = self
            .attachments
            .find_by_id(attachment_id)
            .await?
            .ok_or(HelpdeskError::AttachmentNotFound)?;
        let ticket = load_ticket(&self.tickets, attachment.ticket_id).await?;
        if !can_act(actor, Action::DeleteAttachment, &ticket.resource()) {
            return Err(HelpdeskError::Forbidden);
        }
        if !self.attachments.delete(attachment.id).await? {
            return Err(HelpdeskError::AttachmentNotFound);
        }
        if let Err(e) = self.store.delete(&attachment.storage_path).await {
            tracing::warn!(
                error = ?e,
                path = %attachment.storage_path,
                "failed to remove attachment file"
            );
        }
        Ok(())
    }
}
