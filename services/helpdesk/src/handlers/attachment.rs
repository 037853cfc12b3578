use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::domain::types::Attachment;
use crate::error::HelpdeskError;
use crate::handlers::actor::CurrentUser;
use crate::state::AppState;
use crate::usecase::attachment::{
    DeleteAttachmentUseCase, DownloadAttachmentUseCase, ListAttachmentsUseCase, UploadedFile,
    UploadAttachmentsUseCase,
};

// ── POST /tickets/{ticket_id}/attachments ────────────────────────────────────

/// Multipart upload; every part with a filename is stored, other parts are ignored.
/// Body-size and malformed-multipart errors keep axum's own status (413 / 400).
pub async fn upload_attachments(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Attachment>>), Response> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.into_response())? {
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| e.into_response())?;
        files.push(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }

    let usecase = UploadAttachmentsUseCase {
        tickets: state.ticket_repo(),
        attachments: state.attachment_repo(),
        store: state.storage.clone(),
    };
    let attachments = usecase
        .execute(&current.actor(), ticket_id, files)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok((StatusCode::CREATED, Json(attachments)))
}

// ── GET /tickets/{ticket_id}/attachments ─────────────────────────────────────

pub async fn list_attachments(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Vec<Attachment>>, HelpdeskError> {
    let usecase = ListAttachmentsUseCase {
        tickets: state.ticket_repo(),
        attachments: state.attachment_repo(),
    };
    let attachments = usecase.execute(&current.actor(), ticket_id).await?;
    Ok(Json(attachments))
}

// ── GET /attachments/{attachment_id} ─────────────────────────────────────────

pub async fn download_attachment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(attachment_id): Path<Uuid>,
) -> Result<Response, HelpdeskError> {
    let usecase = DownloadAttachmentUseCase {
        tickets: state.ticket_repo(),
        attachments: state.attachment_repo(),
        store: state.storage.clone(),
    };
    let (attachment, bytes) = usecase.execute(&current.actor(), attachment_id).await?;

    Ok((download_headers(&attachment)?, bytes).into_response())
}

/// The content type is whatever the uploader sent, so browsers must not sniff past it.
fn download_headers(
    attachment: &Attachment,
) -> Result<[(HeaderName, HeaderValue); 3], HelpdeskError> {
    let content_type = HeaderValue::from_str(&attachment.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    // Stored filenames never contain quotes or control characters.
    let disposition = format!("attachment; filename=\"{}\"", attachment.filename);
    let disposition = HeaderValue::from_bytes(disposition.as_bytes())
        .map_err(|e| anyhow::anyhow!("content-disposition for {}: {e}", attachment.id))?;
    Ok([
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_DISPOSITION, disposition),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
    ])
}

// ── DELETE /attachments/{attachment_id} ──────────────────────────────────────

pub async fn delete_attachment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(attachment_id): Path<Uuid>,
) -> Result<StatusCode, HelpdeskError> {
    let usecase = DeleteAttachmentUseCase {
        tickets: state.ticket_repo(),
        attachments: state.attachment_repo(),
        store: state.storage.clone(),
    };
    usecase.execute(&current.actor(), attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
