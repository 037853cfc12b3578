use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_domain::pagination::PageRequest;
use helpdesk_domain::ticket::TicketStatus;

use crate::domain::types::{Comment, Ticket};
use crate::error::HelpdeskError;
use crate::handlers::actor::CurrentUser;
use crate::state::AppState;
use crate::usecase::comment::{AddCommentUseCase, ListCommentsUseCase};
use crate::usecase::ticket::{
    CreateTicketInput, CreateTicketUseCase, GetTicketUseCase, ListTicketsInput,
    ListTicketsUseCase, UpdateTicketInput, UpdateTicketUseCase,
};

// ── POST /tickets ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
}

pub async fn create_ticket(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), HelpdeskError> {
    let usecase = CreateTicketUseCase {
        tickets: state.ticket_repo(),
        categories: state.category_repo(),
        priorities: state.priority_repo(),
    };
    let ticket = usecase
        .execute(
            &current.actor(),
            CreateTicketInput {
                title: body.title,
                description: body.description,
                category_id: body.category_id,
                priority_id: body.priority_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

// ── GET /tickets ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct TicketListQuery {
    pub status: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

pub async fn list_tickets(
    current: CurrentUser,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<Ticket>>, HelpdeskError> {
    let query: TicketListQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| HelpdeskError::MissingData)?
        .unwrap_or_default();
    let status = query
        .status
        .as_deref()
        .map(str::parse::<TicketStatus>)
        .transpose()
        .map_err(|_| HelpdeskError::InvalidStatus)?;

    let usecase = ListTicketsUseCase {
        tickets: state.ticket_repo(),
    };
    let tickets = usecase
        .execute(
            &current.actor(),
            ListTicketsInput {
                status,
                category_id: query.category_id,
                priority_id: query.priority_id,
                assigned_to: query.assigned_to,
                page: PageRequest::new(query.per_page, query.page),
            },
        )
        .await?;
    Ok(Json(tickets))
}

// ── GET /tickets/{ticket_id} ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TicketDetailResponse {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
}

pub async fn get_ticket(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketDetailResponse>, HelpdeskError> {
    let usecase = GetTicketUseCase {
        tickets: state.ticket_repo(),
        comments: state.comment_repo(),
    };
    let detail = usecase.execute(&current.actor(), ticket_id).await?;
    Ok(Json(TicketDetailResponse {
        ticket: detail.ticket,
        comments: detail.comments,
    }))
}

// ── PATCH /tickets/{ticket_id} ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
}

pub async fn update_ticket(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<UpdateTicketRequest>,
) -> Result<Json<Ticket>, HelpdeskError> {
    let usecase = UpdateTicketUseCase {
        tickets: state.ticket_repo(),
        users: state.user_repo(),
    };
    let ticket = usecase
        .execute(
            &current.actor(),
            ticket_id,
            UpdateTicketInput {
                status: body.status,
                assigned_to: body.assigned_to,
            },
        )
        .await?;
    Ok(Json(ticket))
}

// ── POST /tickets/{ticket_id}/comment ────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

pub async fn add_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), HelpdeskError> {
    let usecase = AddCommentUseCase {
        tickets: state.ticket_repo(),
        comments: state.comment_repo(),
    };
    let comment = usecase
        .execute(&current.actor(), ticket_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// ── GET /tickets/{ticket_id}/comments ────────────────────────────────────────

pub async fn list_comments(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, HelpdeskError> {
    let usecase = ListCommentsUseCase {
        tickets: state.ticket_repo(),
        comments: state.comment_repo(),
    };
    let comments = usecase.execute(&current.actor(), ticket_id).await?;
    Ok(Json(comments))
}
