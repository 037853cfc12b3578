use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};
use tower_http::trace::TraceLayer;

use helpdesk_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    attachment::{delete_attachment, download_attachment, list_attachments, upload_attachments},
    auth::{confirm_password_reset, login, register, request_password_reset},
    catalog::{create_category, create_priority, list_categories, list_priorities},
    health::{healthz, readyz},
    ticket::{add_comment, create_ticket, get_ticket, list_comments, list_tickets, update_ticket},
    user::{change_password, get_me, list_users, update_me, update_user},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/reset-password/request", post(request_password_reset))
        .route("/auth/reset-password/confirm", post(confirm_password_reset))
        // Users
        .route("/users", get(list_users))
        .route("/users/me", get(get_me).patch(update_me))
        .route("/users/me/password", put(change_password))
        .route("/users/{user_id}", patch(update_user))
        // Tickets
        .route("/tickets", post(create_ticket).get(list_tickets))
        .route("/tickets/{ticket_id}", get(get_ticket).patch(update_ticket))
        .route("/tickets/{ticket_id}/comment", post(add_comment))
        .route("/tickets/{ticket_id}/comments", get(list_comments))
        // Attachments
        .route(
            "/tickets/{ticket_id}/attachments",
            post(upload_attachments)
                .layer(upload_limit)
                .get(list_attachments),
        )
        .route(
            "/attachments/{attachment_id}",
            get(download_attachment).delete(delete_attachment),
        )
        // Catalog
        .route("/categories", get(list_categories).post(create_category))
        .route("/priorities", get(list_priorities).post(create_priority))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
