use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_domain::pagination::PageRequest;
use helpdesk_domain::user::UserRole;

use crate::domain::types::User;
use crate::error::HelpdeskError;
use crate::handlers::actor::CurrentUser;
use crate::state::AppState;
use crate::usecase::account::{
    ChangePasswordInput, ChangePasswordUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use crate::usecase::user::{ListUsersUseCase, UpdateUserAccessInput, UpdateUserAccessUseCase};

/// Public view of a user; the password hash never leaves the service.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(serialize_with = "helpdesk_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "helpdesk_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ── GET /users/me ────────────────────────────────────────────────────────────

pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

// ── PATCH /users/me ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
}

pub async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, HelpdeskError> {
    let usecase = UpdateProfileUseCase {
        users: state.user_repo(),
    };
    let updated = usecase
        .execute(
            user.id,
            UpdateProfileInput {
                full_name: body.full_name,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

// ── PUT /users/me/password ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, HelpdeskError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
        hasher: state.hasher.clone(),
    };
    usecase
        .execute(
            user.id,
            ChangePasswordInput {
                current_password: body.current_password,
                new_password: body.new_password,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /users ───────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct UserListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

pub async fn list_users(
    current: CurrentUser,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<UserResponse>>, HelpdeskError> {
    let query: UserListQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| HelpdeskError::MissingData)?
        .unwrap_or_default();

    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = usecase
        .execute(
            &current.actor(),
            PageRequest::new(query.per_page, query.page),
        )
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// ── PATCH /users/{user_id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, HelpdeskError> {
    let usecase = UpdateUserAccessUseCase {
        users: state.user_repo(),
    };
    let updated = usecase
        .execute(
            &current.actor(),
            user_id,
            UpdateUserAccessInput {
                full_name: body.full_name,
                role: body.role,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
