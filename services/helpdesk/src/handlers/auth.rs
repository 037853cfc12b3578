use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::HelpdeskError;
use crate::handlers::user::UserResponse;
use crate::state::AppState;
use crate::usecase::account::{LoginInput, LoginUseCase, RegisterInput, RegisterUseCase};
use crate::usecase::password_reset::{
    ConfirmPasswordResetInput, ConfirmPasswordResetUseCase, RESET_REQUESTED_MESSAGE,
    RequestPasswordResetUseCase,
};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HelpdeskError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        hasher: state.hasher.clone(),
    };
    let user = usecase
        .execute(RegisterInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds since UNIX epoch.
    pub expires_at: u64,
    pub user: UserResponse,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HelpdeskError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        hasher: state.hasher.clone(),
        tokens: state.tokens.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(LoginResponse {
        access_token: out.token.token,
        token_type: "bearer",
        expires_at: out.token.expires_at,
        user: out.user.into(),
    }))
}

// ── POST /auth/reset-password/request ────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, HelpdeskError> {
    let usecase = RequestPasswordResetUseCase {
        users: state.user_repo(),
        resets: state.reset_repo(),
        mailer: state.mailer.clone(),
    };
    usecase.execute(&body.email).await?;
    Ok(Json(MessageResponse {
        message: RESET_REQUESTED_MESSAGE,
    }))
}

// ── POST /auth/reset-password/confirm ────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetConfirmRequest>,
) -> Result<Json<MessageResponse>, HelpdeskError> {
    let usecase = ConfirmPasswordResetUseCase {
        users: state.user_repo(),
        resets: state.reset_repo(),
        hasher: state.hasher.clone(),
    };
    usecase
        .execute(ConfirmPasswordResetInput {
            email: body.email,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset.",
    }))
}
