use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::domain::types::{Category, Priority};
use crate::error::HelpdeskError;
use crate::handlers::actor::CurrentUser;
use crate::state::AppState;
use crate::usecase::catalog::{
    CreateCategoryUseCase, CreatePriorityInput, CreatePriorityUseCase, ListCategoriesUseCase,
    ListPrioritiesUseCase,
};

// ── GET /categories ──────────────────────────────────────────────────────────

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, HelpdeskError> {
    let usecase = ListCategoriesUseCase {
        categories: state.category_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── POST /categories ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

pub async fn create_category(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), HelpdeskError> {
    let usecase = CreateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase.execute(&current.actor(), &body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// ── GET /priorities ──────────────────────────────────────────────────────────

pub async fn list_priorities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Priority>>, HelpdeskError> {
    let usecase = ListPrioritiesUseCase {
        priorities: state.priority_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── POST /priorities ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePriorityRequest {
    pub name: String,
    pub level: i16,
}

pub async fn create_priority(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreatePriorityRequest>,
) -> Result<(StatusCode, Json<Priority>), HelpdeskError> {
    let usecase = CreatePriorityUseCase {
        priorities: state.priority_repo(),
    };
    let priority = usecase
        .execute(
            &current.actor(),
            CreatePriorityInput {
                name: body.name,
                level: body.level,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(priority)))
}
