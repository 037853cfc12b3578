//! Ticket categories and priorities. Anyone may read them; only admins add entries.

use uuid::Uuid;

use helpdesk_domain::policy::{Action, Actor, Resource, can_act};

use crate::domain::repository::{CategoryRepository, PriorityRepository};
use crate::domain::types::{Category, Priority, validate_name};
use crate::error::HelpdeskError;

pub const MIN_PRIORITY_LEVEL: i16 = 1;
pub const MAX_PRIORITY_LEVEL: i16 = 10;

// ── Categories ───────────────────────────────────────────────────────────────

pub struct ListCategoriesUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> ListCategoriesUseCase<C> {
    pub async fn execute(&self) -> Result<Vec<Category>, HelpdeskError> {
        self.categories.list().await
    }
}

pub struct CreateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> CreateCategoryUseCase<C> {
    pub async fn execute(&self, actor: &Actor, name: &str) -> Result<Category, HelpdeskError> {
        if !can_act(actor, Action::ManageCatalog, &Resource::System) {
            return Err(HelpdeskError::Forbidden);
        }
        if !validate_name(name) {
            return Err(HelpdeskError::InvalidName);
        }
        let category = Category {
            id: Uuid::now_v7(),
            name: name.trim().to_owned(),
        };
        self.categories.create(&category).await?;
        Ok(category)
    }
}

// ── Priorities ───────────────────────────────────────────────────────────────

pub struct ListPrioritiesUseCase<P: PriorityRepository> {
    pub priorities: P,
}

impl<P: PriorityRepository> ListPrioritiesUseCase<P> {
    pub async fn execute(&self) -> Result<Vec<Priority>, HelpdeskError> {
        self.priorities.list().await
    }
}

pub struct CreatePriorityInput {
    pub name: String,
    pub level: i16,
}

pub struct CreatePriorityUseCase<P: PriorityRepository> {
    pub priorities: P,
}

impl<P: PriorityRepository> CreatePriorityUseCase<P> {
    pub async fn execute(
        &self,
        actor: &Actor,
        input: CreatePriorityInput,
    ) -> Result<Priority, HelpdeskError> {
        if !can_act(actor, Action::ManageCatalog, &Resource::System) {
            return Err(HelpdeskError::Forbidden);
        }
        if !validate_name(&input.name) {
            return Err(HelpdeskError::InvalidName);
        }
        if !(MIN_PRIORITY_LEVEL..=MAX_PRIORITY_LEVEL).contains(&input.level) {
            return Err(HelpdeskError::InvalidPriorityLevel);
        }
        let priority = Priority {
            id: Uuid::now_v7(),
            name: input.name.trim().to_owned(),
            level: input.level,
        };
        self.priorities.create(&priority).await?;
        Ok(priority)
    }
}
