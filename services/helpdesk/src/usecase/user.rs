use uuid::Uuid;

use helpdesk_domain::pagination::PageRequest;
use helpdesk_domain::policy::{Action, Actor, Resource, can_act};
use helpdesk_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{User, UserAccessChanges, next_stamp, validate_name};
use crate::error::HelpdeskError;

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> ListUsersUseCase<R> {
    pub async fn execute(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Vec<User>, HelpdeskError> {
        if !can_act(actor, Action::ManageUsers, &Resource::System) {
            return Err(HelpdeskError::Forbidden);
        }
        self.users.list(page.clamped()).await
    }
}

// ── UpdateUserAccess ─────────────────────────────────────────────────────────

pub struct UpdateUserAccessInput {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

pub struct UpdateUserAccessUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> UpdateUserAccessUseCase<R> {
    pub async fn execute(
        &self,
        actor: &Actor,
        user_id: Uuid,
        input: UpdateUserAccessInput,
    ) -> Result<User, HelpdeskError> {
        if !can_act(actor, Action::ManageUsers, &Resource::System) {
            return Err(HelpdeskError::Forbidden);
        }
        if input.full_name.is_none() && input.role.is_none() && input.is_active.is_none() {
            return Err(HelpdeskError::MissingData);
        }
        let role = input
            .role
            .as_deref()
            .map(str::parse::<UserRole>)
            .transpose()
            .map_err(|_| HelpdeskError::InvalidRole)?;
        if input.full_name.as_deref().is_some_and(|name| !validate_name(name)) {
            return Err(HelpdeskError::InvalidName);
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(HelpdeskError::UserNotFound)?;
        let changes = UserAccessChanges {
            full_name: input.full_name.map(|n| n.trim().to_owned()),
            role,
            is_active: input.is_active,
        };
        let updated = self
            .users
            .update_access(user.id, &changes, next_stamp(user.updated_at))
            .await?
            .ok_or(HelpdeskError::UserNotFound)?;
        tracing::info!(
            actor_id = %actor.id,
            user_id = %updated.id,
            role = %updated.role,
            is_active = updated.is_active,
            "user access updated"
        );
        Ok(updated)
    }
}
