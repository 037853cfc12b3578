//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use helpdesk_auth_types::bearer::bearer_token;
use helpdesk_domain::policy::Actor;

use crate::domain::types::User;
use crate::error::HelpdeskError;
use crate::state::AppState;
use crate::usecase::account::AuthenticateUseCase;

/// The active user behind the request's `Authorization: Bearer` token.
///
/// Rejects with 401 (`MISSING_TOKEN`, `INVALID_TOKEN`, `TOKEN_EXPIRED` or
/// `INACTIVE_USER`). Authorization (403) is left to the use cases.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = HelpdeskError;

    // Read everything needed from `parts` and `state` up front so the returned future
    // borrows neither.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let usecase = AuthenticateUseCase {
            users: state.user_repo(),
            tokens: state.tokens.clone(),
        };
        async move { usecase.execute(token.as_deref()).await.map(CurrentUser) }
    }
}
