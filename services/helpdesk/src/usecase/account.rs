use anyhow::Context;
use uuid::Uuid;

use helpdesk_auth_types::token::{IssuedToken, TokenError, TokenSigner};
use helpdesk_domain::user::UserRole;

use crate::domain::password::CredentialHasher;
use crate::domain::repository::UserRepository;
use crate::domain::types::{
    User, next_stamp, normalize_email, stamp_now, validate_email, validate_name,
    validate_password,
};
use crate::error::HelpdeskError;

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub struct RegisterUseCase<R: UserRepository> {
    pub users: R,
    pub hasher: CredentialHasher,
}

impl<R: UserRepository> RegisterUseCase<R> {
    /// New accounts are always active clients; roles are granted by an admin.
    pub async fn execute(&self, input: RegisterInput) -> Result<User, HelpdeskError> {
        let email = normalize_email(&input.email);
        if !validate_email(&email) {
            return Err(HelpdeskError::InvalidEmail);
        }
        if !validate_password(&input.password) {
            return Err(HelpdeskError::InvalidPassword);
        }
        if !validate_name(&input.full_name) {
            return Err(HelpdeskError::InvalidName);
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        let now = stamp_now();
        let user = User {
            id: Uuid::now_v7(),
            email,
            password_hash,
            full_name: input.full_name.trim().to_owned(),
            role: UserRole::Client,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginOutput {
    pub user: User,
    pub token: IssuedToken,
}

pub struct LoginUseCase<R: UserRepository> {
    pub users: R,
    pub hasher: CredentialHasher,
    pub tokens: TokenSigner,
}

impl<R: UserRepository> LoginUseCase<R> {
    /// Credentials are checked before the active flag, so an inactive account is only
    /// revealed to someone who knows its password.
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, HelpdeskError> {
        let email = normalize_email(&input.email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            // Same Argon2 work as a wrong password, so latency does not reveal accounts.
            self.hasher.verify_dummy(&input.password).await?;
            return Err(HelpdeskError::InvalidCredentials);
        };

        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            return Err(HelpdeskError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(HelpdeskError::InactiveUser);
        }

        let token = self
            .tokens
            .issue(user.id, user.role)
            .context("failed to sign session token")?;
        Ok(LoginOutput { user, token })
    }
}

// ── Authenticate ─────────────────────────────────────────────────────────────

pub struct AuthenticateUseCase<R: UserRepository> {
    pub users: R,
    pub tokens: TokenSigner,
}

impl<R: UserRepository> AuthenticateUseCase<R> {
    /// Resolve a presented bearer token to the stored user.
    ///
    /// The user is re-read on every request, so role changes and deactivation apply
    /// immediately; the token's own role claim is not trusted for authorization.
    pub async fn execute(&self, token: Option<&str>) -> Result<User, HelpdeskError> {
        let Some(token) = token else {
            tracing::info!(cause = "missing", "token rejected");
            return Err(HelpdeskError::MissingToken);
        };
        let info = self.tokens.verify(token).map_err(|e| match e {
            TokenError::Expired => {
                tracing::info!(cause = "expired", "token rejected");
                HelpdeskError::TokenExpired
            }
            TokenError::Invalid => {
                tracing::info!(cause = "invalid", "token rejected");
                HelpdeskError::InvalidToken
            }
        })?;

        let Some(user) = self.users.find_by_id(info.user_id).await? else {
            tracing::info!(cause = "unknown_subject", user_id = %info.user_id, "token rejected");
            return Err(HelpdeskError::InvalidToken);
        };
        if !user.is_active {
            tracing::info!(cause = "inactive", user_id = %user.id, "token rejected");
            return Err(HelpdeskError::InactiveUser);
        }
        Ok(user)
    }
}

// ── UpdateProfile ────────────────────────────────────────────────────────────

pub struct UpdateProfileInput {
    pub full_name: Option<String>,
}

pub struct UpdateProfileUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> UpdateProfileUseCase<R> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<User, HelpdeskError> {
        let full_name = input.full_name.ok_or(HelpdeskError::MissingData)?;
        if !validate_name(&full_name) {
            return Err(HelpdeskError::InvalidName);
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(HelpdeskError::UserNotFound)?;
        self.users
            .update_full_name(user.id, full_name.trim(), next_stamp(user.updated_at))
            .await?
            .ok_or(HelpdeskError::UserNotFound)
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<R: UserRepository> {
    pub users: R,
    pub hasher: CredentialHasher,
}

impl<R: UserRepository> ChangePasswordUseCase<R> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: ChangePasswordInput,
    ) -> Result<(), HelpdeskError> {
        if !validate_password(&input.new_password) {
            return Err(HelpdeskError::InvalidPassword);
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(HelpdeskError::UserNotFound)?;
        if !self
            .hasher
            .verify(&input.current_password, &user.password_hash)
            .await?
        {
            return Err(HelpdeskError::InvalidCredentials);
        }
        let password_hash = self.hasher.hash(&input.new_password).await?;
        self.users
            .set_password(user.id, &password_hash, next_stamp(user.updated_at))
            .await
    }
}
