//! Password reset by emailed one-time code.
//!
//! Both steps answer generically: a request never reveals whether the account exists,
//! and a failed confirm never reveals which check failed. The detail goes to the logs.

use chrono::Utc;

use crate::domain::password::{CredentialHasher, generate_reset_code};
use crate::domain::repository::{Mailer, PasswordResetRepository, UserRepository};
use crate::domain::types::{
    PasswordResetToken, RESET_CODE_LEN, RESET_CODE_TTL_SECS, next_stamp, normalize_email,
    validate_email, validate_password,
};
use crate::error::HelpdeskError;

/// Body returned by the request endpoint whatever the outcome.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email is registered, a reset code has been sent.";

const RESET_MAIL_SUBJECT: &str = "Your password reset code";

fn reset_mail_body(code: &str) -> String {
    format!(
        "Use this code to reset your helpdesk password: {code}\n\n\
         The code expires in {} minutes. If you did not ask for a reset, ignore this email.",
        RESET_CODE_TTL_SECS / 60
    )
}

fn is_well_formed_code(code: &str) -> bool {
    code.len() == RESET_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

// ── RequestPasswordReset ─────────────────────────────────────────────────────

pub struct RequestPasswordResetUseCase<U, P, M>
where
    U: UserRepository,
    P: PasswordResetRepository,
    M: Mailer + Clone + 'static,
{
    pub users: U,
    pub resets: P,
    pub mailer: M,
}

impl<U, P, M> RequestPasswordResetUseCase<U, P, M>
where
    U: UserRepository,
    P: PasswordResetRepository,
    M: Mailer + Clone + 'static,
{
    pub async fn execute(&self, email: &str) -> Result<(), HelpdeskError> {
        let email = normalize_email(email);
        if !validate_email(&email) {
            return Err(HelpdeskError::InvalidEmail);
        }

        match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active => {}
            Some(user) => {
                tracing::info!(user_id = %user.id, "password reset requested for inactive user");
                return Ok(());
            }
            None => {
                tracing::info!(email = %email, "password reset requested for unknown email");
                return Ok(());
            }
        }

        // Replacing first means only the newest code is ever redeemable.
        let token = PasswordResetToken::issue(&email, generate_reset_code(), Utc::now());
        self.resets.replace_for_email(&token).await?;

        // The token is already committed. Delivery runs detached so neither its latency
        // nor its failure shows in the response.
        let mailer = self.mailer.clone();
        let body = reset_mail_body(&token.code);
        let token_id = token.id;
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&email, RESET_MAIL_SUBJECT, &body, false).await {
                tracing::error!(error = ?e, %token_id, "failed to send password reset email");
            }
        });
        Ok(())
    }
}

// ── ConfirmPasswordReset ─────────────────────────────────────────────────────

pub struct ConfirmPasswordResetInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub struct ConfirmPasswordResetUseCase<U, P>
where
    U: UserRepository,
    P: PasswordResetRepository,
{
    pub users: U,
    pub resets: P,
    pub hasher: CredentialHasher,
}

impl<U, P> ConfirmPasswordResetUseCase<U, P>
where
    U: UserRepository,
    P: PasswordResetRepository,
{
    pub async fn execute(&self, input: ConfirmPasswordResetInput) -> Result<(), HelpdeskError> {
        if !validate_password(&input.new_password) {
            return Err(HelpdeskError::InvalidPassword);
        }
        let email = normalize_email(&input.email);
        let code = input.code.trim();
        if !is_well_formed_code(code) {
            tracing::info!("password reset confirm with malformed code");
            return Err(HelpdeskError::InvalidOrExpiredCode);
        }

        let Some(token) = self.resets.find_valid(&email, code, Utc::now()).await? else {
            tracing::info!(email = %email, "password reset confirm without a valid code");
            return Err(HelpdeskError::InvalidOrExpiredCode);
        };
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active => user,
            _ => {
                tracing::info!(token_id = %token.id, "password reset code for missing or inactive user");
                return Err(HelpdeskError::InvalidOrExpiredCode);
            }
        };

        let password_hash = self.hasher.hash(&input.new_password).await?;
        let redeemed = self
            .resets
            .redeem(token.id, user.id, &password_hash, next_stamp(user.updated_at))
            .await?;
        if !redeemed {
            tracing::info!(token_id = %token.id, "password reset code redeemed concurrently");
            return Err(HelpdeskError::InvalidOrExpiredCode);
        }
        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(())
    }
}
