//! Credential hashing and reset code generation.
//!
//! Passwords are hashed with Argon2id into PHC strings (`$argon2id$v=19$...`), each with
//! its own random salt. Hashing is CPU-bound, so the async entry points move it onto
//! tokio's blocking pool.

use std::sync::{Arc, OnceLock};

use anyhow::{Context, anyhow};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngExt;

use crate::domain::types::RESET_CODE_LEN;
use crate::error::HelpdeskError;

/// Verified against when a login names no account.
const DUMMY_PASSWORD: &str = "no-such-account";

#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    /// Built on first use with `params`, shared by clones.
    dummy_hash: Arc<OnceLock<String>>,
}

impl Default for CredentialHasher {
    /// OWASP-recommended Argon2id parameters: 19 MiB memory, 2 iterations, 1 lane.
    fn default() -> Self {
        Self::new(Params::new(19 * 1024, 2, 1, None).unwrap_or_default())
    }
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash_blocking(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("argon2 hash failed: {e}"))
    }

    /// `false` for a wrong password and for a stored hash that does not parse.
    pub fn verify_blocking(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one full verification on a login that has no stored hash, so an unknown
    /// email costs as much as a wrong password.
    pub fn verify_dummy_blocking(&self, password: &str) -> anyhow::Result<()> {
        let dummy = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.hash_blocking(DUMMY_PASSWORD)?;
                self.dummy_hash.get_or_init(|| hash)
            }
        };
        self.verify_blocking(password, dummy);
        Ok(())
    }

    pub async fn hash(&self, password: &str) -> Result<String, HelpdeskError> {
        let hasher = self.clone();
        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .context("password hashing task failed")??;
        Ok(hash)
    }

    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, HelpdeskError> {
        let hasher = self.clone();
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        let ok = tokio::task::spawn_blocking(move || hasher.verify_blocking(&password, &stored_hash))
            .await
            .context("password verification task failed")?;
        Ok(ok)
    }

    pub async fn verify_dummy(&self, password: &str) -> Result<(), HelpdeskError> {
        let hasher = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify_dummy_blocking(&password))
            .await
            .context("password verification task failed")??;
        Ok(())
    }
}

/// Uniform, zero-padded numeric reset code drawn from the thread-local CSPRNG.
pub fn generate_reset_code() -> String {
    let upper = 10u32.pow(RESET_CODE_LEN as u32);
    let n = rand::rng().random_range(0..upper);
    format!("{n:0width$}", width = RESET_CODE_LEN)
}
