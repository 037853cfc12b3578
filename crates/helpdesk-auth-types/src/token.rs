//! Signed session tokens.
//!
//! Tokens are HS256 JWTs carrying the user id, role and expiry. They are stateless: there
//! is no revocation list, so the expiry is the only bound on a token's lifetime.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_domain::user::UserRole;

/// Default session lifetime in seconds (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub role: UserRole,
    pub expires_at: u64,
}

/// A freshly minted token and its expiry (seconds since UNIX epoch).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Errors returned by [`TokenSigner::verify`].
///
/// Callers answer both with 401; the distinction exists for logs and client feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user id (UUID string) |
/// | `role` | custom | `client`, `helpdesk` or `admin` |
/// | `iat` | `iat` | issue time, seconds since epoch |
/// | `exp` | `exp` | expiry, seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: UserRole,
    pub iat: u64,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Issues and verifies session tokens with a server-held HMAC secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, role, now_secs())
    }

    /// Issue a token as if minted at `issued_at` (seconds since epoch).
    pub fn issue_at(
        &self,
        user_id: Uuid,
        role: UserRole,
        issued_at: u64,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let exp = issued_at
            .checked_add(self.ttl_secs)
            .ok_or_else(|| ErrorKind::InvalidClaimFormat("exp".to_owned()))?;
        let claims = JwtClaims {
            sub: user_id.to_string(),
            role,
            iat: issued_at,
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Verify signature and expiry, returning the embedded identity.
    ///
    /// Validation: HS256, `exp` checked with zero leeway, required claims `exp` + `sub`.
    pub fn verify(&self, token: &str) -> Result<TokenInfo, TokenError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| TokenError::Invalid)?;
        Ok(TokenInfo {
            user_id,
            role: data.claims.role,
            expires_at: data.claims.exp,
        })
    }
}
