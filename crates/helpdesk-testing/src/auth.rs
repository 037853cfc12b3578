//! Bearer-token helpers for router tests.
//!
//! `TestAuth` signs tokens with the same secret the router under test was built with, so
//! requests can be authenticated without going through `/auth/login`.

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use uuid::Uuid;

use helpdesk_auth_types::token::TokenSigner;
use helpdesk_domain::user::UserRole;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

pub struct TestAuth {
    pub signer: TokenSigner,
}

impl Default for TestAuth {
    fn default() -> Self {
        Self::new(TEST_JWT_SECRET)
    }
}

impl TestAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            signer: TokenSigner::new(secret, 3600),
        }
    }

    /// A valid token for `user_id` with `role`.
    pub fn token(&self, user_id: Uuid, role: UserRole) -> String {
        self.signer.issue(user_id, role).unwrap().token
    }

    /// A correctly signed token whose expiry lies in the past.
    pub fn expired_token(&self, user_id: Uuid, role: UserRole) -> String {
        self.signer.issue_at(user_id, role, 1_000).unwrap().token
    }

    /// `Authorization: Bearer <token>` header map.
    pub fn headers(token: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        map
    }
}
