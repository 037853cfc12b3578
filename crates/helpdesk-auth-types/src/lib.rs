//! Session-token types shared by the helpdesk service and its tests.
//!
//! Provides the HMAC-signed token issuer/verifier and bearer-header parsing.

pub mod bearer;
pub mod token;
