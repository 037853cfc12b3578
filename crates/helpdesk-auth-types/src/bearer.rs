//! `Authorization: Bearer <token>` header parsing.

use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::HeaderMap;

/// Extract the bearer token from request headers.
///
/// Returns `None` when the header is absent, uses another scheme, or is not valid
/// header text.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
        .filter(|token| !token.is_empty())
}
