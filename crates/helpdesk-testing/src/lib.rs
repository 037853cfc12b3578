//! Test utilities for helpdesk services.
//!
//! Import in tests only, never in production code.

pub mod auth;
