//! Domain types shared across the helpdesk crates: roles, ticket status, paging and the
//! authorization policy. Pure types and pure decisions only; no framework dependencies.

pub mod pagination;
pub mod policy;
pub mod ticket;
pub mod user;
