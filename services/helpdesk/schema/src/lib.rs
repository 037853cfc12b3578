//! sea-orm entities for the helpdesk database.

pub mod attachments;
pub mod categories;
pub mod comments;
pub mod password_reset_tokens;
pub mod priorities;
pub mod tickets;
pub mod users;
