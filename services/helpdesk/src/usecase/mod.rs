pub mod account;
pub mod attachment;
pub mod catalog;
pub mod comment;
pub mod password_reset;
pub mod ticket;
pub mod user;
