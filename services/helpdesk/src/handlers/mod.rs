pub mod actor;
pub mod attachment;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod ticket;
pub mod user;
