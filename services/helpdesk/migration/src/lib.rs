use sea_orm_migration::prelude::*;

mod m20260901_000001_create_users;
mod m20260901_000002_create_catalog;
mod m20260901_000003_create_tickets;
mod m20260901_000004_create_comments;
mod m20260901_000005_create_attachments;
mod m20260901_000006_create_password_reset_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_users::Migration),
            Box::new(m20260901_000002_create_catalog::Migration),
            Box::new(m20260901_000003_create_tickets::Migration),
            Box::new(m20260901_000004_create_comments::Migration),
            Box::new(m20260901_000005_create_attachments::Migration),
            Box::new(m20260901_000006_create_password_reset_tokens::Migration),
        ]
    }
}
