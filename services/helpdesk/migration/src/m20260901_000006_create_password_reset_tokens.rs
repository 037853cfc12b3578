use sea_orm_migration::prelude::*;

/// At most one unused code per email. sea-query has no partial index builder.
const UNUSED_CODE_PER_EMAIL_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     uq_password_reset_tokens_email_unused \
     ON password_reset_tokens (email) WHERE used = false";

const DROP_UNUSED_CODE_PER_EMAIL_INDEX: &str =
    "DROP INDEX IF EXISTS uq_password_reset_tokens_email_unused";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordResetTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PasswordResetTokens::Email).string().not_null())
                    .col(
                        ColumnDef::new(PasswordResetTokens::Code)
                            .string_len(6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(PasswordResetTokens::Table)
                    .col(PasswordResetTokens::Email)
                    .col(PasswordResetTokens::Used)
                    .name("idx_password_reset_tokens_email_used")
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(UNUSED_CODE_PER_EMAIL_INDEX)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DROP_UNUSED_CODE_PER_EMAIL_INDEX)
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordResetTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PasswordResetTokens {
    Table,
    Id,
    Email,
    Code,
    ExpiresAt,
    Used,
    CreatedAt,
}
