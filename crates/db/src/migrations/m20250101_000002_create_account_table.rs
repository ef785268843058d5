//! Create `account` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Account::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Account::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Account::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Account::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Account::Phone).string_len(32))
                    .col(
                        ColumnDef::new(Account::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Account::IsRejected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Account::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Account::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: role (bootstrap check, directory listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_role")
                    .table(Account::Table)
                    .col(Account::Role)
                    .to_owned(),
            )
            .await?;

        // At most one admin: the bootstrap teacher
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_account_single_admin
                ON account (is_admin)
                WHERE is_admin = TRUE;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
    Role,
    Name,
    Email,
    Phone,
    IsApproved,
    IsRejected,
    IsAdmin,
    CreatedAt,
    UpdatedAt,
}
