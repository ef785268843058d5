//! Create `join_request` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JoinRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JoinRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JoinRequest::AccountId).string_len(32).not_null())
                    .col(ColumnDef::new(JoinRequest::Role).string_len(16).not_null())
                    .col(ColumnDef::new(JoinRequest::Name).string_len(256).not_null())
                    .col(ColumnDef::new(JoinRequest::Email).string_len(320).not_null())
                    .col(ColumnDef::new(JoinRequest::Phone).string_len(32))
                    .col(ColumnDef::new(JoinRequest::Age).integer())
                    .col(
                        ColumnDef::new(JoinRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(JoinRequest::ReviewedBy).string_len(32))
                    .col(
                        ColumnDef::new(JoinRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JoinRequest::ReviewedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: account_id (purge on rejection)
        manager
            .create_index(
                Index::create()
                    .name("idx_join_request_account_id")
                    .table(JoinRequest::Table)
                    .col(JoinRequest::AccountId)
                    .to_owned(),
            )
            .await?;

        // Index: status (pending queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_join_request_status")
                    .table(JoinRequest::Table)
                    .col(JoinRequest::Status)
                    .col(JoinRequest::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JoinRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum JoinRequest {
    Table,
    Id,
    AccountId,
    Role,
    Name,
    Email,
    Phone,
    Age,
    Status,
    ReviewedBy,
    CreatedAt,
    ReviewedAt,
}
