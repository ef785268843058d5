//! Create `message` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::SenderId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::ReceiverId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::Content).text().not_null())
                    .col(
                        ColumnDef::new(Message::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Message::StudentId).string_len(32))
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: sender_id
        manager
            .create_index(
                Index::create()
                    .name("idx_message_sender_id")
                    .table(Message::Table)
                    .col(Message::SenderId)
                    .to_owned(),
            )
            .await?;

        // Index: receiver_id
        manager
            .create_index(
                Index::create()
                    .name("idx_message_receiver_id")
                    .table(Message::Table)
                    .col(Message::ReceiverId)
                    .to_owned(),
            )
            .await?;

        // Composite index for conversation lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_message_conversation")
                    .table(Message::Table)
                    .col(Message::SenderId)
                    .col(Message::ReceiverId)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Content,
    IsRead,
    StudentId,
    CreatedAt,
}
