//! Create `daily_record` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailyRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyRecord::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DailyRecord::StudentId).string_len(32).not_null())
                    .col(ColumnDef::new(DailyRecord::RecordDate).date().not_null())
                    .col(
                        ColumnDef::new(DailyRecord::Attendance)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DailyRecord::MemorizationFromSurah).string_len(64))
                    .col(ColumnDef::new(DailyRecord::MemorizationFromVerse).integer())
                    .col(ColumnDef::new(DailyRecord::MemorizationToSurah).string_len(64))
                    .col(ColumnDef::new(DailyRecord::MemorizationToVerse).integer())
                    .col(ColumnDef::new(DailyRecord::MemorizationMistakes).integer())
                    .col(ColumnDef::new(DailyRecord::ReviewFromSurah).string_len(64))
                    .col(ColumnDef::new(DailyRecord::ReviewFromVerse).integer())
                    .col(ColumnDef::new(DailyRecord::ReviewToSurah).string_len(64))
                    .col(ColumnDef::new(DailyRecord::ReviewToVerse).integer())
                    .col(ColumnDef::new(DailyRecord::ReviewMistakes).integer())
                    .col(ColumnDef::new(DailyRecord::Performance).integer())
                    .col(ColumnDef::new(DailyRecord::Listener).integer())
                    .col(ColumnDef::new(DailyRecord::ListenerId).string_len(32))
                    .col(ColumnDef::new(DailyRecord::Notes).text())
                    .col(ColumnDef::new(DailyRecord::CreatedBy).string_len(32))
                    .col(
                        ColumnDef::new(DailyRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One record per student per day
        manager
            .create_index(
                Index::create()
                    .name("idx_daily_record_student_date")
                    .table(DailyRecord::Table)
                    .col(DailyRecord::StudentId)
                    .col(DailyRecord::RecordDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: record_date (roster dashboards)
        manager
            .create_index(
                Index::create()
                    .name("idx_daily_record_record_date")
                    .table(DailyRecord::Table)
                    .col(DailyRecord::RecordDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DailyRecord {
    Table,
    Id,
    StudentId,
    RecordDate,
    Attendance,
    MemorizationFromSurah,
    MemorizationFromVerse,
    MemorizationToSurah,
    MemorizationToVerse,
    MemorizationMistakes,
    ReviewFromSurah,
    ReviewFromVerse,
    ReviewToSurah,
    ReviewToVerse,
    ReviewMistakes,
    Performance,
    Listener,
    ListenerId,
    Notes,
    CreatedBy,
    CreatedAt,
}
