//! Create `student` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Student::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Student::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Student::Age).integer().not_null())
                    .col(ColumnDef::new(Student::ParentId).string_len(32))
                    .col(ColumnDef::new(Student::TeacherId).string_len(32))
                    .col(ColumnDef::new(Student::AccountId).string_len(32))
                    .col(
                        ColumnDef::new(Student::JuzNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Student::SurahName).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Student::VerseNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Student::Notes).text())
                    .col(
                        ColumnDef::new(Student::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Student::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_student_parent_id", Student::ParentId),
            ("idx_student_teacher_id", Student::TeacherId),
            ("idx_student_account_id", Student::AccountId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Student::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
    Name,
    Age,
    ParentId,
    TeacherId,
    AccountId,
    JuzNumber,
    SurahName,
    VerseNumber,
    Notes,
    EnrolledAt,
    UpdatedAt,
}
