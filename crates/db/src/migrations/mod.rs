//! Database migrations.
//!
//! One migration per collection. Relationships between collections are kept
//! by the services, so no foreign keys are declared.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_identity_table;
mod m20250101_000002_create_account_table;
mod m20250101_000003_create_join_request_table;
mod m20250101_000004_create_student_table;
mod m20250101_000005_create_daily_record_table;
mod m20250101_000006_create_message_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_identity_table::Migration),
            Box::new(m20250101_000002_create_account_table::Migration),
            Box::new(m20250101_000003_create_join_request_table::Migration),
            Box::new(m20250101_000004_create_student_table::Migration),
            Box::new(m20250101_000005_create_daily_record_table::Migration),
            Box::new(m20250101_000006_create_message_table::Migration),
        ]
    }
}
