//! Cascading removal of accounts and students.
//!
//! Each removal is one transaction; its change events go out only after the
//! commit, so live queries never see a half-applied cascade.

use hifz_common::{AppError, AppResult};
use hifz_db::{
    Change, Collection, Store,
    entities::{
        Role,
        account::Entity as Account,
        daily_record::{self, Entity as DailyRecord},
        message::Entity as Message,
        student::{self, Entity as Student},
    },
    repositories::involving,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

fn write_failure(e: sea_orm::DbErr) -> AppError {
    AppError::WriteFailure(e.to_string())
}

/// Removal service.
#[derive(Clone)]
pub struct RemovalService {
    store: Store,
}

impl RemovalService {
    /// Create a new removal service.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Delete an account, unlinking (never deleting) the students that
    /// referenced it and deleting every message it sent or received.
    pub async fn remove_account_and_dependents(&self, account_id: &str, role: Role) -> AppResult<()> {
        let txn = self.store.begin().await?;

        let link = match role {
            Role::Parent => Some(student::Column::ParentId),
            Role::Teacher => Some(student::Column::TeacherId),
            Role::Student => None,
        };

        let mut unlinked = 0;
        if let Some(column) = link {
            unlinked = Student::update_many()
                .col_expr(column, Expr::value(Option::<String>::None))
                .filter(column.eq(account_id))
                .exec(&txn)
                .await
                .map_err(write_failure)?
                .rows_affected;
        }

        let messages = Message::delete_many()
            .filter(involving(account_id))
            .exec(&txn)
            .await
            .map_err(write_failure)?
            .rows_affected;

        Account::delete_by_id(account_id)
            .exec(&txn)
            .await
            .map_err(write_failure)?;

        txn.commit().await.map_err(write_failure)?;

        let feed = self.store.feed();
        if unlinked > 0 {
            feed.publish(Change::updated(Collection::Students));
        }
        if messages > 0 {
            feed.publish(Change::deleted(Collection::Messages));
        }
        feed.publish(Change::deleted(Collection::Accounts));

        tracing::info!(
            account_id = %account_id,
            role = %role,
            students_unlinked = unlinked,
            messages_deleted = messages,
            "Account removed"
        );
        Ok(())
    }

    /// Delete a student together with all of its daily records.
    pub async fn remove_student(&self, student_id: &str) -> AppResult<()> {
        let txn = self.store.begin().await?;

        let records = DailyRecord::delete_many()
            .filter(daily_record::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(write_failure)?
            .rows_affected;

        let removed = Student::delete_by_id(student_id)
            .exec(&txn)
            .await
            .map_err(write_failure)?
            .rows_affected;

        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "Student not found: {student_id}"
            )));
        }

        txn.commit().await.map_err(write_failure)?;

        self.store.feed().publish_all([
            Change::deleted(Collection::DailyRecords),
            Change::deleted(Collection::Students),
        ]);

        tracing::info!(student_id = %student_id, records_deleted = records, "Student removed");
        Ok(())
    }
}
