//! Daily record repository.

use crate::entities::daily_record::{self, ActiveModel, Column, Entity as DailyRecord};
use crate::{Change, Collection, LiveStream, Store, live, write_error};
use chrono::NaiveDate;
use hifz_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Repository for daily record documents.
#[derive(Clone)]
pub struct DailyRecordRepository {
    store: Store,
}

impl DailyRecordRepository {
    /// Create a new daily record repository.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find a record by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<daily_record::Model>> {
        DailyRecord::find_by_id(id)
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A student's records, newest day first.
    pub async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<daily_record::Model>> {
        DailyRecord::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::RecordDate)
            .order_by_desc(Column::CreatedAt)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Records dated within `from..=to`, optionally for one student.
    pub async fn find_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        student_id: Option<&str>,
    ) -> AppResult<Vec<daily_record::Model>> {
        let mut query = DailyRecord::find()
            .filter(Column::RecordDate.gte(from))
            .filter(Column::RecordDate.lte(to));

        if let Some(student_id) = student_id {
            query = query.filter(Column::StudentId.eq(student_id));
        }

        query
            .order_by_desc(Column::RecordDate)
            .order_by_desc(Column::CreatedAt)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every record dated `date`.
    pub async fn find_on_date(&self, date: NaiveDate) -> AppResult<Vec<daily_record::Model>> {
        self.find_between(date, date, None).await
    }

    /// A student's records dated `date`, newest first.
    pub async fn find_for_student_on(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<daily_record::Model>> {
        self.find_between(date, date, Some(student_id)).await
    }

    /// Whether a student already has a record dated `date`.
    pub async fn exists_for_student_on(&self, student_id: &str, date: NaiveDate) -> AppResult<bool> {
        let count = DailyRecord::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::RecordDate.eq(date))
            .count(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Create a new record.
    pub async fn create(&self, model: ActiveModel) -> AppResult<daily_record::Model> {
        let record = model
            .insert(self.store.connection())
            .await
            .map_err(write_error)?;

        self.store.feed().publish(Change::created(Collection::DailyRecords));
        Ok(record)
    }

    /// Live list of every record dated `date`.
    #[must_use]
    pub fn watch_on_date(&self, date: NaiveDate) -> LiveStream<Vec<daily_record::Model>> {
        let repo = self.clone();
        live::watch(self.store.feed(), &[Collection::DailyRecords], move || {
            let repo = repo.clone();
            async move { repo.find_on_date(date).await }
        })
    }

    /// Live list of one student's records dated `date`.
    #[must_use]
    pub fn watch_for_student_on(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> LiveStream<Vec<daily_record::Model>> {
        let repo = self.clone();
        let student_id = student_id.to_string();
        live::watch(self.store.feed(), &[Collection::DailyRecords], move || {
            let repo = repo.clone();
            let student_id = student_id.clone();
            async move { repo.find_for_student_on(&student_id, date).await }
        })
    }
}
