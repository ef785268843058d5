//! Student repository.

use crate::entities::student::{self, ActiveModel, Column, Entity as Student};
use crate::{Change, Collection, LiveStream, Store, live};
use hifz_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

/// Repository for student documents.
#[derive(Clone)]
pub struct StudentRepository {
    store: Store,
}

impl StudentRepository {
    /// Create a new student repository.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find a student by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<student::Model>> {
        Student::find_by_id(id)
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a student by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<student::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student not found: {id}")))
    }

    /// Students taught by a teacher, by name.
    pub async fn find_by_teacher(&self, teacher_id: &str) -> AppResult<Vec<student::Model>> {
        Student::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::Name)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Children linked to a parent, by name.
    pub async fn find_by_parent(&self, parent_id: &str) -> AppResult<Vec<student::Model>> {
        Student::find()
            .filter(Column::ParentId.eq(parent_id))
            .order_by_asc(Column::Name)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The student entity created for a student-role account.
    pub async fn find_by_account(&self, account_id: &str) -> AppResult<Option<student::Model>> {
        Student::find()
            .filter(Column::AccountId.eq(account_id))
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every student, by name.
    pub async fn find_all(&self) -> AppResult<Vec<student::Model>> {
        Student::find()
            .order_by_asc(Column::Name)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new student.
    pub async fn create(&self, model: ActiveModel) -> AppResult<student::Model> {
        let student = model
            .insert(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        self.store.feed().publish(Change::created(Collection::Students));
        Ok(student)
    }

    /// Update a student.
    pub async fn update(&self, model: ActiveModel) -> AppResult<student::Model> {
        let student = model
            .update(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        self.store.feed().publish(Change::updated(Collection::Students));
        Ok(student)
    }

    /// Live roster of a teacher.
    #[must_use]
    pub fn watch_by_teacher(&self, teacher_id: &str) -> LiveStream<Vec<student::Model>> {
        let repo = self.clone();
        let teacher_id = teacher_id.to_string();
        live::watch(self.store.feed(), &[Collection::Students], move || {
            let repo = repo.clone();
            let teacher_id = teacher_id.clone();
            async move { repo.find_by_teacher(&teacher_id).await }
        })
    }

    /// Live list of a parent's children.
    #[must_use]
    pub fn watch_by_parent(&self, parent_id: &str) -> LiveStream<Vec<student::Model>> {
        let repo = self.clone();
        let parent_id = parent_id.to_string();
        live::watch(self.store.feed(), &[Collection::Students], move || {
            let repo = repo.clone();
            let parent_id = parent_id.clone();
            async move { repo.find_by_parent(&parent_id).await }
        })
    }

    /// Live list of every student.
    #[must_use]
    pub fn watch_all(&self) -> LiveStream<Vec<student::Model>> {
        let repo = self.clone();
        live::watch(self.store.feed(), &[Collection::Students], move || {
            let repo = repo.clone();
            async move { repo.find_all().await }
        })
    }
}
