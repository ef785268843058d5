//! Identity repository.

use crate::entities::identity::{self, ActiveModel, Column, Entity as Identity};
use crate::{Change, Collection, Store};
use hifz_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};

/// Repository for credential identities.
#[derive(Clone)]
pub struct IdentityRepository {
    store: Store,
}

impl IdentityRepository {
    /// Create a new identity repository.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find an identity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<identity::Model>> {
        Identity::find_by_id(id)
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an identity by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<identity::Model>> {
        Identity::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new identity.
    pub async fn create(&self, model: ActiveModel) -> AppResult<identity::Model> {
        let identity = model
            .insert(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        self.store.feed().publish(Change::created(Collection::Identities));
        Ok(identity)
    }

    /// Delete an identity. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Identity::delete_by_id(id)
            .exec(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        if result.rows_affected > 0 {
            self.store.feed().publish(Change::deleted(Collection::Identities));
        }
        Ok(result.rows_affected > 0)
    }
}
