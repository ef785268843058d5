//! Account repository.

use crate::entities::account::{self, ActiveModel, Column, Entity as Account, Role};
use crate::{Change, Collection, LiveStream, Store, live, write_error};
use hifz_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Repository for account documents.
#[derive(Clone)]
pub struct AccountRepository {
    store: Store,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an account by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<account::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account not found: {id}")))
    }

    /// Whether any account holds `role`.
    pub async fn exists_with_role(&self, role: Role) -> AppResult<bool> {
        let count = Account::find()
            .filter(Column::Role.eq(role))
            .count(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// All accounts with `role`, by name.
    pub async fn find_by_role(&self, role: Role) -> AppResult<Vec<account::Model>> {
        Account::find()
            .filter(Column::Role.eq(role))
            .order_by_asc(Column::Name)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every account, by name.
    pub async fn find_all(&self) -> AppResult<Vec<account::Model>> {
        Account::find()
            .order_by_asc(Column::Name)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new account.
    pub async fn create(&self, model: ActiveModel) -> AppResult<account::Model> {
        let account = model
            .insert(self.store.connection())
            .await
            .map_err(write_error)?;

        self.store.feed().publish(Change::created(Collection::Accounts));
        Ok(account)
    }

    /// Update an account.
    pub async fn update(&self, model: ActiveModel) -> AppResult<account::Model> {
        let account = model
            .update(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        self.store.feed().publish(Change::updated(Collection::Accounts));
        Ok(account)
    }

    /// Delete an account document. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Account::delete_by_id(id)
            .exec(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        if result.rows_affected > 0 {
            self.store.feed().publish(Change::deleted(Collection::Accounts));
        }
        Ok(result.rows_affected > 0)
    }

    /// Live list of accounts with `role`.
    #[must_use]
    pub fn watch_by_role(&self, role: Role) -> LiveStream<Vec<account::Model>> {
        let repo = self.clone();
        live::watch(self.store.feed(), &[Collection::Accounts], move || {
            let repo = repo.clone();
            async move { repo.find_by_role(role).await }
        })
    }

    /// Live directory of every account.
    #[must_use]
    pub fn watch_all(&self) -> LiveStream<Vec<account::Model>> {
        let repo = self.clone();
        live::watch(self.store.feed(), &[Collection::Accounts], move || {
            let repo = repo.clone();
            async move { repo.find_all().await }
        })
    }
}
