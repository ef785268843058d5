//! Join request repository.

use crate::entities::join_request::{self, ActiveModel, Column, Entity as JoinRequest, JoinRequestStatus};
use crate::{Change, Collection, LiveStream, Store, live};
use hifz_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

/// Repository for join request documents.
#[derive(Clone)]
pub struct JoinRequestRepository {
    store: Store,
}

impl JoinRequestRepository {
    /// Create a new join request repository.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find a join request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<join_request::Model>> {
        JoinRequest::find_by_id(id)
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a join request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<join_request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Join request not found: {id}")))
    }

    /// Every request filed by an account, oldest first.
    pub async fn find_by_account(&self, account_id: &str) -> AppResult<Vec<join_request::Model>> {
        JoinRequest::find()
            .filter(Column::AccountId.eq(account_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending requests, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<join_request::Model>> {
        JoinRequest::find()
            .filter(Column::Status.eq(JoinRequestStatus::Pending))
            .order_by_asc(Column::CreatedAt)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new join request.
    pub async fn create(&self, model: ActiveModel) -> AppResult<join_request::Model> {
        let request = model
            .insert(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        self.store.feed().publish(Change::created(Collection::JoinRequests));
        Ok(request)
    }

    /// Delete every request filed by an account. Returns the number deleted.
    pub async fn delete_by_account(&self, account_id: &str) -> AppResult<u64> {
        let result = JoinRequest::delete_many()
            .filter(Column::AccountId.eq(account_id))
            .exec(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        if result.rows_affected > 0 {
            self.store.feed().publish(Change::deleted(Collection::JoinRequests));
        }
        Ok(result.rows_affected)
    }

    /// Live queue of pending requests.
    #[must_use]
    pub fn watch_pending(&self) -> LiveStream<Vec<join_request::Model>> {
        let repo = self.clone();
        live::watch(self.store.feed(), &[Collection::JoinRequests], move || {
            let repo = repo.clone();
            async move { repo.find_pending().await }
        })
    }
}
