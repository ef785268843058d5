//! Message repository.

use crate::entities::message::{self, ActiveModel, Column, Entity as Message};
use crate::{Change, Collection, LiveStream, Store, live};
use hifz_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// Repository for message documents.
#[derive(Clone)]
pub struct MessageRepository {
    store: Store,
}

/// Messages exchanged between `a` and `b`, either direction.
fn between(a: &str, b: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(Column::SenderId.eq(a))
                .add(Column::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(Column::SenderId.eq(b))
                .add(Column::ReceiverId.eq(a)),
        )
}

/// Messages sent or received by `account_id`.
pub fn involving(account_id: &str) -> Condition {
    Condition::any()
        .add(Column::SenderId.eq(account_id))
        .add(Column::ReceiverId.eq(account_id))
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The conversation between two accounts, oldest first.
    pub async fn find_conversation(
        &self,
        account_id: &str,
        partner_id: &str,
    ) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(between(account_id, partner_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every message an account sent or received, newest first.
    pub async fn find_involving(&self, account_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(involving(account_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread messages addressed to an account.
    pub async fn count_unread(&self, account_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(Column::ReceiverId.eq(account_id))
            .filter(Column::IsRead.eq(false))
            .count(self.store.connection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new message.
    pub async fn create(&self, model: ActiveModel) -> AppResult<message::Model> {
        let message = model
            .insert(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        self.store.feed().publish(Change::created(Collection::Messages));
        Ok(message)
    }

    /// Mark messages from `partner_id` to `account_id` as read.
    pub async fn mark_as_read(&self, account_id: &str, partner_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::SenderId.eq(partner_id))
            .filter(Column::ReceiverId.eq(account_id))
            .filter(Column::IsRead.eq(false))
            .exec(self.store.connection())
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        if result.rows_affected > 0 {
            self.store.feed().publish(Change::updated(Collection::Messages));
        }
        Ok(result.rows_affected)
    }

    /// Live list of every message an account sent or received.
    #[must_use]
    pub fn watch_involving(&self, account_id: &str) -> LiveStream<Vec<message::Model>> {
        let repo = self.clone();
        let account_id = account_id.to_string();
        live::watch(self.store.feed(), &[Collection::Messages], move || {
            let repo = repo.clone();
            let account_id = account_id.clone();
            async move { repo.find_involving(&account_id).await }
        })
    }

    /// Live conversation between two accounts.
    #[must_use]
    pub fn watch_conversation(
        &self,
        account_id: &str,
        partner_id: &str,
    ) -> LiveStream<Vec<message::Model>> {
        let repo = self.clone();
        let account_id = account_id.to_string();
        let partner_id = partner_id.to_string();
        live::watch(self.store.feed(), &[Collection::Messages], move || {
            let repo = repo.clone();
            let account_id = account_id.clone();
            let partner_id = partner_id.clone();
            async move { repo.find_conversation(&account_id, &partner_id).await }
        })
    }
}
