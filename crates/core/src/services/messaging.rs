//! Messaging service for direct messages.

use chrono::Utc;
use hifz_common::{AppError, AppResult, IdGenerator};
use hifz_db::{
    LiveStream, Store,
    entities::message,
    repositories::{AccountRepository, MessageRepository},
};
use sea_orm::Set;

/// Maximum message length in characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    account_repo: AccountRepository,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            message_repo: MessageRepository::new(store.clone()),
            account_repo: AccountRepository::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message to another account.
    pub async fn send_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        student_id: Option<&str>,
    ) -> AppResult<message::Model> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Message is longer than {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "Cannot send message to yourself".to_string(),
            ));
        }

        self.account_repo
            .find_by_id(receiver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account not found: {receiver_id}")))?;

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            receiver_id: Set(receiver_id.to_string()),
            content: Set(content.to_string()),
            is_read: Set(false),
            student_id: Set(student_id.map(String::from)),
            created_at: Set(Utc::now().into()),
        };

        self.message_repo.create(model).await
    }

    /// Messages between two accounts, oldest first.
    pub async fn conversation(
        &self,
        account_id: &str,
        partner_id: &str,
    ) -> AppResult<Vec<message::Model>> {
        self.message_repo
            .find_conversation(account_id, partner_id)
            .await
    }

    /// Mark everything `partner_id` sent to `account_id` as read.
    pub async fn mark_conversation_read(&self, account_id: &str, partner_id: &str) -> AppResult<u64> {
        self.message_repo.mark_as_read(account_id, partner_id).await
    }

    /// Unread messages addressed to an account.
    pub async fn unread_count(&self, account_id: &str) -> AppResult<u64> {
        self.message_repo.count_unread(account_id).await
    }

    /// Live conversation between two accounts.
    #[must_use]
    pub fn watch_conversation(
        &self,
        account_id: &str,
        partner_id: &str,
    ) -> LiveStream<Vec<message::Model>> {
        self.message_repo.watch_conversation(account_id, partner_id)
    }
}
