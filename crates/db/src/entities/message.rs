//! Message entity for direct messages between two accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub sender_id: String,

    #[sea_orm(indexed)]
    pub receiver_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Has the receiver read this message?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Student the conversation is about, if any
    #[sea_orm(nullable)]
    pub student_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::SenderId",
        to = "super::account::Column::Id"
    )]
    Sender,

    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::ReceiverId",
        to = "super::account::Column::Id"
    )]
    Receiver,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sender.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The participant that is not `me`.
    #[must_use]
    pub fn counterpart_of(&self, me: &str) -> &str {
        if self.sender_id == me {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}
