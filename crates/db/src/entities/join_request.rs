//! Join request entity: a signup awaiting review.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::account::Role;

/// Review status of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum JoinRequestStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "join_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Account (and identity) that applied
    #[sea_orm(indexed)]
    pub account_id: String,

    pub role: Role,

    pub name: String,

    pub email: String,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    /// Student requests only
    #[sea_orm(nullable)]
    pub age: Option<i32>,

    #[sea_orm(indexed)]
    pub status: JoinRequestStatus,

    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub reviewed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
