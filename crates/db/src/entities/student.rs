//! Student entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    pub age: i32,

    /// Linked parent account; cleared when the parent is removed
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    /// Owning teacher account; cleared when the teacher is removed
    #[sea_orm(nullable, indexed)]
    pub teacher_id: Option<String>,

    /// Student-role account this entity was created for
    #[sea_orm(nullable, indexed)]
    pub account_id: Option<String>,

    /// Current juz (1-30)
    pub juz_number: i32,

    /// Current surah
    pub surah_name: String,

    /// Current verse within the surah
    pub verse_number: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub enrolled_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::daily_record::Entity")]
    DailyRecord,
}

impl Related<super::daily_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
