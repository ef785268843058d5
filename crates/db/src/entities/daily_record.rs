//! Daily record entity: one calendar day of attendance and progress.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codes::{Attendance, CodedCategory, Listener, Performance};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub student_id: String,

    /// Calendar day the record belongs to, in the configured timezone
    #[sea_orm(indexed)]
    pub record_date: Date,

    /// [`Attendance`] code
    pub attendance: i32,

    #[sea_orm(nullable)]
    pub memorization_from_surah: Option<String>,
    #[sea_orm(nullable)]
    pub memorization_from_verse: Option<i32>,
    #[sea_orm(nullable)]
    pub memorization_to_surah: Option<String>,
    #[sea_orm(nullable)]
    pub memorization_to_verse: Option<i32>,
    #[sea_orm(nullable)]
    pub memorization_mistakes: Option<i32>,

    #[sea_orm(nullable)]
    pub review_from_surah: Option<String>,
    #[sea_orm(nullable)]
    pub review_from_verse: Option<i32>,
    #[sea_orm(nullable)]
    pub review_to_surah: Option<String>,
    #[sea_orm(nullable)]
    pub review_to_verse: Option<i32>,
    #[sea_orm(nullable)]
    pub review_mistakes: Option<i32>,

    /// [`Performance`] code
    #[sea_orm(nullable)]
    pub performance: Option<i32>,

    /// [`Listener`] code
    #[sea_orm(nullable)]
    pub listener: Option<i32>,

    /// Account that heard the recitation, if recorded
    #[sea_orm(nullable)]
    pub listener_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    #[sea_orm(nullable)]
    pub created_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decoded attendance status.
    #[must_use]
    pub fn attendance(&self) -> Attendance {
        Attendance::decode(self.attendance)
    }

    /// Decoded performance rating.
    #[must_use]
    pub fn performance(&self) -> Option<Performance> {
        self.performance.map(Performance::decode)
    }

    /// Decoded listener category.
    #[must_use]
    pub fn listener(&self) -> Option<Listener> {
        self.listener.map(Listener::decode)
    }

    /// Whether memorization or review data is present.
    #[must_use]
    pub const fn has_recitation(&self) -> bool {
        self.memorization_from_surah.is_some()
            || self.memorization_to_surah.is_some()
            || self.review_from_surah.is_some()
            || self.review_to_surah.is_some()
    }
}
