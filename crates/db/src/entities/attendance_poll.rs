//! Attendance poll entity.
//!
//! One row per issued code. Rows are immutable after insert; whether a poll
//! is active is derived from `expires_at` at read time, never stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Class session this poll marks attendance for (external entity,
    /// referenced by ID only).
    #[sea_orm(indexed)]
    pub session_id: String,

    /// Short decimal code handed out to students.
    #[sea_orm(indexed)]
    pub code: String,

    /// Professor who issued the poll.
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,

    /// End of the validity window. Always strictly after `created_at`.
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecord,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
