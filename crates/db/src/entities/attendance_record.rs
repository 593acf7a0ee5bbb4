//! Attendance record entity.
//!
//! Append-only. The unique index on (`session_id`, `student_id`) is the sole
//! arbiter of "already marked": concurrent redemptions race on the insert,
//! not on an existence pre-check.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Class session attendance was marked for.
    pub session_id: String,

    /// Student who redeemed the code (external identity).
    pub student_id: String,

    /// Poll whose redemption produced this record.
    #[sea_orm(indexed)]
    pub poll_id: String,

    /// Wall-clock time of the successful redemption.
    pub marked_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_poll::Entity",
        from = "Column::PollId",
        to = "super::attendance_poll::Column::Id",
        on_delete = "Cascade"
    )]
    AttendancePoll,
}

impl Related<super::attendance_poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendancePoll.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
