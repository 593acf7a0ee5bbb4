//! Database entities.

#![allow(missing_docs)]

pub mod attendance_poll;
pub mod attendance_record;

pub use attendance_poll::Entity as AttendancePoll;
pub use attendance_record::Entity as AttendanceRecord;
