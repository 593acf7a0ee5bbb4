//! Create attendance record table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AttendanceRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceRecord::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecord::SessionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecord::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecord::PollId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecord::MarkedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_record_poll")
                            .from(AttendanceRecord::Table, AttendanceRecord::PollId)
                            .to(AttendancePoll::Table, AttendancePoll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (session_id, student_id) - one record per student per
        // session. Concurrent redemptions are arbitrated by this constraint.
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_record_session_student")
                    .table(AttendanceRecord::Table)
                    .col(AttendanceRecord::SessionId)
                    .col(AttendanceRecord::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: poll_id (for listing redemptions of a poll)
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_record_poll_id")
                    .table(AttendanceRecord::Table)
                    .col(AttendanceRecord::PollId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AttendanceRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AttendanceRecord {
    Table,
    Id,
    SessionId,
    StudentId,
    PollId,
    MarkedAt,
}

#[derive(Iden)]
enum AttendancePoll {
    Table,
    Id,
}
