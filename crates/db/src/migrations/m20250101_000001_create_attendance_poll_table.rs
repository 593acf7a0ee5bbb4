//! Create attendance poll table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AttendancePoll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendancePoll::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttendancePoll::SessionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendancePoll::Code)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendancePoll::CreatedBy)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendancePoll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AttendancePoll::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (session_id, created_at) - latest poll per session
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_poll_session_created")
                    .table(AttendancePoll::Table)
                    .col(AttendancePoll::SessionId)
                    .col(AttendancePoll::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (code, created_at) - redemption lookup by code, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_poll_code_created")
                    .table(AttendancePoll::Table)
                    .col(AttendancePoll::Code)
                    .col(AttendancePoll::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: expires_at (for collecting codes still in cool-down)
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_poll_expires_at")
                    .table(AttendancePoll::Table)
                    .col(AttendancePoll::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AttendancePoll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AttendancePoll {
    Table,
    Id,
    SessionId,
    Code,
    CreatedBy,
    CreatedAt,
    ExpiresAt,
}
