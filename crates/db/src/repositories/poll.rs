//! Attendance poll repository.

use std::sync::Arc;

use crate::entities::{attendance_poll, AttendancePoll};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Attendance poll repository for database operations.
///
/// Poll rows are insert-only; there is no update path.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<attendance_poll::Model>> {
        AttendancePoll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new poll.
    pub async fn create(
        &self,
        model: attendance_poll::ActiveModel,
    ) -> AppResult<attendance_poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the most recently created poll for a session, regardless of
    /// whether it is still active.
    pub async fn find_latest_by_session(
        &self,
        session_id: &str,
    ) -> AppResult<Option<attendance_poll::Model>> {
        AttendancePoll::find()
            .filter(attendance_poll::Column::SessionId.eq(session_id))
            .order_by_desc(attendance_poll::Column::CreatedAt)
            .order_by_desc(attendance_poll::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Collect codes that may not be reissued yet: every poll whose
    /// `expires_at` lies after the given threshold. Passing `now` yields the
    /// currently active codes; passing `now - cooldown` also holds back
    /// recently expired ones.
    pub async fn find_codes_in_use(
        &self,
        threshold: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Vec<String>> {
        let polls = AttendancePoll::find()
            .filter(attendance_poll::Column::ExpiresAt.gt(threshold))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(polls.into_iter().map(|p| p.code).collect())
    }

    /// Find the most recent issuance of a code as of `now`.
    ///
    /// Codes are recycled once expired, so several historical polls may share
    /// a value; only the newest issuance with `created_at` not after `now`
    /// is ever considered. Generic over the connection so it can run inside
    /// the redemption transaction.
    pub async fn find_latest_by_code<C: ConnectionTrait>(
        conn: &C,
        code: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Option<attendance_poll::Model>> {
        AttendancePoll::find()
            .filter(attendance_poll::Column::Code.eq(code))
            .filter(attendance_poll::Column::CreatedAt.lte(now))
            .order_by_desc(attendance_poll::Column::CreatedAt)
            .order_by_desc(attendance_poll::Column::Id)
            .limit(1)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
