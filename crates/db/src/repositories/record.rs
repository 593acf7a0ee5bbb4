//! Attendance record repository.

use std::sync::Arc;

use crate::entities::{attendance_record, AttendanceRecord};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr,
};

/// Attendance record repository for database operations.
///
/// Records are append-only; they are never updated or deleted here.
#[derive(Clone)]
pub struct RecordRepository {
    db: Arc<DatabaseConnection>,
}

impl RecordRepository {
    /// Create a new record repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the record for a student in a session.
    pub async fn find_by_session_and_student(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> AppResult<Option<attendance_record::Model>> {
        AttendanceRecord::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the records produced by one poll.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<attendance_record::Model>> {
        AttendanceRecord::find()
            .filter(attendance_record::Column::PollId.eq(poll_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count attendees marked present for a session.
    pub async fn count_for_session(&self, session_id: &str) -> AppResult<u64> {
        AttendanceRecord::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a record, relying on the unique (`session_id`, `student_id`)
    /// index to arbitrate duplicates.
    ///
    /// A conflicting insert surfaces as [`AppError::AlreadyMarked`]; any
    /// other database failure is passed through unmodified. There is
    /// deliberately no existence pre-check: whichever concurrent submission
    /// reaches the index first wins, the rest fail deterministically.
    pub async fn insert_if_absent<C: ConnectionTrait>(
        conn: &C,
        model: attendance_record::ActiveModel,
    ) -> AppResult<attendance_record::Model> {
        match model.insert(conn).await {
            Ok(record) => Ok(record),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::AlreadyMarked),
                _ => Err(AppError::Database(err.to_string())),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_record(id: &str, session_id: &str, student_id: &str) -> attendance_record::Model {
        attendance_record::Model {
            id: id.to_string(),
            session_id: session_id.to_string(),
            student_id: student_id.to_string(),
            poll_id: "p1".to_string(),
            marked_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_session_and_student_found() {
        let record = test_record("r1", "s1", "stu1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[record.clone()]])
                .into_connection(),
        );

        let repo = RecordRepository::new(db);
        let result = repo
            .find_by_session_and_student("s1", "stu1")
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().poll_id, "p1");
    }

    #[tokio::test]
    async fn test_find_by_session_and_student_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<attendance_record::Model>::new()])
                .into_connection(),
        );

        let repo = RecordRepository::new(db);
        let result = repo
            .find_by_session_and_student("s1", "stu2")
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_insert_if_absent_success() {
        let record = test_record("r1", "s1", "stu1");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[record.clone()]])
            .into_connection();

        let model = attendance_record::ActiveModel {
            id: sea_orm::Set("r1".to_string()),
            session_id: sea_orm::Set("s1".to_string()),
            student_id: sea_orm::Set("stu1".to_string()),
            poll_id: sea_orm::Set("p1".to_string()),
            marked_at: sea_orm::Set(record.marked_at),
        };

        let inserted = RecordRepository::insert_if_absent(&db, model).await.unwrap();
        assert_eq!(inserted.id, "r1");
    }

    #[tokio::test]
    async fn test_find_by_poll() {
        let r1 = test_record("r1", "s1", "stu1");
        let r2 = test_record("r2", "s1", "stu2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = RecordRepository::new(db);
        let result = repo.find_by_poll("p1").await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
