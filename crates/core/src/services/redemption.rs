//! Code redemption.
//!
//! Converts a submitted code plus student identity into at most one
//! attendance record. Each submission runs as a single transaction: resolve
//! the most recent issuance of the code, check its validity window, insert
//! the record. Duplicate detection is left entirely to the unique
//! (`session_id`, `student_id`) index so that racing submissions, including
//! across server processes, resolve at the storage layer with exactly one
//! winner.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rollcall_common::{AppError, AppResult, AttendanceConfig, IdGenerator};
use rollcall_db::{
    entities::attendance_record,
    repositories::{PollRepository, RecordRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionError, TransactionTrait};

use super::CodeGenerator;

/// Redemption service.
#[derive(Clone)]
pub struct RedemptionService {
    db: Arc<DatabaseConnection>,
    code_gen: CodeGenerator,
    id_gen: IdGenerator,
    config: AttendanceConfig,
}

impl RedemptionService {
    /// Create a new redemption service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: AttendanceConfig) -> Self {
        Self {
            db,
            code_gen: CodeGenerator::from_config(&config),
            id_gen: IdGenerator::new(),
            config,
        }
    }

    /// Redeem a submitted code for a student.
    ///
    /// Outcomes are the typed errors [`AppError::InvalidCode`],
    /// [`AppError::CodeExpired`] and [`AppError::AlreadyMarked`]; storage
    /// failures pass through as [`AppError::Database`] without retry. A code
    /// that is not exactly the configured number of digits is rejected
    /// before any storage access.
    pub async fn redeem(
        &self,
        code: &str,
        student_id: &str,
    ) -> AppResult<attendance_record::Model> {
        if !self.code_gen.is_well_formed(code) {
            tracing::debug!(student_id = %student_id, "Rejected malformed attendance code");
            return Err(AppError::InvalidCode);
        }

        let code = code.to_string();
        let student = student_id.to_string();
        let record_id = self.id_gen.generate();
        let grace = Duration::seconds(self.config.grace_seconds);

        let record = self
            .db
            .transaction::<_, attendance_record::Model, AppError>(move |txn| {
                Box::pin(async move {
                    // One time snapshot for the lookup, the expiry check and
                    // the record timestamp.
                    let now = Utc::now();

                    // Codes are recycled after expiry; only the newest
                    // issuance of this value as of now counts. An older poll
                    // with the same code is never considered.
                    let Some(poll) =
                        PollRepository::find_latest_by_code(txn, &code, now).await?
                    else {
                        return Err(AppError::InvalidCode);
                    };

                    if now >= poll.expires_at + grace {
                        return Err(AppError::CodeExpired);
                    }

                    let model = attendance_record::ActiveModel {
                        id: Set(record_id),
                        session_id: Set(poll.session_id.clone()),
                        student_id: Set(student),
                        poll_id: Set(poll.id.clone()),
                        marked_at: Set(now.into()),
                    };

                    // The constrained insert is the sole arbiter of
                    // "already redeemed".
                    RecordRepository::insert_if_absent(txn, model).await
                })
            })
            .await
            .map_err(flatten_txn_err)?;

        tracing::info!(
            record_id = %record.id,
            session_id = %record.session_id,
            poll_id = %record.poll_id,
            "Attendance recorded"
        );

        Ok(record)
    }
}

fn flatten_txn_err(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(e) => AppError::Database(e.to_string()),
        TransactionError::Transaction(e) => e,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rollcall_db::entities::attendance_poll;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: sea_orm::DatabaseConnection) -> RedemptionService {
        RedemptionService::new(Arc::new(db), AttendanceConfig::default())
    }

    fn poll_expiring_at(expires_at: DateTime<Utc>) -> attendance_poll::Model {
        attendance_poll::Model {
            id: "p1".to_string(),
            session_id: "s1".to_string(),
            code: "48213097".to_string(),
            created_by: "prof1".to_string(),
            created_at: (expires_at - Duration::minutes(10)).into(),
            expires_at: expires_at.into(),
        }
    }

    fn record_for(poll: &attendance_poll::Model, student_id: &str) -> attendance_record::Model {
        attendance_record::Model {
            id: "r1".to_string(),
            session_id: poll.session_id.clone(),
            student_id: student_id.to_string(),
            poll_id: poll.id.clone(),
            marked_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_malformed_code_rejected_before_storage() {
        // Nothing is appended to the mock: any query would fail the test.
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        for bad in ["1234", "123456789", "4821309a", "", "4821 097"] {
            let result = svc.redeem(bad, "stu1").await;
            assert!(
                matches!(result, Err(AppError::InvalidCode)),
                "code {bad:?} must be rejected as invalid"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_code_is_invalid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attendance_poll::Model>::new()])
            .into_connection();

        let svc = service(db);
        let result = svc.redeem("48213097", "stu1").await;

        assert!(matches!(result, Err(AppError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_expired_latest_issuance_is_code_expired() {
        // The newest issuance of the code expired a minute ago. The engine
        // reports expiry rather than falling through to any older poll.
        let poll = poll_expiring_at(Utc::now() - Duration::minutes(1));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[poll]])
            .into_connection();

        let svc = service(db);
        let result = svc.redeem("48213097", "stu1").await;

        assert!(matches!(result, Err(AppError::CodeExpired)));
    }

    #[tokio::test]
    async fn test_expiry_boundary_is_exact_by_default() {
        // Default grace is zero: a poll whose window closed this instant is
        // already expired.
        let poll = poll_expiring_at(Utc::now());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[poll]])
            .into_connection();

        let svc = service(db);
        let result = svc.redeem("48213097", "stu1").await;

        assert!(matches!(result, Err(AppError::CodeExpired)));
    }

    #[tokio::test]
    async fn test_valid_code_produces_record() {
        let poll = poll_expiring_at(Utc::now() + Duration::minutes(5));
        let record = record_for(&poll, "stu1");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[poll]])
            .append_query_results([[record]])
            .into_connection();

        let svc = service(db);
        let result = svc.redeem("48213097", "stu1").await.unwrap();

        assert_eq!(result.session_id, "s1");
        assert_eq!(result.poll_id, "p1");
        assert_eq!(result.student_id, "stu1");
    }

    #[tokio::test]
    async fn test_configured_grace_extends_window() {
        let config = AttendanceConfig {
            grace_seconds: 30,
            ..AttendanceConfig::default()
        };

        let poll = poll_expiring_at(Utc::now() - Duration::seconds(10));
        let record = record_for(&poll, "stu1");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[poll]])
            .append_query_results([[record]])
            .into_connection();

        let svc = RedemptionService::new(Arc::new(db), config);
        let result = svc.redeem("48213097", "stu1").await;

        assert!(result.is_ok());
    }
}
