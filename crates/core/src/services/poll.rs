//! Attendance poll lifecycle.
//!
//! The only component that creates polls or answers poll-status queries.
//! Polls are immutable once issued; "active" is always derived from
//! `expires_at` against the current clock, never stored, so readers cannot
//! disagree with a stale flag.

use chrono::{DateTime, Duration, Utc};
use rollcall_common::{AppError, AppResult, AttendanceConfig, IdGenerator};
use rollcall_db::{
    entities::{attendance_poll, attendance_record},
    repositories::{PollRepository, RecordRepository},
};
use sea_orm::Set;

use super::CodeGenerator;

/// Poll service for issuance and status queries.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    record_repo: RecordRepository,
    code_gen: CodeGenerator,
    id_gen: IdGenerator,
    config: AttendanceConfig,
}

/// A poll together with its derived status.
pub struct PollStatus {
    pub poll: attendance_poll::Model,
    pub is_active: bool,
    /// Students marked present for the poll's session so far.
    pub attendee_count: u64,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub fn new(
        poll_repo: PollRepository,
        record_repo: RecordRepository,
        config: AttendanceConfig,
    ) -> Self {
        Self {
            poll_repo,
            record_repo,
            code_gen: CodeGenerator::from_config(&config),
            id_gen: IdGenerator::new(),
            config,
        }
    }

    /// Issue a new attendance poll for a session.
    ///
    /// Prior polls for the session are left untouched; a professor restarting
    /// attendance simply issues a newer poll, and code lookup resolves to the
    /// most recent issuance. Authorization of the issuer happens upstream.
    pub async fn create_poll(
        &self,
        session_id: &str,
        duration_minutes: Option<i64>,
        issuer_id: &str,
    ) -> AppResult<attendance_poll::Model> {
        let duration = Self::validated_duration(duration_minutes, self.config.max_duration_minutes)?;

        let now = Utc::now();

        // Codes stay reserved through a cool-down past expiry so a recycled
        // value cannot be confused with a recent issuance.
        let threshold = now - Duration::minutes(self.config.reuse_cooldown_minutes());
        let in_use = self
            .poll_repo
            .find_codes_in_use(threshold)
            .await?
            .into_iter()
            .collect();

        let code = self.code_gen.generate(&in_use)?;
        let model = self.build_poll(session_id, issuer_id, &code, duration, now);

        let poll = self.poll_repo.create(model).await?;

        tracing::info!(
            poll_id = %poll.id,
            session_id = %poll.session_id,
            expires_at = %poll.expires_at,
            "Issued attendance poll"
        );

        Ok(poll)
    }

    /// Get the most recently created poll for a session, expired or not.
    pub async fn latest_poll(
        &self,
        session_id: &str,
    ) -> AppResult<Option<attendance_poll::Model>> {
        self.poll_repo.find_latest_by_session(session_id).await
    }

    /// Get the latest poll for a session together with derived status.
    pub async fn latest_poll_status(&self, session_id: &str) -> AppResult<Option<PollStatus>> {
        let Some(poll) = self.poll_repo.find_latest_by_session(session_id).await? else {
            return Ok(None);
        };

        let attendee_count = self.record_repo.count_for_session(session_id).await?;
        let is_active = Self::is_active(&poll);

        Ok(Some(PollStatus {
            poll,
            is_active,
            attendee_count,
        }))
    }

    /// List the records one poll's redemptions produced.
    pub async fn poll_records(
        &self,
        poll_id: &str,
    ) -> AppResult<Vec<attendance_record::Model>> {
        if self.poll_repo.find_by_id(poll_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Poll not found: {poll_id}")));
        }
        self.record_repo.find_by_poll(poll_id).await
    }

    /// Look up a student's attendance record for a session, if any.
    pub async fn student_record(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> AppResult<Option<attendance_record::Model>> {
        self.record_repo
            .find_by_session_and_student(session_id, student_id)
            .await
    }

    /// Whether a poll is active right now.
    #[must_use]
    pub fn is_active(poll: &attendance_poll::Model) -> bool {
        Self::is_active_at(poll, Utc::now())
    }

    /// Whether a poll is active at the given instant: strictly before
    /// `expires_at`. At the boundary the poll is already expired.
    #[must_use]
    pub fn is_active_at(poll: &attendance_poll::Model, now: DateTime<Utc>) -> bool {
        now < poll.expires_at
    }

    fn validated_duration(duration_minutes: Option<i64>, max: i64) -> AppResult<i64> {
        let Some(duration) = duration_minutes else {
            return Err(AppError::DurationOutOfRange(
                "a duration in minutes is required".to_string(),
            ));
        };
        if duration <= 0 {
            return Err(AppError::DurationOutOfRange(format!(
                "{duration} is not a positive number of minutes"
            )));
        }
        if duration > max {
            return Err(AppError::DurationOutOfRange(format!(
                "{duration} exceeds the maximum of {max} minutes"
            )));
        }
        Ok(duration)
    }

    fn build_poll(
        &self,
        session_id: &str,
        issuer_id: &str,
        code: &str,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> attendance_poll::ActiveModel {
        attendance_poll::ActiveModel {
            id: Set(self.id_gen.generate()),
            session_id: Set(session_id.to_string()),
            code: Set(code.to_string()),
            created_by: Set(issuer_id.to_string()),
            created_at: Set(now.into()),
            expires_at: Set((now + Duration::minutes(duration_minutes)).into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{ActiveValue, DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: sea_orm::DatabaseConnection) -> PollService {
        let db = Arc::new(db);
        PollService::new(
            PollRepository::new(Arc::clone(&db)),
            RecordRepository::new(db),
            AttendanceConfig::default(),
        )
    }

    fn mock_poll(expires_at: DateTime<Utc>) -> attendance_poll::Model {
        attendance_poll::Model {
            id: "p1".to_string(),
            session_id: "s1".to_string(),
            code: "48213097".to_string(),
            created_by: "prof1".to_string(),
            created_at: (expires_at - Duration::minutes(10)).into(),
            expires_at: expires_at.into(),
        }
    }

    #[tokio::test]
    async fn test_create_poll_rejects_missing_duration() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc.create_poll("s1", None, "prof1").await;
        assert!(matches!(result, Err(AppError::DurationOutOfRange(_))));
    }

    #[tokio::test]
    async fn test_create_poll_rejects_non_positive_duration() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        for bad in [0, -5] {
            let result = svc.create_poll("s1", Some(bad), "prof1").await;
            assert!(
                matches!(result, Err(AppError::DurationOutOfRange(_))),
                "duration {bad} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_create_poll_rejects_excessive_duration() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc.create_poll("s1", Some(10_000), "prof1").await;
        assert!(matches!(result, Err(AppError::DurationOutOfRange(_))));
    }

    #[tokio::test]
    async fn test_create_poll_persists_new_code() {
        let now = Utc::now();
        let issued = mock_poll(now + Duration::minutes(45));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // No codes currently in use
            .append_query_results([Vec::<attendance_poll::Model>::new()])
            // Insert returns the stored row
            .append_query_results([[issued.clone()]])
            .into_connection();

        let svc = service(db);
        let poll = svc.create_poll("s1", Some(45), "prof1").await.unwrap();

        assert_eq!(poll.id, "p1");
        assert_eq!(poll.session_id, "s1");
    }

    #[test]
    fn test_build_poll_computes_exact_expiry() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let now = Utc::now();

        let model = svc.build_poll("s1", "prof1", "48213097", 45, now);

        let created_at = match model.created_at {
            ActiveValue::Set(v) => v,
            _ => unreachable!(),
        };
        let expires_at = match model.expires_at {
            ActiveValue::Set(v) => v,
            _ => unreachable!(),
        };
        assert_eq!(expires_at - created_at, Duration::minutes(45));
    }

    #[tokio::test]
    async fn test_latest_poll_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attendance_poll::Model>::new()])
            .into_connection();

        let svc = service(db);
        assert!(svc.latest_poll("s1").await.unwrap().is_none());
    }

    #[test]
    fn test_is_active_strictly_before_expiry() {
        let expires_at = Utc::now() + Duration::minutes(5);
        let poll = mock_poll(expires_at);

        assert!(PollService::is_active_at(&poll, expires_at - Duration::milliseconds(1)));
        // The boundary itself is expired: no grace unless configured
        assert!(!PollService::is_active_at(&poll, expires_at));
        assert!(!PollService::is_active_at(&poll, expires_at + Duration::seconds(1)));
    }
}
