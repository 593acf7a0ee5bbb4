//! Attendance endpoints.

use axum::{extract::State, routing::post, Json, Router};
use rollcall_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::ActorId, middleware::AppState, response::ApiResponse};

/// Issued poll response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub poll_id: String,
    pub session_id: String,
    pub code: String,
    pub created_at: String,
    pub expires_at: String,
}

/// Poll status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatusResponse {
    pub poll_id: String,
    pub session_id: String,
    pub code: String,
    pub created_at: String,
    pub expires_at: String,
    pub is_active: bool,
    pub attendee_count: u64,
}

/// Attendance record response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub record_id: String,
    pub session_id: String,
    pub student_id: String,
    pub poll_id: String,
    pub marked_at: String,
}

/// Create poll request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    #[validate(length(min = 1, max = 32))]
    pub session_id: String,
    /// Validity window in minutes. Falls back to the configured default
    /// when omitted.
    pub duration_minutes: Option<i64>,
}

/// Issue a new attendance poll.
async fn create_poll(
    ActorId(issuer_id): ActorId,
    State(state): State<AppState>,
    Json(req): Json<CreatePollRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    req.validate()?;

    let duration = req
        .duration_minutes
        .or(Some(state.attendance.default_duration_minutes));

    let poll = state
        .poll_service
        .create_poll(&req.session_id, duration, &issuer_id)
        .await?;

    Ok(ApiResponse::ok(PollResponse {
        poll_id: poll.id,
        session_id: poll.session_id,
        code: poll.code,
        created_at: poll.created_at.to_rfc3339(),
        expires_at: poll.expires_at.to_rfc3339(),
    }))
}

/// Latest poll request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LatestPollRequest {
    #[validate(length(min = 1, max = 32))]
    pub session_id: String,
}

/// Get the latest poll for a session with derived status.
async fn latest_poll(
    ActorId(_actor_id): ActorId,
    State(state): State<AppState>,
    Json(req): Json<LatestPollRequest>,
) -> AppResult<ApiResponse<PollStatusResponse>> {
    req.validate()?;

    let status = state
        .poll_service
        .latest_poll_status(&req.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No poll for session: {}", req.session_id)))?;

    Ok(ApiResponse::ok(PollStatusResponse {
        poll_id: status.poll.id,
        session_id: status.poll.session_id,
        code: status.poll.code,
        created_at: status.poll.created_at.to_rfc3339(),
        expires_at: status.poll.expires_at.to_rfc3339(),
        is_active: status.is_active,
        attendee_count: status.attendee_count,
    }))
}

/// Redeem request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

/// Redemption response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub session_id: String,
    pub marked_at: String,
}

/// Redeem an attendance code for the calling student.
async fn redeem(
    ActorId(student_id): ActorId,
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> AppResult<ApiResponse<RedeemResponse>> {
    req.validate()?;

    let record = state
        .redemption_service
        .redeem(&req.code, &student_id)
        .await?;

    Ok(ApiResponse::ok(RedeemResponse {
        session_id: record.session_id,
        marked_at: record.marked_at.to_rfc3339(),
    }))
}

/// Poll records request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PollRecordsRequest {
    #[validate(length(min = 1, max = 32))]
    pub poll_id: String,
}

/// List the records a poll's redemptions produced.
async fn poll_records(
    ActorId(_actor_id): ActorId,
    State(state): State<AppState>,
    Json(req): Json<PollRecordsRequest>,
) -> AppResult<ApiResponse<Vec<RecordResponse>>> {
    req.validate()?;

    let records = state.poll_service.poll_records(&req.poll_id).await?;

    Ok(ApiResponse::ok(
        records
            .into_iter()
            .map(|r| RecordResponse {
                record_id: r.id,
                session_id: r.session_id,
                student_id: r.student_id,
                poll_id: r.poll_id,
                marked_at: r.marked_at.to_rfc3339(),
            })
            .collect(),
    ))
}

/// Own attendance request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MyRecordRequest {
    #[validate(length(min = 1, max = 32))]
    pub session_id: String,
}

/// Own attendance response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRecordResponse {
    pub marked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_at: Option<String>,
}

/// Whether the calling student is marked present for a session.
async fn my_record(
    ActorId(student_id): ActorId,
    State(state): State<AppState>,
    Json(req): Json<MyRecordRequest>,
) -> AppResult<ApiResponse<MyRecordResponse>> {
    req.validate()?;

    let record = state
        .poll_service
        .student_record(&req.session_id, &student_id)
        .await?;

    Ok(ApiResponse::ok(MyRecordResponse {
        marked: record.is_some(),
        marked_at: record.map(|r| r.marked_at.to_rfc3339()),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/polls/create", post(create_poll))
        .route("/polls/latest", post(latest_poll))
        .route("/polls/records", post(poll_records))
        .route("/redeem", post(redeem))
        .route("/records/me", post(my_record))
}
