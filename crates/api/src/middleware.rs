//! API middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use rollcall_common::AttendanceConfig;
use rollcall_core::{PollService, RedemptionService};

use crate::extractors::Actor;

/// Header carrying the caller identity established by the upstream auth
/// layer.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub poll_service: PollService,
    pub redemption_service: RedemptionService,
    pub attendance: AttendanceConfig,
}

/// Identity middleware.
///
/// Copies the upstream-authenticated actor id into request extensions for
/// the [`crate::extractors::ActorId`] extractor. No credential check happens
/// here; authentication and class-level authorization are enforced before
/// requests reach this service.
pub async fn identity_middleware(mut req: Request<Body>, next: Next) -> Response {
    let actor = req
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|header| header.to_str().ok())
        .filter(|actor_id| !actor_id.is_empty())
        .map(ToString::to_string);
    if let Some(actor_id) = actor {
        req.extensions_mut().insert(Actor(actor_id));
    }

    next.run(req).await
}
