//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

/// Identity of the caller, as established by the upstream auth layer.
///
/// The value arrives pre-authenticated; this service performs no credential
/// verification of its own.
#[derive(Debug, Clone)]
pub struct Actor(pub String);

/// Authenticated actor extractor.
#[derive(Debug, Clone)]
pub struct ActorId(pub String);

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the identity middleware from the upstream auth header
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(|actor| Self(actor.0))
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}
