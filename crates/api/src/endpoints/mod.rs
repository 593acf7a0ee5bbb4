//! API endpoints.

mod attendance;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().nest("/attendance", attendance::router())
}
