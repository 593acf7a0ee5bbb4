//! HTTP API layer for rollcall.
//!
//! This crate exposes the attendance endpoints over Axum 0.8:
//!
//! - **Endpoints**: poll issuance, status and code redemption
//! - **Extractors**: upstream-authenticated actor identity
//! - **Middleware**: identity propagation, app state
//!
//! The core services never see HTTP types; response shaping lives entirely
//! in this crate.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
