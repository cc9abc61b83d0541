// src/routes/health.rs
//! API liveness endpoint for the EcoWatch backend.
//!
//! This module defines the `/` route the dashboard pings on load to decide
//! whether to render live data or its offline banner. It is a sibling
//! module in the `routes` directory and follows the Explicit Module
//! Boundary Pattern (EMBP):
//! - Internal to this file: endpoint handler(s) and related types
//! - Exports to the gateway (`mod.rs`): a subrouter containing the `/` route
//!
//! The gateway merges this subrouter into the top-level API router so that
//! `main.rs` does not need to know about individual endpoints.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    service: &'static str,
}

/// Handle `GET /`.
///
/// Returns a static JSON object indicating the API is reachable and
/// functioning. This endpoint is deliberately lightweight and does not
/// touch the database or the live provider.
async fn home() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        message: "EcoWatch API Active",
        service: env!("CARGO_PKG_NAME"),
    })
}

/// Create a subrouter containing the `/` route.
///
/// This router is generic over the application state so it can merge
/// cleanly with the gateway router, regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(home))
}
