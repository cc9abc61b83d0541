use axum::Router;
use tower_http::cors::CorsLayer;

use crate::AppState;

mod analysis;
mod health;
mod heatmap;
mod live;
mod predict;
mod sensor;
mod stats;
mod trends;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(health::router())
        .merge(sensor::router())
        .merge(live::router())
        .merge(heatmap::router())
        .merge(stats::router())
        .merge(trends::router())
        .merge(predict::router())
        .merge(analysis::router())
        // The dashboard is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
