//! Five-day forecast endpoint.
//!
//! Thin HTTP shell over the forecast resolver: resolve the current AQI
//! through the fallback chain, load the city's regression artifact if one
//! exists, run inference (or the flat fallback) and serve the result. The
//! handler is infallible; every degraded path still produces a forecast.

use axum::{extract::Path, extract::State, routing::get, Json, Router};
use chrono::Local;
use tracing::{debug, info};

use crate::forecast::{self, Forecast};
use crate::predictor::{self, Predictor};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/predict/{city}", get(handler))
}

async fn handler(Path(city): Path<String>, State(state): State<AppState>) -> Json<Forecast> {
    // ---
    info!("GET /api/predict/{} - resolving current AQI", city);

    let current = forecast::resolve_current(&state.http, &state.config, &state.pool, &city).await;
    debug!(
        "Current AQI for {}: {} (origin {:?})",
        city, current.value, current.origin
    );

    let artifact = predictor::load_for_city(&state.config.models_dir, &city);
    let today = Local::now().date_naive();

    let result = forecast::run_forecast(
        current.value,
        today,
        artifact.as_ref().map(|model| model as &dyn Predictor),
    );
    info!(
        "Forecast for {} served from {:?} source",
        city, result.source
    );

    Json(result)
}
