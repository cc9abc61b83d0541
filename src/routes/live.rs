//! Live city reading endpoint.
//!
//! Proxies the provider feed and degrades to the most recent persisted
//! daily row when the provider is down, tagging the payload's `source`
//! field so the dashboard can show where the numbers came from.

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde_json::json;
use tracing::{debug, error};

use crate::waqi;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/live/{city}", get(handler))
}

async fn handler(Path(city): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    if let Some(reading) = waqi::fetch_live(&state.http, &state.config, &city).await {
        return Json(reading).into_response();
    }

    debug!("Provider unavailable for {}, trying persisted data", city);

    let latest: Result<Option<(Option<f64>, i64)>, sqlx::Error> = sqlx::query_as(
        "SELECT pm2_5, aqi FROM city_daily WHERE city = ?1 ORDER BY date DESC LIMIT 1",
    )
    .bind(&city)
    .fetch_optional(&state.pool)
    .await;

    match latest {
        Ok(Some((pm2_5, aqi))) => Json(json!({
            "PM2.5": pm2_5,
            "AQI": aqi,
            "source": "Local DB (Fallback)",
        }))
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "City data not found"})),
        )
            .into_response(),
        Err(e) => {
            error!("Fallback lookup failed for {}: {}", city, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal Server Error"})),
            )
                .into_response()
        }
    }
}
