//! Heatmap endpoint: one cell per known city with its latest AQI.
//!
//! The map view tolerates an empty array but not an error page, so any
//! database failure here degrades to `[]`.

use axum::{extract::State, routing::get, Json, Router};
use tracing::error;

use crate::models::{HeatmapCell, HeatmapRow};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/heatmap", get(handler))
}

async fn handler(State(state): State<AppState>) -> Json<Vec<HeatmapCell>> {
    // ---
    let rows: Result<Vec<HeatmapRow>, sqlx::Error> = sqlx::query_as(
        "SELECT m.city_name,
                m.latitude AS lat,
                m.longitude AS lng,
                (SELECT aqi FROM city_daily
                 WHERE city = m.city_name
                 ORDER BY date DESC LIMIT 1) AS avg_aqi
         FROM city_meta m",
    )
    .fetch_all(&state.pool)
    .await;

    match rows {
        Ok(rows) => Json(rows.into_iter().map(HeatmapCell::from).collect()),
        Err(e) => {
            error!("Heatmap query failed: {}", e);
            Json(Vec::new())
        }
    }
}
