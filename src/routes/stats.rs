//! Cleanest / most polluted city rankings for the latest recorded day.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::models::CityStat;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/stats", get(handler))
}

#[derive(Serialize)]
struct StatsResponse {
    cleanest: Vec<CityStat>,
    polluted: Vec<CityStat>,
}

async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let rows: Result<Vec<CityStat>, sqlx::Error> = sqlx::query_as(
        "SELECT city, aqi AS avg_aqi FROM city_daily
         WHERE date = (SELECT MAX(date) FROM city_daily)
         ORDER BY aqi ASC",
    )
    .fetch_all(&state.pool)
    .await;

    match rows {
        Ok(rows) => {
            // Both lists come from the same ascending sort: cleanest is
            // the front, polluted the back in descending order. With
            // fewer than ten cities the lists overlap rather than drop
            // anyone.
            let cleanest: Vec<CityStat> = rows.iter().take(5).cloned().collect();
            let polluted: Vec<CityStat> = rows.iter().rev().take(5).cloned().collect();
            Json(StatsResponse { cleanest, polluted }).into_response()
        }
        Err(e) => {
            error!("Stats query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal Server Error"})),
            )
                .into_response()
        }
    }
}
