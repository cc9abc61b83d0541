//! Daily AQI trend series for one city, up to a year back.

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::models::TrendPoint;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/trends/{city}", get(handler))
}

#[derive(Serialize)]
struct TrendsResponse {
    data: Vec<TrendPoint>,
}

async fn handler(Path(city): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let rows: Result<Vec<TrendPoint>, sqlx::Error> = sqlx::query_as(
        "SELECT date AS time, aqi FROM city_daily WHERE city = ?1 ORDER BY date DESC LIMIT 365",
    )
    .bind(&city)
    .fetch_all(&state.pool)
    .await;

    match rows {
        Ok(mut data) => {
            data.reverse(); // oldest first for the chart
            Json(TrendsResponse { data }).into_response()
        }
        Err(e) => {
            error!("Trends query failed for {}: {}", city, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal Server Error"})),
            )
                .into_response()
        }
    }
}
