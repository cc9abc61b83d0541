//! Hourly pollution pattern analysis for one city.
//!
//! Averages the hourly history per hour-of-day and reports the best and
//! worst times to be outside. Cities without hourly data get a synthetic
//! default curve so the chart never renders empty.

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::models::HourlyPoint;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/analysis/hourly/{city}", get(handler))
}

#[derive(Serialize)]
struct AnalysisResponse {
    hourly_curve: Vec<HourlyPoint>,
    best_time: HourlyPoint,
    worst_time: HourlyPoint,
}

async fn handler(Path(city): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    // Exact city match. "Delhi" must not absorb the hourly history of
    // "New Delhi" the way a substring match would.
    let rows: Result<Vec<HourlyPoint>, sqlx::Error> = sqlx::query_as(
        "SELECT strftime('%H', datetime) AS hour,
                CAST(ROUND(AVG(aqi)) AS INTEGER) AS avg_aqi
         FROM city_hourly
         WHERE city = ?1
         GROUP BY hour
         ORDER BY hour ASC",
    )
    .bind(&city)
    .fetch_all(&state.pool)
    .await;

    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => {
            error!("Hourly analysis query failed for {}: {}", city, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal Server Error"})),
            )
                .into_response();
        }
    };

    if rows.is_empty() {
        debug!("No hourly history for {}, serving default curve", city);
        return Json(default_curve()).into_response();
    }

    let best_time = rows
        .iter()
        .min_by_key(|p| p.avg_aqi)
        .cloned()
        .unwrap_or_else(|| rows[0].clone());
    let worst_time = rows
        .iter()
        .max_by_key(|p| p.avg_aqi)
        .cloned()
        .unwrap_or_else(|| rows[0].clone());

    Json(AnalysisResponse {
        hourly_curve: rows,
        best_time,
        worst_time,
    })
    .into_response()
}

/// Placeholder curve for cities with no hourly history: a flat average
/// with the conventional morning-best/evening-worst hint.
fn default_curve() -> AnalysisResponse {
    // ---
    AnalysisResponse {
        hourly_curve: (0..24)
            .map(|hour| HourlyPoint {
                hour: format!("{hour:02}"),
                avg_aqi: 100,
            })
            .collect(),
        best_time: HourlyPoint {
            hour: "06".to_string(),
            avg_aqi: 80,
        },
        worst_time: HourlyPoint {
            hour: "18".to_string(),
            avg_aqi: 150,
        },
    }
}
