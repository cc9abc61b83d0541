//! Telemetry endpoints for the on-site ESP32 device.
//!
//! `POST /api/sensor/data` ingests a report into the shared latest-reading
//! slot, `GET /api/sensor/latest` serves the hybrid payload the dashboard
//! gauge renders, and `GET /api/sensor/history` replays recent daily
//! readings for the sensor's home city.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, routing::post, Json,
    Router,
};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error, warn};

use crate::models::TrendPoint;
use crate::waqi;
use crate::{AppState, SensorReport};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/sensor/data", post(receive_data))
        .route("/api/sensor/latest", get(latest))
        .route("/api/sensor/history", get(history))
}

async fn receive_data(
    State(state): State<AppState>,
    Json(report): Json<SensorReport>,
) -> impl IntoResponse {
    // ---
    debug!("POST /api/sensor/data - {:?}", report);

    {
        let mut slot = state
            .telemetry
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = report.clone();
    }

    // History insert is best-effort: the slot is already updated and the
    // device should never see an error for a bookkeeping failure.
    if let Err(e) = store_report(&state.pool, &report).await {
        warn!("Failed to persist sensor report: {}", e);
    }

    Json(json!({"status": "success"}))
}

/// Hybrid payload: telemetry fields from the device slot, AQI overridden
/// by the live reading for the configured sensor city.
#[derive(Serialize)]
struct LatestPayload {
    temperature: f64,
    humidity: f64,
    mq135_raw: i64,
    co2_ppm: f64,
    aqi: i64,
    status: &'static str,
}

async fn latest(State(state): State<AppState>) -> Json<LatestPayload> {
    // ---
    let report = state
        .telemetry
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();

    let live = waqi::fetch_live(&state.http, &state.config, &state.config.sensor_city).await;
    let status = if live.is_some() { "online" } else { "offline" };
    let aqi = live
        .and_then(|reading| reading.aqi_value())
        .map(|v| v.round() as i64)
        .unwrap_or(0);

    Json(LatestPayload {
        temperature: report.temperature,
        humidity: report.humidity,
        mq135_raw: report.mq135_raw,
        co2_ppm: report.co2_ppm,
        aqi,
        status,
    })
}

async fn history(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let rows: Result<Vec<TrendPoint>, sqlx::Error> = sqlx::query_as(
        "SELECT date AS time, aqi FROM city_daily WHERE city = ?1 ORDER BY date DESC LIMIT 24",
    )
    .bind(&state.config.sensor_city)
    .fetch_all(&state.pool)
    .await;

    match rows {
        Ok(mut rows) => {
            rows.reverse(); // oldest first for the chart
            Json(rows).into_response()
        }
        Err(e) => {
            error!("Failed to load sensor history: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal Server Error"})),
            )
                .into_response()
        }
    }
}

// ---

async fn store_report(pool: &SqlitePool, report: &SensorReport) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        "INSERT INTO sensor_history (temperature, humidity, mq135_raw, co2_ppm, aqi)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(report.temperature)
    .bind(report.humidity)
    .bind(report.mq135_raw)
    .bind(report.co2_ppm)
    .bind(report.aqi)
    .execute(pool)
    .await?;

    Ok(())
}
