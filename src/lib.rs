//! Library crate for the `ecowatch-aqi` backend service.
//!
//! The service exposes a REST API over the air-quality data of Indian
//! cities: live readings proxied from the WAQI feed, persisted daily and
//! hourly history, a per-city heatmap/stats view, sensor telemetry
//! ingestion from an ESP32-class device, and a 5-day AQI forecast driven
//! by per-city regression artifacts on disk.
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP):
//! domain logic lives in sibling modules (`aqi`, `forecast`, `predictor`,
//! `waqi`), persistence in `schema`, HTTP wiring in the `routes` gateway,
//! and the binary in `main.rs` only orchestrates startup. Everything the
//! binary and the integration tests need is re-exported from here.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;

pub mod aqi;
pub mod config;
pub mod forecast;
pub mod inventory;
pub mod models;
pub mod predictor;
pub mod routes;
pub mod schema;
pub mod waqi;

pub use config::Config;
pub use models::SensorReport;

// ---

/// Shared application state passed to all HTTP handlers.
///
/// Holds the connection pool, the immutable configuration snapshot, one
/// reqwest client (connection reuse, fixed provider timeout) and the
/// single most-recent telemetry report. The telemetry slot is an owned
/// state cell rather than a process global: last-writer-wins, read by the
/// `/api/sensor/latest` handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub http: reqwest::Client,
    pub telemetry: Arc<RwLock<SensorReport>>,
}

impl AppState {
    /// Build the shared state from a connected pool and loaded config.
    ///
    /// The HTTP client carries the provider timeout from the config; a
    /// provider call that exceeds it is treated as a fallback trigger by
    /// the callers, never as a request failure.
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self> {
        // ---
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.waqi_timeout_secs))
            .build()?;

        Ok(Self {
            pool,
            config,
            http,
            telemetry: Arc::new(RwLock::new(SensorReport::default())),
        })
    }
}
