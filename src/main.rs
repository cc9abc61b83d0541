//! Application entry point for the `ecowatch-aqi` backend service.
//!
//! This binary orchestrates the full startup sequence for the air-quality
//! dashboard API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening the SQLite connection pool (creating the file on first run)
//! - Creating the database schema and seeding demo data if enabled
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `WAQI_TOKEN` (**required**) – API token for the live AQI provider
//! - `DATABASE_URL` (optional) – SQLite URL (default: `sqlite://aqi_data.db`)
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `WAQI_BASE_URL` (optional) – provider base URL override
//! - `WAQI_TIMEOUT_SECS` (optional) – provider request timeout (default: 5)
//! - `MODELS_DIR` (optional) – forecast artifact directory (default: `saved_models`)
//! - `SENSOR_CITY` (optional) – home city of the on-site sensor (default: `Kolkata`)
//! - `DEMO_SEED` (optional) – set to `0`/`false`/`no` to skip demo seeding
//! - `ECOWATCH_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `ECOWATCH_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP) by
//! delegating schema setup to `schema`, configuration parsing to `config`,
//! and route registration to `routes`; everything else lives in the
//! library crate.
use std::{env, net::SocketAddr, str::FromStr};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use ecowatch_aqi::{config, routes, schema, AppState};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to open database: {}", cfg.db_url);

    let options = SqliteConnectOptions::from_str(&cfg.db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect_with(options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database '{}': {}", cfg.db_url, e))?;

    tracing::info!("Successfully opened database");

    schema::create_schema(&pool).await?;
    if cfg.demo_seed {
        schema::seed_demo_data(&pool).await?;
    }

    // Build app from routes gateway (EMBP)
    let state = AppState::new(pool, cfg)?;
    let app: Router = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("EcoWatch API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `ECOWATCH_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `ECOWATCH_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("ECOWATCH_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to ECOWATCH_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ECOWATCH_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
