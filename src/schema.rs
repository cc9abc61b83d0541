//! Database schema management for `ecowatch-aqi`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).
//! Optionally seeds synthetic per-city history so a fresh checkout serves
//! meaningful heatmaps, trends and stats without any upstream data.

use anyhow::Result;
use chrono::{Days, Local, Timelike};
use sqlx::SqlitePool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the city reference table, the daily and hourly AQI history
/// tables, and the sensor audit table. Safe to call on every startup;
/// no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Static reference data for the heatmap
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS city_meta (
            city_name TEXT PRIMARY KEY,
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One row per city per day, append-only
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS city_daily (
            id     INTEGER PRIMARY KEY AUTOINCREMENT,
            city   TEXT    NOT NULL,
            date   TEXT    NOT NULL,
            aqi    INTEGER NOT NULL,
            pm2_5  REAL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One row per city per hour, append-only
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS city_hourly (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            city     TEXT    NOT NULL,
            datetime TEXT    NOT NULL,
            aqi      INTEGER NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Best-effort audit trail of ingested telemetry
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_history (
            id          INTEGER  PRIMARY KEY AUTOINCREMENT,
            timestamp   DATETIME DEFAULT CURRENT_TIMESTAMP,
            temperature REAL,
            humidity    REAL,
            mq135_raw   INTEGER,
            co2_ppm     REAL,
            aqi         INTEGER
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for the per-city lookups
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_city_daily_city_date
            ON city_daily (city, date);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_city_hourly_city_datetime
            ON city_hourly (city, datetime);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

// ---

/// Demo cities with coordinates and a characteristic AQI level.
const DEMO_CITIES: &[(&str, f64, f64, i64)] = &[
    ("Delhi", 28.6139, 77.2090, 240),
    ("Mumbai", 19.0760, 72.8777, 150),
    ("Kolkata", 22.5726, 88.3639, 190),
    ("Chennai", 13.0827, 80.2707, 110),
    ("Bengaluru", 12.9716, 77.5946, 90),
    ("Hyderabad", 17.3850, 78.4867, 130),
    ("Ahmedabad", 23.0225, 72.5714, 210),
    ("Pune", 18.5204, 73.8567, 120),
];

/// Hour-of-day AQI offset: traffic peaks in the evening, cleanest air
/// before dawn.
const DIURNAL: [i64; 24] = [
    -8, -12, -16, -18, -20, -22, -18, -10, 0, 8, 12, 10, 6, 4, 2, 6, 14, 22, 30, 26, 18, 8, 0, -6,
];

/// Seed synthetic demo data if the database is empty.
///
/// Inserts the demo city metadata, 30 days of daily readings and 48 hours
/// of hourly readings per city. Skipped entirely when `city_meta` already
/// has rows, so restarts never duplicate history.
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<()> {
    // ---
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM city_meta")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::debug!("city_meta has {} rows, skipping demo seed", existing);
        return Ok(());
    }

    tracing::info!("Empty database detected, seeding demo data");

    let now = Local::now();
    let today = now.date_naive();
    let mut tx = pool.begin().await?;

    for (idx, (city, lat, lng, base)) in DEMO_CITIES.iter().enumerate() {
        sqlx::query("INSERT INTO city_meta (city_name, latitude, longitude) VALUES (?1, ?2, ?3)")
            .bind(city)
            .bind(lat)
            .bind(lng)
            .execute(&mut *tx)
            .await?;

        // 30 days of daily history, a deterministic wobble around the base
        for d in 0..30u64 {
            let date = today - Days::new(d);
            let wobble = ((d as i64 * 13 + idx as i64 * 7) % 41) - 20;
            let aqi = (base + wobble).max(10);
            let pm2_5 = (aqi as f64 * 0.55 * 10.0).round() / 10.0;

            sqlx::query(
                "INSERT INTO city_daily (city, date, aqi, pm2_5) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(city)
            .bind(date.format("%Y-%m-%d").to_string())
            .bind(aqi)
            .bind(pm2_5)
            .execute(&mut *tx)
            .await?;
        }

        // 48 hours of hourly history following the diurnal curve
        for h in 0..48i64 {
            let at = now - chrono::Duration::hours(h);
            let aqi = (base + DIURNAL[at.hour() as usize]).max(10);

            sqlx::query("INSERT INTO city_hourly (city, datetime, aqi) VALUES (?1, ?2, ?3)")
                .bind(city)
                .bind(at.format("%Y-%m-%d %H:00:00").to_string())
                .bind(aqi)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    tracing::info!(
        "Seeded {} cities with 30 days of daily and 48 hours of hourly history",
        DEMO_CITIES.len()
    );
    Ok(())
}
