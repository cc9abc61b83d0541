use std::path::PathBuf;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

use ecowatch_aqi::{routes, schema, AppState, Config};

// ---

/// One API instance on an ephemeral port, backed by a throwaway SQLite
/// file.
struct TestApp {
    base: String,
    pool: SqlitePool,
    models_dir: PathBuf,
    _dir: TempDir,
}

/// Spawn the API with the provider pointed at a closed local port, so
/// every live-fetch attempt fails fast and the fallback paths stay
/// deterministic.
async fn spawn_app(seed: bool) -> Result<TestApp> {
    // ---
    spawn_app_with_provider(seed, "http://127.0.0.1:9".to_string()).await
}

async fn spawn_app_with_provider(seed: bool, waqi_base_url: String) -> Result<TestApp> {
    // ---
    let dir = TempDir::new()?;
    let db_path = dir.path().join("test.db");
    let models_dir = dir.path().join("models");
    std::fs::create_dir(&models_dir)?;

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    schema::create_schema(&pool).await?;
    if seed {
        schema::seed_demo_data(&pool).await?;
    }

    let config = Config {
        db_url: format!("sqlite://{}", db_path.display()),
        db_pool_max: 5,
        waqi_base_url,
        waqi_token: "test-token".to_string(),
        waqi_timeout_secs: 1,
        models_dir: models_dir.clone(),
        sensor_city: "Kolkata".to_string(),
        demo_seed: seed,
    };

    let state = AppState::new(pool.clone(), config)?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok(TestApp {
        base: format!("http://{}", addr),
        pool,
        models_dir,
        _dir: dir,
    })
}

/// Serve one canned WAQI feed body for every city on an ephemeral port.
async fn spawn_provider_stub(body: Value) -> Result<String> {
    // ---
    let app = axum::Router::new().route(
        "/feed/{city}/",
        axum::routing::get(move || {
            let body = body.clone();
            async move { axum::Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(format!("http://{}", addr))
}

// ---

#[tokio::test]
async fn home_reports_service_online() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;
    let body: Value = Client::new()
        .get(format!("{}/", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], json!("online"));
    assert_eq!(body["message"], json!("EcoWatch API Active"));
    Ok(())
}

#[tokio::test]
async fn sensor_ingestion_roundtrip() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;
    let client = Client::new();

    let report = json!({
        "temperature": 25.5,
        "humidity": 60.0,
        "mq135_raw": 512,
        "co2_ppm": 450.2,
        "aqi": 85
    });
    let ack: Value = client
        .post(format!("{}/api/sensor/data", app.base))
        .json(&report)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ack["status"], json!("success"));

    // The report lands in the persistent history as well.
    let persisted: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensor_history")
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(persisted, 1);

    // Hybrid payload: device fields from the slot, AQI forced from the
    // live feed, which is down here, so it reads 0 / offline.
    let latest: Value = client
        .get(format!("{}/api/sensor/latest", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(latest["temperature"], json!(25.5));
    assert_eq!(latest["co2_ppm"], json!(450.2));
    assert_eq!(latest["mq135_raw"], json!(512));
    assert_eq!(latest["aqi"], json!(0));
    assert_eq!(latest["status"], json!("offline"));
    Ok(())
}

#[tokio::test]
async fn sensor_latest_goes_online_when_provider_answers() -> Result<()> {
    // ---
    let provider = spawn_provider_stub(json!({
        "status": "ok",
        "data": {"aqi": 222, "iaqi": {"pm25": {"v": 120.0}, "t": {"v": 31.0}, "h": {"v": 65.0}}}
    }))
    .await?;
    let app = spawn_app_with_provider(false, provider).await?;
    let client = Client::new();

    client
        .post(format!("{}/api/sensor/data", app.base))
        .json(&json!({
            "temperature": 25.5,
            "humidity": 60.0,
            "mq135_raw": 512,
            "co2_ppm": 450.2,
            "aqi": 85
        }))
        .send()
        .await?;

    let latest: Value = client
        .get(format!("{}/api/sensor/latest", app.base))
        .send()
        .await?
        .json()
        .await?;

    // Device fields still come from the slot; the AQI is the live one.
    assert_eq!(latest["status"], json!("online"));
    assert_eq!(latest["aqi"], json!(222));
    assert_eq!(latest["temperature"], json!(25.5));
    Ok(())
}

#[tokio::test]
async fn sensor_history_replays_home_city() -> Result<()> {
    // ---
    let app = spawn_app(true).await?;
    let series: Vec<Value> = Client::new()
        .get(format!("{}/api/sensor/history", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(series.len(), 24);
    for pair in series.windows(2) {
        assert!(
            pair[0]["time"].as_str() <= pair[1]["time"].as_str(),
            "history must be oldest-first"
        );
    }
    assert!(series[0]["aqi"].as_i64().unwrap() > 0);
    Ok(())
}

#[tokio::test]
async fn live_endpoint_falls_back_to_database() -> Result<()> {
    // ---
    let app = spawn_app(true).await?;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/live/Delhi", app.base))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert!(body["AQI"].as_i64().unwrap() > 0);
    assert!(body["PM2.5"].is_number());
    assert_eq!(body["source"], json!("Local DB (Fallback)"));

    let missing = client
        .get(format!("{}/api/live/Gotham", app.base))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await?;
    assert_eq!(body["detail"], json!("City data not found"));
    Ok(())
}

#[tokio::test]
async fn live_endpoint_prefers_provider_over_database() -> Result<()> {
    // ---
    let provider = spawn_provider_stub(json!({
        "status": "ok",
        "data": {"aqi": 222, "iaqi": {"pm25": {"v": 120.5}, "t": {"v": 31.0}, "h": {"v": 65.0}}}
    }))
    .await?;
    // Seeded, so Delhi has persisted rows the provider must win over.
    let app = spawn_app_with_provider(true, provider).await?;

    let body: Value = Client::new()
        .get(format!("{}/api/live/Delhi", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["AQI"], json!(222));
    assert_eq!(body["PM2.5"], json!(120.5));
    assert_eq!(body["source"], json!("WAQI API"));
    Ok(())
}

#[tokio::test]
async fn heatmap_serves_every_city() -> Result<()> {
    // ---
    let app = spawn_app(true).await?;

    // A city with metadata but no readings must still appear, with 0.
    sqlx::query(
        "INSERT INTO city_meta (city_name, latitude, longitude) VALUES ('Shimla', 31.1, 77.17)",
    )
    .execute(&app.pool)
    .await?;

    let cells: Vec<Value> = Client::new()
        .get(format!("{}/api/heatmap", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(cells.len(), 9);
    let shimla = cells
        .iter()
        .find(|c| c["city_name"] == json!("Shimla"))
        .unwrap();
    assert_eq!(shimla["avg_aqi"], json!(0));

    let delhi = cells
        .iter()
        .find(|c| c["city_name"] == json!("Delhi"))
        .unwrap();
    assert!(delhi["avg_aqi"].as_i64().unwrap() > 0);
    assert!(delhi["lat"].is_number() && delhi["lng"].is_number());
    Ok(())
}

#[tokio::test]
async fn stats_with_few_cities_overlaps_without_dropping() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;

    for (city, aqi) in [("Aurangabad", 50), ("Bhopal", 100), ("Cuttack", 150)] {
        sqlx::query(
            "INSERT INTO city_daily (city, date, aqi, pm2_5) VALUES (?1, '2024-05-01', ?2, 40.0)",
        )
        .bind(city)
        .bind(aqi)
        .execute(&app.pool)
        .await?;
    }

    let body: Value = Client::new()
        .get(format!("{}/api/stats", app.base))
        .send()
        .await?
        .json()
        .await?;

    let cleanest = body["cleanest"].as_array().unwrap();
    let polluted = body["polluted"].as_array().unwrap();

    // Three cities feed both lists: ascending on one side, descending on
    // the other, nobody dropped.
    assert_eq!(cleanest.len(), 3);
    assert_eq!(polluted.len(), 3);
    assert_eq!(cleanest[0]["city"], json!("Aurangabad"));
    assert_eq!(cleanest[0]["avg_aqi"], json!(50));
    assert_eq!(polluted[0]["city"], json!("Cuttack"));
    assert_eq!(polluted[0]["avg_aqi"], json!(150));
    Ok(())
}

#[tokio::test]
async fn trends_returns_chronological_series() -> Result<()> {
    // ---
    let app = spawn_app(true).await?;
    let body: Value = Client::new()
        .get(format!("{}/api/trends/Delhi", app.base))
        .send()
        .await?
        .json()
        .await?;

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 30);
    for pair in data.windows(2) {
        assert!(pair[0]["time"].as_str() <= pair[1]["time"].as_str());
    }
    Ok(())
}

// ---

#[derive(Debug, Deserialize)]
struct ForecastBody {
    forecast: Vec<ForecastDay>,
    source: String,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: String,
    aqi: i64,
    status: String,
}

#[tokio::test]
async fn predict_without_artifact_serves_flat_fallback() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;

    sqlx::query(
        "INSERT INTO city_daily (city, date, aqi, pm2_5) VALUES ('Delhi', '2024-01-01', 180, 95.0)",
    )
    .execute(&app.pool)
    .await?;

    let body: ForecastBody = Client::new()
        .get(format!("{}/api/predict/Delhi", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body.source, "fallback");
    assert_eq!(body.forecast.len(), 5);
    for day in &body.forecast {
        assert_eq!(day.aqi, 180);
        assert_eq!(day.status, "Moderate");
    }
    // Five consecutive calendar days.
    for pair in body.forecast.windows(2) {
        let a: chrono::NaiveDate = pair[0].date.parse()?;
        let b: chrono::NaiveDate = pair[1].date.parse()?;
        assert_eq!(b - a, chrono::Duration::days(1));
    }
    Ok(())
}

#[tokio::test]
async fn predict_unknown_city_uses_default_current() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;
    let body: ForecastBody = Client::new()
        .get(format!("{}/api/predict/Gotham", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body.source, "fallback");
    assert!(body.forecast.iter().all(|d| d.aqi == 100));
    assert!(body.forecast.iter().all(|d| d.status == "Satisfactory"));
    Ok(())
}

#[tokio::test]
async fn predict_with_artifact_runs_model_inference() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;

    sqlx::query(
        "INSERT INTO city_daily (city, date, aqi, pm2_5) VALUES ('Delhi', '2024-01-01', 200, 110.0)",
    )
    .execute(&app.pool)
    .await?;

    // Averages the two lags with a +10 offset, ignores the month.
    let artifact = json!({
        "columns": ["AQI_Lag1", "AQI_Lag2", "Month"],
        "coefficients": [0.5, 0.5, 0.0],
        "intercept": 10.0
    });
    std::fs::write(
        app.models_dir.join("aqi_model_Delhi.json"),
        serde_json::to_vec(&artifact)?,
    )?;

    let body: ForecastBody = Client::new()
        .get(format!("{}/api/predict/Delhi", app.base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body.source, "model");
    let aqis: Vec<i64> = body.forecast.iter().map(|d| d.aqi).collect();
    assert_eq!(aqis, vec![210, 215, 223, 229, 236]);
    Ok(())
}

// ---

#[tokio::test]
async fn hourly_analysis_matches_exact_city_only() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;

    for (city, hour, aqi) in [
        ("Delhi", "06", 80),
        ("Delhi", "12", 120),
        ("Delhi", "18", 150),
        // Must not bleed into Delhi's curve.
        ("New Delhi", "06", 500),
    ] {
        sqlx::query("INSERT INTO city_hourly (city, datetime, aqi) VALUES (?1, ?2, ?3)")
            .bind(city)
            .bind(format!("2024-05-01 {hour}:00:00"))
            .bind(aqi)
            .execute(&app.pool)
            .await?;
    }

    let body: Value = Client::new()
        .get(format!("{}/api/analysis/hourly/Delhi", app.base))
        .send()
        .await?
        .json()
        .await?;

    let curve = body["hourly_curve"].as_array().unwrap();
    assert_eq!(curve.len(), 3);
    assert_eq!(body["best_time"]["hour"], json!("06"));
    assert_eq!(body["best_time"]["avg_aqi"], json!(80));
    assert_eq!(body["worst_time"]["hour"], json!("18"));
    assert_eq!(body["worst_time"]["avg_aqi"], json!(150));
    Ok(())
}

#[tokio::test]
async fn hourly_analysis_defaults_when_city_has_no_history() -> Result<()> {
    // ---
    let app = spawn_app(false).await?;
    let body: Value = Client::new()
        .get(format!("{}/api/analysis/hourly/Nowhere", app.base))
        .send()
        .await?
        .json()
        .await?;

    let curve = body["hourly_curve"].as_array().unwrap();
    assert_eq!(curve.len(), 24);
    assert!(curve.iter().all(|p| p["avg_aqi"] == json!(100)));
    assert_eq!(curve[0]["hour"], json!("00"));
    assert_eq!(curve[23]["hour"], json!("23"));
    assert_eq!(body["best_time"], json!({"hour": "06", "avg_aqi": 80}));
    assert_eq!(body["worst_time"], json!({"hour": "18", "avg_aqi": 150}));
    Ok(())
}
