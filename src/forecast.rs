//! Five-day AQI forecast resolver.
//!
//! The resolver never fails outright. The current AQI is resolved through
//! an ordered fallback chain (live provider, then the latest persisted
//! daily reading, then a fixed default), and the forecast itself degrades
//! from model inference to a flat projection of that current value when
//! no artifact exists or inference breaks. Each stage hands the next a
//! tagged value instead of recovering exceptions, so the degradation
//! policy is plain data flow.

use anyhow::{bail, Result};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::aqi::Severity;
use crate::models::ForecastPoint;
use crate::predictor::Predictor;
use crate::waqi;
use crate::Config;

// ---

/// Number of days in a forecast.
pub const FORECAST_HORIZON: usize = 5;

/// AQI assumed when neither the provider nor the database knows the city.
pub const DEFAULT_AQI: f64 = 100.0;

/// How the current AQI value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiOrigin {
    Live,
    Persisted,
    Default,
}

/// A resolved current AQI, tagged with its origin.
#[derive(Debug, Clone, Copy)]
pub struct CurrentAqi {
    pub value: f64,
    pub origin: AqiOrigin,
}

/// Whether the forecast came out of the model or the flat fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    Model,
    Fallback,
}

/// Forecast response: always exactly [`FORECAST_HORIZON`] points.
#[derive(Debug, Serialize)]
pub struct Forecast {
    #[serde(rename = "forecast")]
    pub points: Vec<ForecastPoint>,
    pub source: ForecastSource,
}

// ---

/// Resolve the AQI input value for forecasting.
///
/// Ordered fallback chain, first success wins: live provider reading
/// (only if it carries a numeric index), most recent persisted daily
/// reading, fixed [`DEFAULT_AQI`]. Database errors count as "no persisted
/// reading" so the chain always terminates with a usable value.
pub async fn resolve_current(
    http: &reqwest::Client,
    config: &Config,
    pool: &SqlitePool,
    city: &str,
) -> CurrentAqi {
    // ---
    if let Some(reading) = waqi::fetch_live(http, config, city).await {
        if let Some(value) = reading.aqi_value() {
            return CurrentAqi {
                value,
                origin: AqiOrigin::Live,
            };
        }
        tracing::debug!("Live reading for {} has no usable index", city);
    }

    match latest_daily_aqi(pool, city).await {
        Ok(Some(aqi)) => {
            return CurrentAqi {
                value: aqi as f64,
                origin: AqiOrigin::Persisted,
            }
        }
        Ok(None) => tracing::debug!("No persisted daily readings for {}", city),
        Err(e) => tracing::warn!("Daily lookup failed for {}: {}", city, e),
    }

    CurrentAqi {
        value: DEFAULT_AQI,
        origin: AqiOrigin::Default,
    }
}

/// Most recent persisted daily AQI for a city.
pub async fn latest_daily_aqi(pool: &SqlitePool, city: &str) -> Result<Option<i64>, sqlx::Error> {
    // ---
    sqlx::query_scalar("SELECT aqi FROM city_daily WHERE city = ?1 ORDER BY date DESC LIMIT 1")
        .bind(city)
        .fetch_optional(pool)
        .await
}

// ---

/// Produce the 5-day forecast for an already-resolved current value.
///
/// With a predictor, runs iterative inference; any inference error
/// abandons the model path wholesale and the flat fallback restarts from
/// the original current value, so callers never see a partial or
/// mixed-source forecast.
pub fn run_forecast(
    current: f64,
    today: NaiveDate,
    predictor: Option<&dyn Predictor>,
) -> Forecast {
    // ---
    if let Some(model) = predictor {
        match model_forecast(current, today, model) {
            Ok(points) => {
                return Forecast {
                    points,
                    source: ForecastSource::Model,
                }
            }
            Err(e) => tracing::warn!("Inference failed, using flat fallback: {:#}", e),
        }
    }

    Forecast {
        points: flat_forecast(current, today),
        source: ForecastSource::Fallback,
    }
}

/// Rolling feature state fed back into the model between forecast days.
struct LagState {
    lag1: f64,
    lag2: f64,
    month: f64,
}

impl LagState {
    /// Reconcile the state against the columns the artifact declares:
    /// known columns take their current value, anything else is filled
    /// with zero, extras in the state are simply not emitted. Order
    /// matches the declaration.
    fn reconciled(&self, columns: &[String]) -> Vec<f64> {
        // ---
        columns
            .iter()
            .map(|col| match col.as_str() {
                "AQI_Lag1" => self.lag1,
                "AQI_Lag2" => self.lag2,
                "Month" => self.month,
                _ => 0.0,
            })
            .collect()
    }

    fn advance(&mut self, prediction: f64) {
        self.lag2 = self.lag1;
        self.lag1 = prediction;
    }
}

fn model_forecast(
    current: f64,
    today: NaiveDate,
    model: &dyn Predictor,
) -> Result<Vec<ForecastPoint>> {
    // ---
    let mut state = LagState {
        lag1: current,
        lag2: current,
        month: f64::from(today.month()),
    };
    let mut points = Vec::with_capacity(FORECAST_HORIZON);

    for day in 1..=FORECAST_HORIZON {
        let row = state.reconciled(model.expected_columns());
        let prediction = model.predict(&row)?;
        if !prediction.is_finite() {
            bail!("model produced a non-finite prediction on day {}", day);
        }

        points.push(ForecastPoint {
            date: today + Days::new(day as u64),
            aqi: prediction.round() as i64,
            status: Severity::classify(prediction),
        });
        state.advance(prediction);
    }

    Ok(points)
}

fn flat_forecast(current: f64, today: NaiveDate) -> Vec<ForecastPoint> {
    // ---
    let value = if current.is_finite() {
        current
    } else {
        DEFAULT_AQI
    };

    (1..=FORECAST_HORIZON)
        .map(|day| ForecastPoint {
            date: today + Days::new(day as u64),
            aqi: value.round() as i64,
            status: Severity::classify(value),
        })
        .collect()
}
