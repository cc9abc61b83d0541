//! Data models for the AQI dashboard API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aqi::Severity;

// ---

/// Telemetry report from the ESP32 device.
///
/// Doubles as the ingestion payload of `POST /api/sensor/data` and the
/// in-memory latest-reading slot. `Default` gives the all-zero report the
/// dashboard shows before the device has phoned home.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReport {
    // ---
    pub temperature: f64,
    pub humidity: f64,
    pub mq135_raw: i64,
    pub co2_ppm: f64,
    pub aqi: i64,
}

/// One `{time, aqi}` sample of a trend or history series.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TrendPoint {
    // ---
    pub time: String,
    pub aqi: i64,
}

/// Heatmap row as read from the database; the latest AQI is NULL for
/// cities that have metadata but no readings yet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HeatmapRow {
    // ---
    pub city_name: String,
    pub lat: f64,
    pub lng: f64,
    pub avg_aqi: Option<i64>,
}

/// Heatmap cell served to the map view; missing AQI defaults to 0.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    // ---
    pub city_name: String,
    pub lat: f64,
    pub lng: f64,
    pub avg_aqi: i64,
}

impl From<HeatmapRow> for HeatmapCell {
    fn from(row: HeatmapRow) -> Self {
        // ---
        HeatmapCell {
            city_name: row.city_name,
            lat: row.lat,
            lng: row.lng,
            avg_aqi: row.avg_aqi.unwrap_or(0),
        }
    }
}

/// Per-city AQI entry of the cleanest/most-polluted stats lists.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CityStat {
    // ---
    pub city: String,
    pub avg_aqi: i64,
}

/// Per-hour average AQI of the hourly analysis curve.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct HourlyPoint {
    // ---
    pub hour: String,
    pub avg_aqi: i64,
}

/// One day of the 5-day AQI forecast. Produced per request, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    // ---
    pub date: NaiveDate,
    pub aqi: i64,
    pub status: Severity,
}

/// Live snapshot from the AQI provider, served by `GET /api/live/{city}`.
///
/// Field names mirror the dashboard's JSON contract. The overall index is
/// kept as the raw JSON value the provider sent: it is usually a number
/// but can be the `"-"` sentinel when the station has no current index.
#[derive(Debug, Clone, Serialize)]
pub struct LiveReading {
    // ---
    #[serde(rename = "PM2.5")]
    pub pm25: f64,
    #[serde(rename = "PM10")]
    pub pm10: f64,
    #[serde(rename = "NO2")]
    pub no2: f64,
    #[serde(rename = "CO")]
    pub co: f64,
    #[serde(rename = "SO2")]
    pub so2: f64,
    #[serde(rename = "O3")]
    pub o3: f64,
    #[serde(rename = "AQI")]
    pub aqi: Value,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    pub source: String,
}

impl LiveReading {
    /// The overall index as a number, if the provider sent one.
    ///
    /// Returns `None` for the `"-"` sentinel, a missing field, or any
    /// other non-numeric payload, which callers treat as "live source
    /// unavailable".
    pub fn aqi_value(&self) -> Option<f64> {
        // ---
        self.aqi.as_f64()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_live_reading_serializes_dashboard_keys() {
        // ---
        let reading = LiveReading {
            pm25: 95.5,
            pm10: 120.0,
            no2: 30.0,
            co: 4.0,
            so2: 8.0,
            o3: 21.0,
            aqi: json!(180),
            temperature: 31.0,
            humidity: 64.0,
            source: "WAQI API".to_string(),
        };

        let v = serde_json::to_value(&reading).unwrap();
        assert_eq!(v["PM2.5"], json!(95.5));
        assert_eq!(v["AQI"], json!(180));
        assert_eq!(v["Temperature"], json!(31.0));
        assert_eq!(v["source"], json!("WAQI API"));
    }

    #[test]
    fn test_aqi_value_rejects_sentinel() {
        // ---
        let mut reading = LiveReading {
            pm25: 0.0,
            pm10: 0.0,
            no2: 0.0,
            co: 0.0,
            so2: 0.0,
            o3: 0.0,
            aqi: json!("-"),
            temperature: 30.0,
            humidity: 70.0,
            source: "WAQI API".to_string(),
        };
        assert_eq!(reading.aqi_value(), None);

        reading.aqi = json!(142);
        assert_eq!(reading.aqi_value(), Some(142.0));
    }

    #[test]
    fn test_forecast_point_serializes_iso_date() {
        // ---
        let point = ForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            aqi: 180,
            status: Severity::Moderate,
        };
        let v = serde_json::to_value(&point).unwrap();
        assert_eq!(v["date"], json!("2024-01-02"));
        assert_eq!(v["status"], json!("Moderate"));
    }

    #[test]
    fn test_sensor_report_roundtrip() {
        // ---
        let body = json!({
            "temperature": 25.5,
            "humidity": 60.0,
            "mq135_raw": 512,
            "co2_ppm": 450.2,
            "aqi": 85
        });
        let report: SensorReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.mq135_raw, 512);
        assert_eq!(report.aqi, 85);

        let defaulted = SensorReport::default();
        assert_eq!(defaulted.temperature, 0.0);
        assert_eq!(defaulted.aqi, 0);
    }
}
