//! Configuration loader for the `ecowatch-aqi` backend service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional u64 environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// SQLite connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Base URL of the live-AQI provider (WAQI feed API).
    pub waqi_base_url: String,

    /// API token for the live-AQI provider.
    pub waqi_token: String,

    /// Timeout for provider calls, in seconds. A call that exceeds it is
    /// treated as failed and the fallback chain proceeds.
    pub waqi_timeout_secs: u64,

    /// Directory holding per-city prediction artifacts.
    pub models_dir: PathBuf,

    /// City whose live AQI overrides the hybrid sensor payload.
    pub sensor_city: String,

    /// Seed synthetic demo data on first run so the service is
    /// immediately demoable.
    pub demo_seed: bool,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `WAQI_TOKEN` – live-AQI provider API token
///
/// Optional:
/// - `DATABASE_URL` – SQLite connection string (default: `sqlite://aqi_data.db`)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `WAQI_BASE_URL` – provider base URL (default: `https://api.waqi.info`)
/// - `WAQI_TIMEOUT_SECS` – provider call timeout (default: 5)
/// - `MODELS_DIR` – prediction artifact directory (default: `saved_models`)
/// - `SENSOR_CITY` – live override city for `/api/sensor/latest` (default: `Kolkata`)
/// - `DEMO_SEED` – seed synthetic data when tables are empty (default: true)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let waqi_token = require_env!("WAQI_TOKEN");
    let db_url = env_or!("DATABASE_URL", "sqlite://aqi_data.db");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let waqi_base_url = env_or!("WAQI_BASE_URL", "https://api.waqi.info");
    let waqi_timeout_secs = parse_env_u64!("WAQI_TIMEOUT_SECS", 5);
    let models_dir = PathBuf::from(env_or!("MODELS_DIR", "saved_models"));
    let sensor_city = env_or!("SENSOR_CITY", "Kolkata");
    let demo_seed = !matches!(
        env::var("DEMO_SEED").ok().as_deref(),
        Some("0") | Some("false") | Some("no")
    );

    Ok(Config {
        db_url,
        db_pool_max,
        waqi_base_url,
        waqi_token,
        waqi_timeout_secs,
        models_dir,
        sensor_city,
        demo_seed,
    })
}

/// Mask a secret for logging, keeping a short identifying prefix.
///
/// Tokens too short to truncate, and tokens whose fourth byte falls
/// inside a multi-byte character, are masked entirely.
fn mask_token(token: &str) -> String {
    // ---
    match token.get(..4) {
        Some(prefix) if token.len() > 4 => format!("{}****", prefix),
        _ => "****".to_string(),
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the provider token while showing all configuration values
    /// that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_token = mask_token(&self.waqi_token);

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL      : {}", self.db_url);
        tracing::info!("  DB_POOL_MAX       : {}", self.db_pool_max);
        tracing::info!("  WAQI_BASE_URL     : {}", self.waqi_base_url);
        tracing::info!("  WAQI_TOKEN        : {}", masked_token);
        tracing::info!("  WAQI_TIMEOUT_SECS : {}", self.waqi_timeout_secs);
        tracing::info!("  MODELS_DIR        : {}", self.models_dir.display());
        tracing::info!("  SENSOR_CITY       : {}", self.sensor_city);
        tracing::info!("  DEMO_SEED         : {}", self.demo_seed);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_token_mask_keeps_short_prefix() {
        // ---
        assert_eq!(mask_token("abcdef123456"), "abcd****");
    }

    #[test]
    fn test_token_mask_hides_short_tokens() {
        // ---
        assert_eq!(mask_token("abcd"), "****");
        assert_eq!(mask_token(""), "****");
    }

    #[test]
    fn test_token_mask_survives_multibyte_boundary() {
        // ---
        // Byte index 4 falls inside the euro sign.
        assert_eq!(mask_token("ab€cdef"), "****");
    }
}
