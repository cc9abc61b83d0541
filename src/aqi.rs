//! AQI severity classification.
//!
//! Maps a numeric air-quality index to one of six ordered severity labels
//! following the Indian CPCB bucket boundaries. The classifier is total:
//! input that cannot be read as a finite number degrades to
//! [`Severity::Unknown`] instead of failing, so callers never have to
//! guard it.

use serde::Serialize;
use serde_json::Value;

// ---

/// Ordered severity label for an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
    Unknown,
}

impl Severity {
    /// Classify a numeric AQI value.
    ///
    /// Thresholds are right-inclusive: 50 is still `Good`, 400 is still
    /// `Very Poor`. Non-finite input yields `Unknown`.
    pub fn classify(value: f64) -> Severity {
        // ---
        if !value.is_finite() {
            return Severity::Unknown;
        }
        if value <= 50.0 {
            Severity::Good
        } else if value <= 100.0 {
            Severity::Satisfactory
        } else if value <= 200.0 {
            Severity::Moderate
        } else if value <= 300.0 {
            Severity::Poor
        } else if value <= 400.0 {
            Severity::VeryPoor
        } else {
            Severity::Severe
        }
    }

    /// Classify a JSON value that may or may not be convertible to a
    /// number. Numbers are used as-is, strings are parsed, everything
    /// else (null, arrays, objects, booleans) is `Unknown`.
    pub fn classify_value(value: &Value) -> Severity {
        // ---
        match value {
            Value::Number(n) => n.as_f64().map_or(Severity::Unknown, Self::classify),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_or(Severity::Unknown, Self::classify),
            _ => Severity::Unknown,
        }
    }

    /// Human-readable label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        // ---
        match self {
            Severity::Good => "Good",
            Severity::Satisfactory => "Satisfactory",
            Severity::Moderate => "Moderate",
            Severity::Poor => "Poor",
            Severity::VeryPoor => "Very Poor",
            Severity::Severe => "Severe",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
