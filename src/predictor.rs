//! Prediction artifacts for the per-city AQI forecast.
//!
//! An artifact is a pre-trained regression serialized to JSON, one file
//! per city under the configured models directory. The forecast resolver
//! only sees the [`Predictor`] capability, so the on-disk format can
//! change (and tests can substitute stubs) without touching the resolver.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

// ---

/// Capability consumed by the forecast resolver.
///
/// `expected_columns` declares the exact input schema the artifact was
/// trained on, in order; `predict` runs inference over one reconciled
/// feature row.
pub trait Predictor {
    fn expected_columns(&self) -> &[String];
    fn predict(&self, row: &[f64]) -> Result<f64>;
}

/// Linear regression loaded from a JSON artifact.
///
/// The file declares the ordered feature columns, one coefficient per
/// column, and an intercept:
///
/// ```json
/// {
///   "columns": ["AQI_Lag1", "AQI_Lag2", "Month"],
///   "coefficients": [0.62, 0.31, 0.8],
///   "intercept": 14.2
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LinearArtifact {
    columns: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearArtifact {
    /// Load and validate an artifact file.
    ///
    /// The declaration is probed on load: a column/coefficient count
    /// mismatch is rejected here rather than surfacing as a garbage
    /// forecast later.
    pub fn load(path: &Path) -> Result<Self> {
        // ---
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read artifact at {}", path.display()))?;
        let artifact: LinearArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse artifact at {}", path.display()))?;

        if artifact.columns.len() != artifact.coefficients.len() {
            bail!(
                "artifact at {} declares {} columns but {} coefficients",
                path.display(),
                artifact.columns.len(),
                artifact.coefficients.len()
            );
        }

        Ok(artifact)
    }
}

impl Predictor for LinearArtifact {
    fn expected_columns(&self) -> &[String] {
        &self.columns
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        // ---
        if row.len() != self.coefficients.len() {
            bail!(
                "feature length mismatch: got {}, expected {}",
                row.len(),
                self.coefficients.len()
            );
        }

        let dot: f64 = row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, c)| x * c)
            .sum();
        Ok(self.intercept + dot)
    }
}

// ---

/// Locate the artifact file for a city, if one exists.
///
/// The key is the city name with spaces replaced by underscores; the
/// title-cased variant is probed second so `new delhi` still finds an
/// artifact saved as `aqi_model_New_Delhi.json`.
pub fn artifact_path(models_dir: &Path, city: &str) -> Option<PathBuf> {
    // ---
    let key = city.replace(' ', "_");

    for name in [
        format!("aqi_model_{key}.json"),
        format!("aqi_model_{}.json", title_case(&key)),
    ] {
        let path = models_dir.join(name);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Load the artifact for a city, swallowing load failures.
///
/// A missing file and an unreadable file both degrade to `None`: the
/// caller falls back to flat persistence either way, and the failure is
/// only worth a log line.
pub fn load_for_city(models_dir: &Path, city: &str) -> Option<LinearArtifact> {
    // ---
    let path = artifact_path(models_dir, city)?;

    match LinearArtifact::load(&path) {
        Ok(artifact) => {
            tracing::debug!("Loaded prediction artifact {}", path.display());
            Some(artifact)
        }
        Err(e) => {
            tracing::warn!("Ignoring unusable artifact {}: {:#}", path.display(), e);
            None
        }
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the
/// rest: `new_delhi` becomes `New_Delhi`.
fn title_case(s: &str) -> String {
    // ---
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}
