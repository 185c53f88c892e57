use crate::error::{AppError, Result};
use serde::Deserialize;

/// Number of numeric features the scaler was fit on: age, height, weight.
pub const NUMERIC_FEATURES: usize = 3;

/// Linear per-feature transform fit during training.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard {
        mean: [f64; NUMERIC_FEATURES],
        scale: [f64; NUMERIC_FEATURES],
    },
    /// `x * scale + min`
    MinMax {
        min: [f64; NUMERIC_FEATURES],
        scale: [f64; NUMERIC_FEATURES],
    },
}

impl Scaler {
    /// Parse and validate a scaler artifact.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let scaler: Scaler = serde_json::from_slice(bytes)
            .map_err(|e| AppError::ArtifactLoad(format!("Malformed scaler: {}", e)))?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        let (offset, scale) = match self {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min, scale } => (min, scale),
        };

        if offset.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::ArtifactLoad(
                "Scaler parameters must be finite".to_string(),
            ));
        }
        if matches!(self, Scaler::Standard { .. }) && scale.iter().any(|&s| s == 0.0) {
            return Err(AppError::ArtifactLoad(
                "Standard scaler has a zero scale".to_string(),
            ));
        }
        Ok(())
    }

    /// Scale `[age, height, weight]`, preserving order.
    pub fn transform(&self, raw: [f64; NUMERIC_FEATURES]) -> [f64; NUMERIC_FEATURES] {
        let mut out = [0.0; NUMERIC_FEATURES];
        match self {
            Scaler::Standard { mean, scale } => {
                for i in 0..NUMERIC_FEATURES {
                    out[i] = (raw[i] - mean[i]) / scale[i];
                }
            }
            Scaler::MinMax { min, scale } => {
                for i in 0..NUMERIC_FEATURES {
                    out[i] = raw[i] * scale[i] + min[i];
                }
            }
        }
        out
    }
}
