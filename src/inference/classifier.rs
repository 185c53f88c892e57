use crate::error::{AppError, Result};
use ndarray::{Array1, Array2};
use serde::Deserialize;

/// Width of the classifier input row.
pub const FEATURE_COUNT: usize = 4;

/// One classifier input row, ordered `[gender_code, age, height, weight]`
/// with the numeric entries already scaled.
///
/// The classifier was trained on exactly this column order, so the only way
/// to build a row is through [`FeatureVector::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(gender_code: f64, scaled: [f64; 3]) -> Self {
        let [age, height, weight] = scaled;
        Self([gender_code, age, height, weight])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.0.to_vec())
    }

    /// Single-precision copy for runtimes that take `float` tensors.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.0.iter().map(|&v| v as f32).collect()
    }
}

/// A trained model mapping one feature row to one numeric class code.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Short name used in logs.
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct LinearClassifierFile {
    coefficients: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    classes: Vec<i64>,
}

/// Linear decision function `W·x + b` followed by argmax.
///
/// Binary models carry a single coefficient row and two classes; a positive
/// score selects the second class.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    coefficients: Array2<f64>,
    intercept: Array1<f64>,
    classes: Vec<i64>,
}

impl LinearClassifier {
    pub fn new(coefficients: Vec<Vec<f64>>, intercept: Vec<f64>, classes: Vec<i64>) -> Result<Self> {
        let rows = coefficients.len();
        if rows == 0 {
            return Err(AppError::ArtifactLoad(
                "Linear classifier has no coefficient rows".to_string(),
            ));
        }
        if let Some(row) = coefficients.iter().find(|r| r.len() != FEATURE_COUNT) {
            return Err(AppError::ArtifactLoad(format!(
                "Linear classifier expects {} coefficients per row, found {}",
                FEATURE_COUNT,
                row.len()
            )));
        }
        if intercept.len() != rows {
            return Err(AppError::ArtifactLoad(format!(
                "Linear classifier has {} coefficient rows but {} intercepts",
                rows,
                intercept.len()
            )));
        }
        let binary = rows == 1 && classes.len() == 2;
        if !binary && classes.len() != rows {
            return Err(AppError::ArtifactLoad(format!(
                "Linear classifier has {} coefficient rows but {} classes",
                rows,
                classes.len()
            )));
        }

        let flat: Vec<f64> = coefficients.into_iter().flatten().collect();
        let coefficients = Array2::from_shape_vec((rows, FEATURE_COUNT), flat)
            .map_err(|e| AppError::ArtifactLoad(format!("Failed to shape coefficients: {}", e)))?;

        Ok(Self {
            coefficients,
            intercept: Array1::from(intercept),
            classes,
        })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let file: LinearClassifierFile = serde_json::from_slice(bytes)
            .map_err(|e| AppError::ArtifactLoad(format!("Malformed linear classifier: {}", e)))?;
        Self::new(file.coefficients, file.intercept, file.classes)
    }

    /// Raw decision scores, one per coefficient row.
    pub fn decision_function(&self, features: &FeatureVector) -> Array1<f64> {
        self.coefficients.dot(&features.to_array()) + &self.intercept
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let scores = self.decision_function(features);
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(AppError::Prediction(
                "Decision function produced a non-finite score".to_string(),
            ));
        }

        let idx = if self.coefficients.nrows() == 1 && self.classes.len() == 2 {
            usize::from(scores[0] > 0.0)
        } else {
            // First maximum wins on ties.
            let mut best = 0;
            for (i, &score) in scores.iter().enumerate() {
                if score > scores[best] {
                    best = i;
                }
            }
            best
        };

        Ok(self.classes[idx])
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
