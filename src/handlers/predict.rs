use crate::error::{AppError, Result};
use crate::inference::{DEFAULT_AGE_MONTHS, DEFAULT_GENDER, DEFAULT_HEIGHT_CM, DEFAULT_WEIGHT_KG};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

fn default_gender() -> Option<String> {
    Some(DEFAULT_GENDER.to_string())
}

fn default_age() -> i64 {
    DEFAULT_AGE_MONTHS
}

fn default_height() -> f64 {
    DEFAULT_HEIGHT_CM
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT_KG
}

/// JSON shapes accepted for numeric fields: numbers or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LaxNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Integer field accepting `19`, `19.0` and `"19"`.
fn lax_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    let whole = |v: f64| {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(de::Error::custom(format!("expected a whole number, got {}", v)))
        }
    };

    match LaxNumber::deserialize(deserializer)? {
        LaxNumber::Int(v) => Ok(v),
        LaxNumber::Float(v) => whole(v),
        LaxNumber::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => s
                    .parse::<f64>()
                    .map_err(|_| de::Error::custom(format!("expected an integer, got '{}'", s)))
                    .and_then(whole),
            }
        }
    }
}

/// Float field accepting numbers and numeric strings.
fn lax_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = match LaxNumber::deserialize(deserializer)? {
        LaxNumber::Int(v) => v as f64,
        LaxNumber::Float(v) => v,
        LaxNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got '{}'", s)))?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom("expected a finite number"))
    }
}

/// Subject measurements. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    /// Gender. A missing field takes the default; an explicit `null` is
    /// kept and rejected as an unknown category.
    #[serde(default = "default_gender")]
    pub jenis_kelamin: Option<String>,
    /// Age in months.
    #[serde(default = "default_age", deserialize_with = "lax_i64")]
    pub umur: i64,
    /// Height in cm.
    #[serde(default = "default_height", deserialize_with = "lax_f64")]
    pub tinggi: f64,
    /// Weight in kg.
    #[serde(default = "default_weight", deserialize_with = "lax_f64")]
    pub berat: f64,
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self {
            jenis_kelamin: default_gender(),
            umur: default_age(),
            tinggi: default_height(),
            berat: default_weight(),
        }
    }
}

impl PredictionRequest {
    pub fn gender(&self) -> Result<&str> {
        self.jenis_kelamin.as_deref().ok_or_else(|| {
            AppError::UnknownCategory("jenis_kelamin is null, which is not a known gender".into())
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: String,
}

/// POST /predict-stunting - Classify a subject's nutritional status.
///
/// # Flow
/// 1. Make sure the artifact bundle is loaded (500 if it cannot be)
/// 2. Acquire a semaphore permit (waits while all sessions are busy)
/// 3. Run the pipeline on the blocking pool (400 on any failure)
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>> {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let bundle = state.artifacts.ensure_loaded().await?;

    let _permit = state
        .semaphore
        .acquire()
        .await
        .map_err(|_| AppError::Resource("Semaphore closed".to_string()))?;

    let input = request.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        bundle.predict(input.gender()?, input.umur, input.tinggi, input.berat)
    })
    .await
    .map_err(|e| AppError::Prediction(format!("Task join error: {}", e)))
    .and_then(|r| r);

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("prediction_latency_ms").record(elapsed_ms);

    match outcome {
        Ok(prediction) => {
            metrics::counter!("predictions_total", "outcome" => "success").increment(1);
            tracing::info!(
                %request_id,
                gender = ?request.jenis_kelamin,
                umur = request.umur,
                tinggi = request.tinggi,
                berat = request.berat,
                prediction = %prediction,
                elapsed_ms,
                "Prediction completed"
            );
            Ok(Json(PredictionResponse { prediction }))
        }
        Err(e) => {
            metrics::counter!("predictions_total", "outcome" => "error").increment(1);
            tracing::debug!(%request_id, error = %e, "Prediction failed");
            Err(e)
        }
    }
}
