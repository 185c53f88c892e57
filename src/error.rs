use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to clients when the artifacts cannot be loaded.
/// The underlying cause only goes to the server log.
pub const LOAD_FAILURE_MESSAGE: &str = "Model gagal dimuat di server. Cek logs.";

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Failed to load artifacts: {0}")]
    ArtifactLoad(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Service temporarily unavailable: {0}")]
    Resource(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ArtifactLoad(e) => {
                tracing::error!(error = %e, "Artifact load error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    LOAD_FAILURE_MESSAGE.to_string(),
                )
            }
            AppError::UnknownCategory(_) | AppError::Prediction(_) => {
                tracing::warn!(error = %self, "Prediction error");
                (
                    StatusCode::BAD_REQUEST,
                    format!("Terjadi error saat prediksi: {}", self),
                )
            }
            AppError::Resource(msg) => {
                tracing::warn!(error = %msg, "Resource error");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
