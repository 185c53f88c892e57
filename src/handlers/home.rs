use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HomeResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub author: &'static str,
    pub usage_guide: UsageGuide,
}

#[derive(Serialize)]
pub struct UsageGuide {
    pub endpoint: &'static str,
    pub method: &'static str,
    pub body_format: &'static str,
    pub variable_translation: VariableTranslation,
}

#[derive(Serialize)]
pub struct VariableTranslation {
    pub jenis_kelamin: &'static str,
    pub umur: &'static str,
    pub tinggi: &'static str,
    pub berat: &'static str,
}

/// GET / - Service status and usage guide. Never touches the artifacts.
pub async fn home_handler() -> Json<HomeResponse> {
    Json(HomeResponse {
        status: "online",
        message: "Stuntify AI API is ready to use",
        version: env!("CARGO_PKG_VERSION"),
        author: "Silvio Christian, Joe",
        usage_guide: UsageGuide {
            endpoint: "/predict-stunting",
            method: "POST",
            body_format: "JSON",
            variable_translation: VariableTranslation {
                jenis_kelamin: "Gender (Value: 'Laki-laki' for Male, 'Perempuan' for Female)",
                umur: "Age (Numeric, typically in months)",
                tinggi: "Height (Numeric, in cm)",
                berat: "Weight (Numeric, in kg)",
            },
        },
    })
}
