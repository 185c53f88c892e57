//! Stuntify - stunting classification microservice
//!
//! This library exposes the artifact loader, the inference pipeline and the
//! HTTP handlers, enabling integration tests and embedding in other
//! applications.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use artifacts::{ArtifactBundle, ArtifactPaths, ArtifactSource, ArtifactStore};
pub use config::{Config, LogFormat};
pub use error::{AppError, Result};
pub use handlers::{health_handler, home_handler, predict_handler, ready_handler};
pub use inference::{Classifier, FeatureVector, LabelEncoder, LinearClassifier, Pipeline, Scaler};
pub use router::build_router;
pub use state::AppState;
