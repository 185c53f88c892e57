//! Loading of the externally trained artifacts.
//!
//! Four files make up a bundle: the classifier, the numeric scaler, the
//! gender encoder and the label encoder. They are read once, validated, and
//! then only ever read through an [`ArtifactStore`].

mod store;

pub use store::ArtifactStore;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::inference::{
    Classifier, LabelEncoder, LinearClassifier, OnnxClassifier, OnnxOptions, Pipeline, Scaler,
    DEFAULT_AGE_MONTHS, DEFAULT_HEIGHT_CM, DEFAULT_WEIGHT_KG,
};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved locations of the four artifact files.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
    pub gender_encoder: PathBuf,
    pub label_encoder: PathBuf,
}

impl ArtifactPaths {
    pub fn from_config(config: &Config) -> Self {
        let dir = &config.artifacts_dir;
        Self {
            classifier: dir.join(&config.classifier_file),
            scaler: dir.join(&config.scaler_file),
            gender_encoder: dir.join(&config.gender_encoder_file),
            label_encoder: dir.join(&config.label_encoder_file),
        }
    }
}

/// Everything needed to load a bundle: where the files are and how to build
/// ONNX sessions.
#[derive(Debug, Clone)]
pub struct ArtifactSource {
    pub paths: ArtifactPaths,
    pub onnx: OnnxOptions,
}

impl ArtifactSource {
    pub fn from_config(config: &Config) -> Self {
        Self {
            paths: ArtifactPaths::from_config(config),
            onnx: OnnxOptions {
                input_name: config.onnx_input_name.clone(),
                label_output: config.onnx_label_output.clone(),
                pool_size: config.effective_pool_size(),
                intra_threads: config.intra_threads,
            },
        }
    }
}

/// A loaded, immutable set of artifacts ready for inference.
pub struct ArtifactBundle {
    pipeline: Pipeline,
    fingerprint: String,
}

impl ArtifactBundle {
    /// Read and validate all four artifacts. Any failure aborts the whole load.
    pub fn load(source: &ArtifactSource) -> Result<Self> {
        let paths = &source.paths;
        let classifier_bytes = read_artifact(&paths.classifier)?;
        let scaler_bytes = read_artifact(&paths.scaler)?;
        let gender_bytes = read_artifact(&paths.gender_encoder)?;
        let label_bytes = read_artifact(&paths.label_encoder)?;

        let fingerprint = compute_fingerprint(&[
            classifier_bytes.as_slice(),
            scaler_bytes.as_slice(),
            gender_bytes.as_slice(),
            label_bytes.as_slice(),
        ]);

        let classifier = load_classifier(&paths.classifier, &classifier_bytes, &source.onnx)?;
        let scaler = Scaler::from_json_slice(&scaler_bytes).map_err(|e| context(&paths.scaler, e))?;
        let gender_encoder = LabelEncoder::from_json_slice(&gender_bytes)
            .map_err(|e| context(&paths.gender_encoder, e))?;
        let label_encoder = LabelEncoder::from_json_slice(&label_bytes)
            .map_err(|e| context(&paths.label_encoder, e))?;

        tracing::info!(
            classifier = classifier.kind(),
            genders = gender_encoder.classes().len(),
            labels = label_encoder.classes().len(),
            fingerprint = %fingerprint,
            "Artifacts loaded"
        );

        Ok(Self {
            pipeline: Pipeline::new(classifier, scaler, gender_encoder, label_encoder),
            fingerprint,
        })
    }

    /// Wrap an already-built pipeline, e.g. one assembled in memory.
    pub fn from_pipeline(pipeline: Pipeline, fingerprint: impl Into<String>) -> Self {
        Self {
            pipeline,
            fingerprint: fingerprint.into(),
        }
    }

    pub fn predict(&self, gender: &str, age: i64, height: f64, weight: f64) -> Result<String> {
        self.pipeline.predict(gender, age, height, weight)
    }

    /// Run one prediction per known gender so lazy runtime initialization
    /// happens before the first real request.
    pub fn warmup(&self) {
        for gender in self.pipeline.genders() {
            if let Err(e) = self.pipeline.predict(
                gender,
                DEFAULT_AGE_MONTHS,
                DEFAULT_HEIGHT_CM,
                DEFAULT_WEIGHT_KG,
            ) {
                tracing::warn!(gender = %gender, error = %e, "Warmup prediction failed");
            }
        }
    }

    /// Hex SHA-256 over the raw bytes of the four artifact files.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        AppError::ArtifactLoad(format!("Failed to read {}: {}", path.display(), e))
    })
}

fn context(path: &Path, err: AppError) -> AppError {
    AppError::ArtifactLoad(format!("{}: {}", path.display(), err))
}

fn load_classifier(
    path: &Path,
    bytes: &[u8],
    onnx: &OnnxOptions,
) -> Result<Box<dyn Classifier>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let classifier: Box<dyn Classifier> = match extension.as_deref() {
        Some("onnx") => {
            Box::new(OnnxClassifier::load_pool(bytes, onnx).map_err(|e| context(path, e))?)
        }
        Some("json") => {
            Box::new(LinearClassifier::from_json_slice(bytes).map_err(|e| context(path, e))?)
        }
        _ => {
            return Err(AppError::ArtifactLoad(format!(
                "Unsupported classifier format: {}",
                path.display()
            )))
        }
    };
    Ok(classifier)
}

fn compute_fingerprint(files: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for bytes in files {
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
