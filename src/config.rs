use std::env;
use std::path::{Path, PathBuf};

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding the four trained artifacts. Defaults to the
    /// directory of the running executable.
    pub artifacts_dir: PathBuf,
    /// Classifier file name. `.onnx` loads an ONNX graph, `.json` a linear model.
    pub classifier_file: String,
    pub scaler_file: String,
    pub gender_encoder_file: String,
    pub label_encoder_file: String,
    /// Name of the ONNX graph input fed with the `[1, 4]` feature tensor.
    pub onnx_input_name: String,
    /// Name of the ONNX graph output holding the int64 class code.
    pub onnx_label_output: String,
    /// Optional override for session pool size. If None, uses available parallelism.
    pub pool_size: Option<usize>,
    /// Number of threads per ONNX session for intra-op parallelism.
    pub intra_threads: usize,
    /// Attempt to load the artifacts before the listener starts.
    pub eager_load: bool,
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let install_dir = install_dir()?;
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            artifacts_dir: resolve_artifacts_dir(
                env::var("ARTIFACTS_DIR").ok().as_deref(),
                &install_dir,
            ),
            classifier_file: env::var("CLASSIFIER_FILE")
                .unwrap_or_else(|_| "best_model.onnx".to_string()),
            scaler_file: env::var("SCALER_FILE").unwrap_or_else(|_| "scaler.json".to_string()),
            gender_encoder_file: env::var("GENDER_ENCODER_FILE")
                .unwrap_or_else(|_| "Jenis Kelamin_encoder.json".to_string()),
            label_encoder_file: env::var("LABEL_ENCODER_FILE")
                .unwrap_or_else(|_| "Stunting_encoder.json".to_string()),
            onnx_input_name: env::var("ONNX_INPUT_NAME")
                .unwrap_or_else(|_| "float_input".to_string()),
            onnx_label_output: env::var("ONNX_LABEL_OUTPUT")
                .unwrap_or_else(|_| "label".to_string()),
            pool_size: env::var("POOL_SIZE").ok().and_then(|s| s.parse().ok()),
            intra_threads: env::var("INTRA_THREADS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()?,
            eager_load: parse_bool(&env::var("EAGER_LOAD").unwrap_or_else(|_| "true".into()))?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
        })
    }

    /// Configuration pointing at `artifacts_dir` with every other field at its default.
    pub fn with_artifacts_dir(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            artifacts_dir: artifacts_dir.into(),
            classifier_file: "best_model.onnx".to_string(),
            scaler_file: "scaler.json".to_string(),
            gender_encoder_file: "Jenis Kelamin_encoder.json".to_string(),
            label_encoder_file: "Stunting_encoder.json".to_string(),
            onnx_input_name: "float_input".to_string(),
            onnx_label_output: "label".to_string(),
            pool_size: None,
            intra_threads: 1,
            eager_load: true,
            shutdown_timeout_secs: 5,
        }
    }

    /// Number of classifier sessions (and request permits) to create.
    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

/// Directory containing the running executable.
fn install_dir() -> anyhow::Result<PathBuf> {
    let exe = env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("executable path has no parent: {}", exe.display()))
}

/// Absolute overrides are kept, relative ones are joined onto `base`, and
/// an unset or empty value means `base` itself.
fn resolve_artifacts_dir(raw: Option<&str>, base: &Path) -> PathBuf {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
        Some(dir) => base.join(dir),
        None => base.to_path_buf(),
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("invalid boolean value: {other}")),
    }
}
